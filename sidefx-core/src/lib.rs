//! SideFx Core
//!
//! This crate aggregates a derived value from the props of every mounted
//! instance of a wrapped component and forwards it to a handler whenever the
//! mounted set or any instance's props change.
//!
//! It implements:
//!
//! - A validated factory holding the three aggregation functions
//! - A per-wrapper registry of mounted instances and the last computed state
//! - Lifecycle-driven recomputation (mount, update, unmount)
//! - The client/server state handoff (`peek` / `rewind`)
//!
//! The rendering framework itself is not part of this crate. Hosts plug in
//! through the [`Component`] and [`Lifecycle`] traits and choose a
//! [`Target`] once per wrapper.
//!
//! # Architecture
//!
//! - `side_effect`: factory, wrapper component and wrapper instances
//! - `registry`: mounted-instance registry and current state
//! - `instance`: instance identity and live props
//! - `lifecycle`: the host-facing mount/update/unmount interface
//! - `component`: the host component model and display names
//! - `target`: interactive vs non-interactive execution targets
//! - `error`: configuration and usage errors
//!
//! # Example
//!
//! ```rust
//! use sidefx_core::{with_side_effect, Component, Lifecycle, Target};
//!
//! struct Title;
//!
//! impl Component for Title {
//!     type Props = String;
//!     type Output = ();
//!
//!     fn render(_props: &String) {}
//! }
//!
//! let factory = with_side_effect()
//!     .reduce_props(|titles: &[String]| titles.last().cloned().unwrap_or_default())
//!     .on_client_change(|title: &String| println!("document.title = {title}"))
//!     .build()?;
//!
//! let wrapper = factory.wrap_with_target::<Title>(Target::NonInteractive);
//! let page = wrapper.instantiate("Home".to_string());
//! page.will_mount();
//!
//! assert_eq!(wrapper.peek().as_deref(), Some("Home"));
//! assert_eq!(wrapper.rewind()?.as_deref(), Some("Home"));
//! assert_eq!(wrapper.peek(), None);
//! # Ok::<(), sidefx_core::Error>(())
//! ```

pub mod component;
pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod registry;
pub mod side_effect;
pub mod target;

pub use component::{display_name_of, Component};
pub use error::{ConfigurationError, Error, Result, UsageError};
pub use instance::{InstanceHandle, InstanceId};
pub use lifecycle::Lifecycle;
pub use registry::Registry;
pub use side_effect::{
    with_side_effect, SideEffect, SideEffectBuilder, SideEffectComponent, SideEffectInstance,
};
pub use target::Target;
