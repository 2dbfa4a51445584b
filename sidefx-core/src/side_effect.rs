//! Side Effect Wrappers
//!
//! A [`SideEffect`] holds three functions:
//!
//! - `reduce_props`: folds the props of every mounted instance into one state
//! - `on_client_change`: applies that state on an interactive target
//! - `map_state_on_server` (optional): reshapes the state for a
//!   non-interactive target before it is exposed
//!
//! Wrapping a component produces a [`SideEffectComponent`] with its own
//! registry. Every [`SideEffectInstance`] created from that wrapper shares the
//! registry, so the state always reflects the whole mounted set.
//!
//! # Recomputation
//!
//! Mount, update and unmount each trigger one full recomputation before the
//! hook returns:
//!
//! 1. Snapshot the props of every mounted instance, in mount order.
//! 2. Run `reduce_props` over the snapshot.
//! 3. Interactive target: store the state, then call `on_client_change`.
//! 4. Non-interactive target: store `map_state_on_server(state)`, or the
//!    state itself when no mapping was given.
//!
//! The registry lock is released before any of the three functions runs, so
//! they may call `peek()` on the wrapper they belong to.
//!
//! # Server Render Passes
//!
//! On a non-interactive target nothing consumes the state automatically.
//! Call [`SideEffectComponent::rewind`] after each render pass; it returns the
//! state and empties the registry for the next pass.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use super::component::{display_name_of, Component};
use super::error::{ConfigurationError, UsageError};
use super::instance::{InstanceHandle, InstanceId};
use super::lifecycle::Lifecycle;
use super::registry::Registry;
use super::target::Target;

type ReduceFn<P, S> = dyn Fn(&[P]) -> S + Send + Sync;
type ClientChangeFn<S> = dyn Fn(&S) + Send + Sync;
type ServerMapFn<S> = dyn Fn(S) -> S + Send + Sync;

// ----------------------------------------------------------------------------
// Factory
// ----------------------------------------------------------------------------

/// Validated side effect configuration, ready to wrap components.
pub struct SideEffect<P, S> {
    reduce_props: Arc<ReduceFn<P, S>>,
    on_client_change: Arc<ClientChangeFn<S>>,
    map_state_on_server: Option<Arc<ServerMapFn<S>>>,
}

impl<P, S> SideEffect<P, S>
where
    P: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    /// Create a factory without a server-side mapping.
    pub fn new<R, C>(reduce_props: R, on_client_change: C) -> Self
    where
        R: Fn(&[P]) -> S + Send + Sync + 'static,
        C: Fn(&S) + Send + Sync + 'static,
    {
        Self {
            reduce_props: Arc::new(reduce_props),
            on_client_change: Arc::new(on_client_change),
            map_state_on_server: None,
        }
    }

    /// Create a factory that maps state before exposing it on the server.
    pub fn with_server_mapping<R, C, M>(
        reduce_props: R,
        on_client_change: C,
        map_state_on_server: M,
    ) -> Self
    where
        R: Fn(&[P]) -> S + Send + Sync + 'static,
        C: Fn(&S) + Send + Sync + 'static,
        M: Fn(S) -> S + Send + Sync + 'static,
    {
        Self {
            map_state_on_server: Some(Arc::new(map_state_on_server)),
            ..Self::new(reduce_props, on_client_change)
        }
    }

    /// Wrap a component for the target of the current build.
    pub fn wrap<C>(&self) -> SideEffectComponent<C, S>
    where
        C: Component<Props = P>,
    {
        self.wrap_with_target(Target::detect())
    }

    /// Wrap a component for an explicit target.
    ///
    /// Each call creates a fresh registry, even for the same component type.
    pub fn wrap_with_target<C>(&self, target: Target) -> SideEffectComponent<C, S>
    where
        C: Component<Props = P>,
    {
        let display_name = format!("SideEffect({})", display_name_of::<C>());

        tracing::debug!(
            component = %display_name,
            target = ?target,
            server_mapping = self.map_state_on_server.is_some(),
            "Wrapped component"
        );

        SideEffectComponent {
            shared: Arc::new(Shared {
                display_name,
                target,
                config: self.clone(),
                registry: Mutex::new(Registry::new()),
            }),
            _component: PhantomData,
        }
    }
}

impl<P, S> Clone for SideEffect<P, S> {
    fn clone(&self) -> Self {
        Self {
            reduce_props: Arc::clone(&self.reduce_props),
            on_client_change: Arc::clone(&self.on_client_change),
            map_state_on_server: self.map_state_on_server.clone(),
        }
    }
}

impl<P, S> std::fmt::Debug for SideEffect<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideEffect")
            .field("map_state_on_server", &self.map_state_on_server.is_some())
            .finish_non_exhaustive()
    }
}

/// Start building a [`SideEffect`].
pub fn with_side_effect<P, S>() -> SideEffectBuilder<P, S> {
    SideEffectBuilder::default()
}

/// Collects the side effect functions and validates them once in
/// [`build`](Self::build).
pub struct SideEffectBuilder<P, S> {
    reduce_props: Option<Arc<ReduceFn<P, S>>>,
    on_client_change: Option<Arc<ClientChangeFn<S>>>,
    map_state_on_server: Option<Arc<ServerMapFn<S>>>,
}

impl<P, S> Default for SideEffectBuilder<P, S> {
    fn default() -> Self {
        Self {
            reduce_props: None,
            on_client_change: None,
            map_state_on_server: None,
        }
    }
}

impl<P, S> SideEffectBuilder<P, S> {
    pub fn reduce_props<F>(mut self, reduce_props: F) -> Self
    where
        F: Fn(&[P]) -> S + Send + Sync + 'static,
    {
        self.reduce_props = Some(Arc::new(reduce_props));
        self
    }

    pub fn on_client_change<F>(mut self, on_client_change: F) -> Self
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.on_client_change = Some(Arc::new(on_client_change));
        self
    }

    pub fn map_state_on_server<F>(mut self, map_state_on_server: F) -> Self
    where
        F: Fn(S) -> S + Send + Sync + 'static,
    {
        self.map_state_on_server = Some(Arc::new(map_state_on_server));
        self
    }

    /// Validate the configuration.
    ///
    /// `reduce_props` and `on_client_change` are required;
    /// `map_state_on_server` may be omitted.
    pub fn build(self) -> Result<SideEffect<P, S>, ConfigurationError> {
        let reduce_props = self
            .reduce_props
            .ok_or(ConfigurationError::MissingReduceProps)?;
        let on_client_change = self
            .on_client_change
            .ok_or(ConfigurationError::MissingOnClientChange)?;

        Ok(SideEffect {
            reduce_props,
            on_client_change,
            map_state_on_server: self.map_state_on_server,
        })
    }
}

impl<P, S> std::fmt::Debug for SideEffectBuilder<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideEffectBuilder")
            .field("reduce_props", &self.reduce_props.is_some())
            .field("on_client_change", &self.on_client_change.is_some())
            .field("map_state_on_server", &self.map_state_on_server.is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Wrapper component
// ----------------------------------------------------------------------------

/// State shared by a wrapper and all of its instances.
struct Shared<P, S> {
    display_name: String,
    target: Target,
    config: SideEffect<P, S>,
    registry: Mutex<Registry<P, S>>,
}

impl<P, S> Shared<P, S>
where
    P: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    fn emit_change(&self) {
        let props = self.registry.lock().snapshot();

        tracing::trace!(
            component = %self.display_name,
            instances = props.len(),
            target = ?self.target,
            "Recomputing state"
        );

        let state = (self.config.reduce_props)(props.as_slice());

        if self.target.is_interactive() {
            self.registry.lock().set_state(state.clone());
            (self.config.on_client_change)(&state);
        } else {
            let state = match &self.config.map_state_on_server {
                Some(map_state_on_server) => map_state_on_server(state),
                None => state,
            };
            self.registry.lock().set_state(state);
        }
    }
}

/// The wrapper produced by [`SideEffect::wrap`].
///
/// Cloning the wrapper shares its registry.
pub struct SideEffectComponent<C: Component, S> {
    shared: Arc<Shared<C::Props, S>>,
    _component: PhantomData<fn() -> C>,
}

impl<C, S> SideEffectComponent<C, S>
where
    C: Component,
    S: Clone + Send + Sync + 'static,
{
    /// `SideEffect(<wrapped display name>)`.
    pub fn display_name(&self) -> &str {
        &self.shared.display_name
    }

    pub fn target(&self) -> Target {
        self.shared.target
    }

    /// Whether this wrapper was created for an interactive target.
    pub fn in_container(&self) -> bool {
        self.shared.target.is_interactive()
    }

    /// The most recently computed state, without side effects.
    pub fn peek(&self) -> Option<S> {
        self.shared.registry.lock().state().cloned()
    }

    /// Take the state and empty the registry.
    ///
    /// Only valid on a non-interactive target; interactive wrappers return
    /// [`UsageError::RewindOnClient`] and keep their state.
    pub fn rewind(&self) -> Result<Option<S>, UsageError> {
        if self.in_container() {
            return Err(UsageError::RewindOnClient {
                component: self.shared.display_name.clone(),
            });
        }

        let mut registry = self.shared.registry.lock();
        let dropped = registry.len();
        let recorded = registry.reset();
        drop(registry);

        tracing::debug!(
            component = %self.shared.display_name,
            instances = dropped,
            had_state = recorded.is_some(),
            "Rewound server state"
        );

        Ok(recorded)
    }

    /// Number of instances currently in the registry.
    pub fn mounted_count(&self) -> usize {
        self.shared.registry.lock().len()
    }

    /// Create an instance with the given props. It joins the registry once
    /// the host calls [`Lifecycle::will_mount`].
    pub fn instantiate(&self, props: C::Props) -> SideEffectInstance<C, S> {
        SideEffectInstance {
            handle: InstanceHandle::new(props),
            shared: Arc::clone(&self.shared),
            _component: PhantomData,
        }
    }
}

impl<C: Component, S> Clone for SideEffectComponent<C, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _component: PhantomData,
        }
    }
}

impl<C: Component, S: std::fmt::Debug> std::fmt::Debug for SideEffectComponent<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideEffectComponent")
            .field("display_name", &self.shared.display_name)
            .field("target", &self.shared.target)
            .field("registry", &*self.shared.registry.lock())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Wrapper instances
// ----------------------------------------------------------------------------

/// One occurrence of a wrapper in the host's tree.
pub struct SideEffectInstance<C: Component, S> {
    handle: InstanceHandle<C::Props>,
    shared: Arc<Shared<C::Props, S>>,
    _component: PhantomData<fn() -> C>,
}

impl<C, S> SideEffectInstance<C, S>
where
    C: Component,
    S: Clone + Send + Sync + 'static,
{
    pub fn id(&self) -> InstanceId {
        self.handle.id()
    }

    pub fn props(&self) -> C::Props {
        self.handle.props()
    }

    /// Replace the props owned by the host.
    ///
    /// The new props are seen at the next recomputation; hosts follow this
    /// with [`Lifecycle::did_update`].
    pub fn set_props(&self, props: C::Props) {
        self.handle.set_props(props);
    }

    /// Render the wrapped component with the props unchanged.
    pub fn render(&self) -> C::Output {
        C::render(&self.handle.props())
    }
}

impl<C, S> Lifecycle for SideEffectInstance<C, S>
where
    C: Component,
    S: Clone + Send + Sync + 'static,
{
    fn will_mount(&self) {
        let duplicate = self.shared.registry.lock().mount(self.handle.clone());

        if duplicate {
            tracing::warn!(
                component = %self.shared.display_name,
                instance = ?self.handle.id(),
                "Instance mounted twice; registry now holds a duplicate entry"
            );
        } else {
            tracing::debug!(
                component = %self.shared.display_name,
                instance = ?self.handle.id(),
                "Mounted instance"
            );
        }

        self.shared.emit_change();
    }

    fn did_update(&self) {
        self.shared.emit_change();
    }

    fn will_unmount(&self) {
        let removed = self.shared.registry.lock().unmount(self.handle.id());

        if removed {
            tracing::debug!(
                component = %self.shared.display_name,
                instance = ?self.handle.id(),
                "Unmounted instance"
            );
        } else {
            tracing::warn!(
                component = %self.shared.display_name,
                instance = ?self.handle.id(),
                "Unmounted an instance that is not in the registry"
            );
        }
        debug_assert!(
            removed,
            "{}: unmounted instance {:?} was never mounted",
            self.shared.display_name,
            self.handle.id()
        );

        self.shared.emit_change();
    }
}

impl<C, S> std::fmt::Debug for SideEffectInstance<C, S>
where
    C: Component,
    C::Props: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideEffectInstance")
            .field("component", &self.shared.display_name)
            .field("handle", &self.handle)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct TitleProps {
        title: String,
    }

    fn title(s: &str) -> TitleProps {
        TitleProps {
            title: s.to_string(),
        }
    }

    struct Title;

    impl Component for Title {
        type Props = TitleProps;
        type Output = String;

        fn render(props: &TitleProps) -> String {
            format!("<title>{}</title>", props.title)
        }
    }

    fn titles(list: &[TitleProps]) -> Vec<String> {
        list.iter().map(|p| p.title.clone()).collect()
    }

    /// Factory that records every `on_client_change` call.
    fn recording() -> (SideEffect<TitleProps, Vec<String>>, Arc<Mutex<Vec<Vec<String>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();

        let factory = SideEffect::new(titles, move |state: &Vec<String>| {
            calls_clone.lock().push(state.clone());
        });

        (factory, calls)
    }

    #[test]
    fn builder_requires_reduce_props() {
        let result = with_side_effect::<TitleProps, Vec<String>>()
            .on_client_change(|_| {})
            .build();

        assert_eq!(result.err(), Some(ConfigurationError::MissingReduceProps));
    }

    #[test]
    fn builder_requires_on_client_change() {
        let result = with_side_effect().reduce_props(titles).build();

        assert_eq!(
            result.err(),
            Some(ConfigurationError::MissingOnClientChange)
        );
    }

    #[test]
    fn builder_allows_missing_server_mapping() {
        let result = with_side_effect()
            .reduce_props(titles)
            .on_client_change(|_| {})
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn display_name_wraps_component_name() {
        let (factory, _) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::Interactive);

        assert_eq!(wrapper.display_name(), "SideEffect(Title)");
        assert!(wrapper.in_container());
        assert_eq!(wrapper.target(), Target::Interactive);
    }

    #[test]
    fn client_change_called_once_per_recomputation() {
        let (factory, calls) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::Interactive);

        let a = wrapper.instantiate(title("A"));
        let b = wrapper.instantiate(title("B"));

        a.will_mount();
        b.will_mount();
        b.set_props(title("C"));
        b.did_update();
        a.will_unmount();

        assert_eq!(
            *calls.lock(),
            vec![
                vec!["A".to_string()],
                vec!["A".to_string(), "B".to_string()],
                vec!["A".to_string(), "C".to_string()],
                vec!["C".to_string()],
            ]
        );
        assert_eq!(wrapper.peek(), Some(vec!["C".to_string()]));
    }

    #[test]
    fn state_is_stored_before_client_change() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let slot: Arc<Mutex<Option<SideEffectComponent<Title, Vec<String>>>>> =
            Arc::new(Mutex::new(None));
        let slot_clone = slot.clone();

        let factory = SideEffect::new(titles, move |_: &Vec<String>| {
            let wrapper = slot_clone.lock().clone();
            if let Some(wrapper) = wrapper {
                *seen_clone.lock() = wrapper.peek();
            }
        });
        let wrapper = factory.wrap_with_target::<Title>(Target::Interactive);
        *slot.lock() = Some(wrapper.clone());

        wrapper.instantiate(title("A")).will_mount();

        assert_eq!(*seen.lock(), Some(vec!["A".to_string()]));
    }

    #[test]
    fn server_target_never_calls_client_change() {
        let (factory, calls) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::NonInteractive);

        let a = wrapper.instantiate(title("A"));
        a.will_mount();
        a.did_update();

        assert!(calls.lock().is_empty());
        assert_eq!(wrapper.peek(), Some(vec!["A".to_string()]));
        assert!(!wrapper.in_container());
    }

    #[test]
    fn server_mapping_applied_once_per_recomputation() {
        let map_count = Arc::new(AtomicUsize::new(0));
        let map_count_clone = map_count.clone();

        let factory = SideEffect::with_server_mapping(
            titles,
            |_: &Vec<String>| {},
            move |mut state: Vec<String>| {
                map_count_clone.fetch_add(1, Ordering::SeqCst);
                state.reverse();
                state
            },
        );
        let wrapper = factory.wrap_with_target::<Title>(Target::NonInteractive);

        wrapper.instantiate(title("A")).will_mount();
        wrapper.instantiate(title("B")).will_mount();

        assert_eq!(map_count.load(Ordering::SeqCst), 2);
        assert_eq!(wrapper.peek(), Some(vec!["B".to_string(), "A".to_string()]));
    }

    #[test]
    fn server_mapping_ignored_on_client() {
        let factory = SideEffect::with_server_mapping(
            titles,
            |_: &Vec<String>| {},
            |_: Vec<String>| vec!["mapped".to_string()],
        );
        let wrapper = factory.wrap_with_target::<Title>(Target::Interactive);

        wrapper.instantiate(title("A")).will_mount();

        assert_eq!(wrapper.peek(), Some(vec!["A".to_string()]));
    }

    #[test]
    fn peek_is_unset_before_first_mount() {
        let (factory, _) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::NonInteractive);

        assert_eq!(wrapper.peek(), None);
        assert_eq!(wrapper.peek(), None);
    }

    #[test]
    fn rewind_on_client_is_an_error_and_keeps_state() {
        let (factory, _) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::Interactive);
        wrapper.instantiate(title("A")).will_mount();

        let err = wrapper.rewind().unwrap_err();

        assert!(err.to_string().contains("Call peek()"));
        assert_eq!(wrapper.peek(), Some(vec!["A".to_string()]));
        assert_eq!(wrapper.mounted_count(), 1);
    }

    #[test]
    fn rewind_on_server_resets_registry() {
        let (factory, _) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::NonInteractive);
        wrapper.instantiate(title("A")).will_mount();
        wrapper.instantiate(title("B")).will_mount();

        assert_eq!(
            wrapper.rewind(),
            Ok(Some(vec!["A".to_string(), "B".to_string()]))
        );
        assert_eq!(wrapper.mounted_count(), 0);
        assert_eq!(wrapper.peek(), None);
        assert_eq!(wrapper.rewind(), Ok(None));
    }

    #[test]
    fn wrappers_do_not_share_registries() {
        let (factory, _) = recording();
        let first = factory.wrap_with_target::<Title>(Target::NonInteractive);
        let second = factory.wrap_with_target::<Title>(Target::NonInteractive);

        first.instantiate(title("A")).will_mount();

        assert_eq!(first.mounted_count(), 1);
        assert_eq!(second.mounted_count(), 0);
        assert_eq!(second.peek(), None);
    }

    #[test]
    fn duplicate_mount_leaves_stale_entry() {
        let (factory, _) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::NonInteractive);
        let a = wrapper.instantiate(title("A"));

        a.will_mount();
        a.will_mount();
        assert_eq!(wrapper.mounted_count(), 2);

        a.will_unmount();
        assert_eq!(wrapper.mounted_count(), 1);
        assert_eq!(wrapper.peek(), Some(vec!["A".to_string()]));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "was never mounted")]
    fn unmount_without_mount_asserts_in_debug() {
        let (factory, _) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::NonInteractive);

        wrapper.instantiate(title("A")).will_unmount();
    }

    #[test]
    fn render_forwards_props() {
        let (factory, _) = recording();
        let wrapper = factory.wrap_with_target::<Title>(Target::Interactive);
        let a = wrapper.instantiate(title("Home"));

        assert_eq!(a.render(), "<title>Home</title>");
        assert_eq!(a.props(), title("Home"));
    }
}
