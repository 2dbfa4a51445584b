//! Component model.
//!
//! The host rendering framework owns components; this crate only needs to
//! know how to name one and how to forward props to it.

use std::any::type_name;

/// Name used when a component has neither an explicit nor an intrinsic name.
const FALLBACK_NAME: &str = "Component";

/// A component type that can be wrapped.
///
/// # Example
///
/// ```rust
/// use sidefx_core::Component;
///
/// struct Meta;
///
/// impl Component for Meta {
///     type Props = (String, String);
///     type Output = String;
///     const DISPLAY_NAME: Option<&'static str> = Some("HeadMeta");
///
///     fn render((name, content): &(String, String)) -> String {
///         format!("<meta name=\"{name}\" content=\"{content}\">")
///     }
/// }
/// ```
pub trait Component: 'static {
    /// Props handed to every instance by the host.
    type Props: Clone + Send + Sync + 'static;

    /// Whatever the host's render path produces.
    type Output;

    /// Explicit display name, taking precedence over the type name.
    const DISPLAY_NAME: Option<&'static str> = None;

    fn render(props: &Self::Props) -> Self::Output;
}

/// Resolve the display name of a component type.
///
/// Order: [`Component::DISPLAY_NAME`], the type's own name (without module
/// path or generic arguments), then `"Component"`.
pub fn display_name_of<C: Component>() -> &'static str {
    C::DISPLAY_NAME
        .or_else(|| intrinsic_name(type_name::<C>()))
        .unwrap_or(FALLBACK_NAME)
}

/// Last path segment of a type name, or `None` for anonymous types.
fn intrinsic_name(full: &'static str) -> Option<&'static str> {
    let without_generics = full.split('<').next().unwrap_or(full);
    let name = without_generics.rsplit("::").next().unwrap_or(without_generics);

    // closures and other compiler-generated types render as `{{closure}}`
    if name.is_empty() || name.starts_with('{') {
        None
    } else {
        Some(name)
    }
}
