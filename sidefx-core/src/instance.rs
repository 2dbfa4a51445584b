//! Instance identity and live props.
//!
//! An `InstanceHandle` stands for one occurrence of a wrapped component in
//! the host's tree. The registry compares handles by identity, never by
//! props, and reads the props at recomputation time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Unique identifier for a wrapper instance.
///
/// Each instance gets a unique ID when it is created. Two instances with
/// equal props are still distinct entries in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Generate a new unique instance ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to one instance's identity and current props.
///
/// Cloning the handle shares the same instance; it does not create a new
/// one.
pub struct InstanceHandle<P> {
    id: InstanceId,
    props: Arc<RwLock<P>>,
}

impl<P: Clone> InstanceHandle<P> {
    pub fn new(props: P) -> Self {
        Self {
            id: InstanceId::new(),
            props: Arc::new(RwLock::new(props)),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Clone of the current props.
    pub fn props(&self) -> P {
        self.props.read().clone()
    }

    /// Replace the props. Takes effect at the next recomputation.
    pub fn set_props(&self, props: P) {
        *self.props.write() = props;
    }

    /// Whether `other` refers to the same instance.
    pub fn same_instance(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> Clone for InstanceHandle<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            props: Arc::clone(&self.props),
        }
    }
}

impl<P: std::fmt::Debug> std::fmt::Debug for InstanceHandle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("id", &self.id)
            .field("props", &*self.props.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_ids_are_unique() {
        let id1 = InstanceId::new();
        let id2 = InstanceId::new();
        let id3 = InstanceId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn equal_props_are_different_instances() {
        let a = InstanceHandle::new("title");
        let b = InstanceHandle::new("title");

        assert!(!a.same_instance(&b));
        assert!(a.same_instance(&a.clone()));
    }

    #[test]
    fn clone_shares_props() {
        let handle1 = InstanceHandle::new(1);
        let handle2 = handle1.clone();

        handle1.set_props(42);
        assert_eq!(handle2.props(), 42);
        assert_eq!(handle1.id(), handle2.id());
    }
}
