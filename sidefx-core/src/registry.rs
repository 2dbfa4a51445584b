//! Mounted-instance registry.
//!
//! One registry exists per wrapped component. It holds:
//!
//! - the mounted instances, in mount order
//! - the state computed at the most recent recomputation, if any
//!
//! # Duplicates
//!
//! Mounting appends unconditionally. If a host fires mount twice for the
//! same instance the registry holds it twice, and a single unmount removes
//! only the first occurrence. The registry reports the duplicate so the
//! caller can log it, but keeps both entries.

use super::instance::{InstanceHandle, InstanceId};

pub struct Registry<P, S> {
    /// Live instances, insertion order = mount order.
    mounted: Vec<InstanceHandle<P>>,

    /// `None` before the first recomputation and after a reset.
    state: Option<S>,
}

impl<P: Clone, S> Registry<P, S> {
    pub fn new() -> Self {
        Self {
            mounted: Vec::new(),
            state: None,
        }
    }

    /// Append an instance.
    ///
    /// Returns `true` if the instance was already present.
    pub fn mount(&mut self, handle: InstanceHandle<P>) -> bool {
        let duplicate = self.contains(handle.id());
        self.mounted.push(handle);
        duplicate
    }

    /// Remove the first entry with the given identity.
    ///
    /// Returns `false` if no entry matched; the registry is left untouched.
    pub fn unmount(&mut self, id: InstanceId) -> bool {
        match self.mounted.iter().position(|h| h.id() == id) {
            Some(index) => {
                self.mounted.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.mounted.iter().any(|h| h.id() == id)
    }

    /// Current props of every mounted instance, in mount order.
    pub fn snapshot(&self) -> Vec<P> {
        self.mounted.iter().map(InstanceHandle::props).collect()
    }

    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    pub fn set_state(&mut self, state: S) {
        self.state = Some(state);
    }

    /// Clear every instance and take the current state.
    pub fn reset(&mut self) -> Option<S> {
        self.mounted.clear();
        self.state.take()
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }
}

impl<P: Clone, S> Default for Registry<P, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, S: std::fmt::Debug> std::fmt::Debug for Registry<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("mounted", &self.mounted.len())
            .field("state", &self.state)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
