//! Lifecycle notifications consumed from the host renderer.
//!
//! The host calls these synchronously, one at a time, in
//! mount/update/unmount order. Every call runs a full recomputation before
//! returning; there is no batching.

/// The three hooks a host delivers to a mounted component.
pub trait Lifecycle {
    /// The instance is about to enter the tree.
    fn will_mount(&self);

    /// The instance's props (or state) were updated.
    fn did_update(&self);

    /// The instance is about to leave the tree.
    fn will_unmount(&self);
}
