//! Execution targets.
//!
//! A wrapper is bound to one target when it is created. Interactive targets
//! (a browser, a live native view tree) receive `on_client_change` calls.
//! Non-interactive targets (server-side render passes) accumulate state that
//! is later consumed with `rewind()`.

/// Where the wrapped component tree is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A long-lived view that can apply side effects as state changes.
    Interactive,

    /// A one-shot render pass whose state is handed off afterwards.
    NonInteractive,
}

impl Target {
    /// Resolve the target of the current build.
    ///
    /// `wasm32` builds run in a browser and are interactive; everything else
    /// is treated as a server renderer. Hosts that know better should pass a
    /// target explicitly instead.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Target::Interactive
        } else {
            Target::NonInteractive
        }
    }

    pub fn is_interactive(self) -> bool {
        matches!(self, Target::Interactive)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::detect()
    }
}
