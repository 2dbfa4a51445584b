//! Error types.
//!
//! Both kinds are fatal for the caller: a bad configuration never yields a
//! factory, and a misused `rewind()` leaves the wrapper untouched.

use thiserror::Error;

/// Raised once, when a side effect factory is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Expected reduce_props to be a function.")]
    MissingReduceProps,

    #[error("Expected on_client_change to be a function.")]
    MissingOnClientChange,
}

/// Raised when the static API is used against the wrong target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// `rewind()` was called on a wrapper bound to an interactive target.
    #[error(
        "{component}: You may only call rewind() on the server. Call peek() to read the current state."
    )]
    RewindOnClient { component: String },
}

/// Any error surfaced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Usage(#[from] UsageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewind_message_points_to_peek() {
        let err = UsageError::RewindOnClient {
            component: "SideEffect(Title)".to_string(),
        };
        let message = err.to_string();

        assert!(message.starts_with("SideEffect(Title): "));
        assert!(message.contains("Call peek() to read the current state."));
    }

    #[test]
    fn errors_convert_into_crate_error() {
        let err: Error = ConfigurationError::MissingReduceProps.into();
        assert_eq!(err.to_string(), "Expected reduce_props to be a function.");
        assert!(matches!(err, Error::Configuration(_)));
    }
}
