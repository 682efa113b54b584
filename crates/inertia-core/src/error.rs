//! Request-scope error types.

use thiserror::Error;

/// Errors raised when untyped data is stored in a request scope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Contextual props were not a JSON object.
    #[error("could not convert context props to map")]
    MalformedContextProps,

    /// Contextual view data was not a JSON object.
    #[error("could not convert context view data to map")]
    MalformedContextViewData,
}
