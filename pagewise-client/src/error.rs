//! Error types for the call helper layer.
//!
//! This module provides [`CallError`], the error type shared by call-option
//! resolution and paged enumeration.

use pagewise_core::Code;

/// Errors surfaced by call-option resolution and paged enumeration.
///
/// The helper layer performs no retries and no local recovery; every
/// failure from a collaborator is surfaced unchanged to the immediate
/// caller.
#[derive(Clone, Debug, thiserror::Error)]
pub enum CallError {
    /// A caller-supplied argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Cooperative cancellation was observed while waiting.
    #[error("call cancelled: {0}")]
    Cancelled(String),

    /// Failure reported by the underlying chunk source, passed through
    /// unchanged.
    #[error("transport error: {0}")]
    Transport(String),

    /// A sequence was used outside its state contract.
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

impl CallError {
    /// Create an invalid argument error.
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        CallError::InvalidArgument(message.into())
    }

    /// Create a cancellation error.
    pub fn cancelled<S: Into<String>>(message: S) -> Self {
        CallError::Cancelled(message.into())
    }

    /// Create a transport error.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        CallError::Transport(message.into())
    }

    /// Create a contract violation error.
    pub fn contract_violation<S: Into<String>>(message: S) -> Self {
        CallError::ContractViolation(message.into())
    }

    /// Get the status code for this error.
    ///
    /// - `InvalidArgument` maps to [`Code::InvalidArgument`]
    /// - `Cancelled` maps to [`Code::Canceled`]
    /// - `Transport` maps to [`Code::Unavailable`]
    /// - `ContractViolation` maps to [`Code::FailedPrecondition`]
    pub fn code(&self) -> Code {
        match self {
            CallError::InvalidArgument(_) => Code::InvalidArgument,
            CallError::Cancelled(_) => Code::Canceled,
            CallError::Transport(_) => Code::Unavailable,
            CallError::ContractViolation(_) => Code::FailedPrecondition,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            CallError::InvalidArgument(msg)
            | CallError::Cancelled(msg)
            | CallError::Transport(msg)
            | CallError::ContractViolation(msg) => msg,
        }
    }

    /// Returns whether this error indicates a transient condition that may
    /// be resolved by retrying.
    ///
    /// This is a convenience wrapper for [`Code::is_retryable()`].
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}
