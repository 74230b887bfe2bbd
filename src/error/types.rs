use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Why a single contract read produced no usable output.
///
/// These never escape the dispatcher as `Err`: they travel inside
/// [`Outcome::Failure`](crate::multicall::Outcome) so that one bad call
/// cannot abort its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("no contract code at target")]
    NoCode,

    #[error("call reverted: {reason}")]
    Reverted { reason: String },

    #[error("output does not match the declared shape: {0}")]
    Decode(String),

    #[error("transport failed after retries: {0}")]
    Transport(String),
}

/// Reason class of a [`CallError`], used where only the kind matters
/// (metrics labels, idempotence checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NoCode,
    Reverted,
    Decode,
    Transport,
}

impl CallError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CallError::NoCode => FailureKind::NoCode,
            CallError::Reverted { .. } => FailureKind::Reverted,
            CallError::Decode(_) => FailureKind::Decode,
            CallError::Transport(_) => FailureKind::Transport,
        }
    }

    /// Only network-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallError::Transport(_))
    }
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NoCode => "no_code",
            FailureKind::Reverted => "reverted",
            FailureKind::Decode => "decode",
            FailureKind::Transport => "transport",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Faults that are allowed to reach the caller of a resolution pass.
///
/// Everything else (reverts, undecodable outputs, a flaky node) is data.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Invalid call at index {index}: {reason}")]
    InvalidCall { index: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resolution timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Resolution cancelled")]
    Cancelled,

    #[error("Resolver {resolver} failed: {message}")]
    Resolver { resolver: String, message: String },
}

impl EngineError {
    /// Configuration faults and cancellation abort the whole pass; anything
    /// else only removes the positions of the resolver that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidCall { .. }
                | EngineError::Config(_)
                | EngineError::Timeout { .. }
                | EngineError::Cancelled
        )
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<url::ParseError> for EngineError {
    fn from(err: url::ParseError) -> Self {
        EngineError::Config(format!("Invalid URL: {}", err))
    }
}
