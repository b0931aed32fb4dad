use thiserror::Error;

/// Typed session errors. Persistence failures never propagate past the
/// coordinator boundary; they resolve to an inspectable phase instead.
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Store or network down. Recoverable; the user retries the action.
    #[error("store unreachable: {0}")]
    Unreachable(String),
    /// The referenced dock vanished (deleted while a session was bound).
    #[error("dock not found: {0}")]
    NotFound(String),
    /// Non-positive weight or no bound dock; silently rejected upstream.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing dock registry")]
    MissingRegistry,
    #[error("missing scale feed")]
    MissingFeed,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
