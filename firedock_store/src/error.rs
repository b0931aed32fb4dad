use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store (or the network path to it) is down. Recoverable; the
    /// caller retries the action.
    #[error("store unreachable")]
    Unreachable,
    /// The referenced dock no longer exists.
    #[error("dock not found: {0}")]
    NotFound(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
