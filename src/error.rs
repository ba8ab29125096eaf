use thiserror::Error;

/// Error kinds surfaced by the disk image library.
///
/// Every fallible operation returns one of these; nothing is caught and
/// swallowed internally. Validation failures (`InvalidArgument`,
/// `OutOfBounds`) are fatal to the calling operation, `Corrupt` is fatal
/// to the decode that raised it.
#[derive(Debug, Error)]
pub enum DskError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("out of space: {0}")]
    OutOfSpace(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("corrupt image: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, DskError>;
