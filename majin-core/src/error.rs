use std::fmt;

/// Result type alias for majin core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for majin core operations
#[derive(Debug)]
pub enum Error {
    /// I/O errors
    Io(std::io::Error),

    /// Invalid workload or target configuration
    Config(String),

    /// A targeter could not produce a request
    Target(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
            Error::Target(msg) => write!(f, "Target error: {msg}"),
            Error::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
