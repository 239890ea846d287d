use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can be *reported* back to a caller, as opposed to the fatal
/// precondition violations in the buffer pool and replacer, which abort the
/// process instead (see the spec's error handling design).
#[derive(Debug)]
pub enum Error {
    /// Invalid input at a boundary (config parsing, disk manager setup, ...).
    InvalidInput(String),
    /// A disk I/O operation failed.
    Io(std::io::Error),
    /// A code path that is intentionally not implemented yet.
    NotImplemented(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::NotImplemented(msg) => write!(f, "not implemented: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

/// Builds an `Error::InvalidInput` from a format string, mirroring the rest
/// of the host project's `errinput!` convention.
#[macro_export]
macro_rules! errinput {
    ($($args:tt)*) => {
        $crate::common::error::Error::InvalidInput(format!($($args)*))
    };
}
