use std::io;
use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    String(String),

    /// Errors due to IO, such as failures reading or writing the cache file.
    #[error("{0}: {1}")]
    IOError(String, #[source] io::Error),

    /// Errors related to handling of raw data, such as unexpected bytes in
    /// the cache file.
    #[error("{0}")]
    DataError(String),

    /// The principal stored in the cache is not the expected one.
    #[error("Primary principals don't match: expected {expected}, found {found}")]
    PrincipalMismatch { expected: String, found: String },

    #[error("Invalid cache path '{0}'")]
    InvalidPath(String),

    /// Unknown value for the default initiate credential setting.
    #[error("Invalid initiate credential policy '{0}'")]
    InvalidPolicy(String),

    #[error("Impersonation failed: {0}")]
    Impersonation(String),
}

impl Error {
    pub fn is_not_found_error(&self) -> bool {
        if let Error::IOError(_, ref io_err) = self {
            return io_err.kind() == io::ErrorKind::NotFound;
        }
        return false;
    }

    pub fn is_data_error(&self) -> bool {
        if let Error::DataError(_) = self {
            return true;
        }
        return false;
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        return Self::String(error);
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        return Self::String(error.to_string());
    }
}

impl From<(&str, io::Error)> for Error {
    fn from(error: (&str, io::Error)) -> Self {
        return Self::IOError(error.0.into(), error.1);
    }
}

impl From<(String, io::Error)> for Error {
    fn from(error: (String, io::Error)) -> Self {
        return Self::IOError(error.0, error.1);
    }
}
