//! Error types for key-value stores

use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// Writing the value would push the store past its byte quota
    QuotaExceeded { required: u64, quota: u64 },
    /// The store cannot be accessed at all
    Unavailable(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::QuotaExceeded { required, quota } => write!(
                f,
                "Quota exceeded: {} bytes required, quota is {} bytes",
                required, quota
            ),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
