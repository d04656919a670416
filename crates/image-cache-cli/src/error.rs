//! Error types for the image cache CLI

use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Store(kv_store::StoreError),
    ImageCache(image_cache::ImageCacheError),
    Io(Box<std::io::Error>),
    Json(serde_json::Error),
    Config(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Store(err) => write!(f, "Store error: {}", err),
            CliError::ImageCache(err) => write!(f, "Image cache error: {}", err),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Json(err) => write!(f, "JSON error: {}", err),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Store(err) => Some(err),
            CliError::ImageCache(err) => Some(err),
            CliError::Io(err) => Some(err.as_ref()),
            CliError::Json(err) => Some(err),
            CliError::Config(_) => None,
        }
    }
}

impl From<kv_store::StoreError> for CliError {
    fn from(err: kv_store::StoreError) -> Self {
        CliError::Store(err)
    }
}

impl From<image_cache::ImageCacheError> for CliError {
    fn from(err: image_cache::ImageCacheError) -> Self {
        CliError::ImageCache(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Json(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for CliError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = CliError::Config("STORE_QUOTA_BYTES must be a number".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: STORE_QUOTA_BYTES must be a number"
        );
    }

    #[test]
    fn test_store_error_display() {
        let err = CliError::from(kv_store::StoreError::Unavailable("disabled".to_string()));
        assert_eq!(format!("{}", err), "Store error: Store unavailable: disabled");
    }

    #[test]
    fn test_image_cache_error_display() {
        let err = CliError::from(image_cache::ImageCacheError::AlreadyInitialized);
        assert!(format!("{}", err).contains("already initialized"));
    }
}
