//! Error types for the image cache
//!
//! None of these are fatal to the caller. Fetch errors are resolved by the
//! display state machine, cache errors are logged and swallowed, and render
//! errors escalate the display to the placeholder.

use kv_store::StoreError;
use std::fmt;

/// Retrieving the image over the network failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    Status(u16),
    /// The request never produced a response
    Network(String),
    /// The response body could not be read
    Body(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Status(code) => write!(f, "HTTP {}", code),
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Body(msg) => write!(f, "Failed to read response body: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Reading or writing a cache entry failed
#[derive(Debug)]
pub enum CacheError {
    Read(StoreError),
    Write(StoreError),
    /// A stored value is not a valid entry
    Decode(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Read(err) => write!(f, "Cache read error: {}", err),
            CacheError::Write(err) => write!(f, "Cache write error: {}", err),
            CacheError::Decode(msg) => write!(f, "Cache decode error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Read(err) | CacheError::Write(err) => Some(err),
            CacheError::Decode(_) => None,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Decode(err.to_string())
    }
}

/// The rendering boundary could not display `src`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub src: String,
}

impl RenderError {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into() }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to render image: {}", truncate(&self.src, 80))
    }
}

impl std::error::Error for RenderError {}

/// Setup errors for the process-wide cache manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCacheError {
    AlreadyInitialized,
    NotInitialized,
}

impl fmt::Display for ImageCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageCacheError::AlreadyInitialized => {
                write!(f, "Image cache manager is already initialized")
            }
            ImageCacheError::NotInitialized => write!(f, "Image cache manager is not initialized"),
        }
    }
}

impl std::error::Error for ImageCacheError {}

pub type Result<T> = std::result::Result<T, ImageCacheError>;

/// Shorten long values (data URIs) for messages
pub(crate) fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}
