//! Cached Image Loader
//!
//! Turns a remote image URL into displayable content. Successful fetches are
//! encoded as self-contained data URIs and kept in a key-value store for a
//! 24 hour freshness window. Failed fetches fall back to a caller-supplied
//! URL or a built-in placeholder graphic.
//!
//! - [`CacheManager`] performs cache lookup and fetch-and-store.
//! - [`ImageView`] is one display instance driving the
//!   `Loading -> Loaded | FallbackLoaded | PlaceholderShown` state machine.
//! - [`global`] holds the process-wide manager.

pub mod cache;
pub mod clock;
pub mod codec;
pub mod error;
pub mod fetcher;
pub mod global;
pub mod types;
pub mod view;

#[cfg(test)]
mod testing;

pub use cache::CacheManager;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, FetchError, ImageCacheError, RenderError, Result};
pub use fetcher::{FetchedImage, HttpFetcher, ImageFetcher};
pub use types::{CacheConfig, CacheEntry, CacheStats, LoadRequest};
pub use view::{
    DisplayState, ImageSize, ImageVariant, ImageView, LoadingStrategy, ObjectFit, Presentation,
    Rendered,
};
