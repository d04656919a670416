//! Process-wide cache manager
//!
//! Initialised once at startup; entries expire on their own so there is no
//! teardown.

use crate::cache::CacheManager;
use crate::error::{ImageCacheError, Result};
use std::sync::OnceLock;
use tracing::info;

static MANAGER: OnceLock<CacheManager> = OnceLock::new();

/// Install `manager` as the process-wide manager.
///
/// Fails if a manager is already installed; the existing one is kept.
pub fn init(manager: CacheManager) -> Result<&'static CacheManager> {
    let mut installed = false;
    let current = MANAGER.get_or_init(|| {
        installed = true;
        manager
    });

    if !installed {
        return Err(ImageCacheError::AlreadyInitialized);
    }

    info!(
        key_prefix = %current.config().key_prefix,
        ttl_secs = current.config().ttl.as_secs(),
        dedupe_fetches = current.config().dedupe_fetches,
        "Image cache initialized"
    );
    Ok(current)
}

/// The process-wide manager, if [`init`] has run
pub fn manager() -> Option<&'static CacheManager> {
    MANAGER.get()
}
