//! Subcommand implementations

use crate::error::Result;
use crate::report::{LoadReport, LookupReport};
use image_cache::codec::decode_data_uri;
use image_cache::{CacheManager, DisplayState, ImageView, LoadRequest};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// Run one image through a display instance and report where it settled
pub async fn load(
    manager: &CacheManager,
    url: &str,
    fallback: Option<String>,
    alt: &str,
    output: Option<&Path>,
) -> Result<LoadReport> {
    let view = ImageView::new(manager.clone(), alt);

    let mut request = LoadRequest::new(url);
    if let Some(fallback) = fallback {
        request = request.with_fallback(fallback);
    }

    let state = if request.url.is_empty() {
        warn!("No image URL given, display stays in loading state");
        view.set_source(request);
        view.state()
    } else {
        view.set_source(request);
        view.settled().await
    };

    if let Some(path) = output {
        write_output(&state, path).await?;
    }

    Ok(LoadReport::new(url, &state, manager.stats()))
}

/// Report whether `url` has a fresh cache entry
pub async fn lookup(manager: &CacheManager, url: &str) -> LookupReport {
    let data = manager.lookup(url).await;
    LookupReport::new(url, manager.key_for(url), data.as_deref())
}

async fn write_output(state: &DisplayState, path: &Path) -> Result<()> {
    let DisplayState::Loaded { data } = state else {
        warn!(path = ?path, "Image did not load, nothing written");
        return Ok(());
    };

    match decode_data_uri(data) {
        Some((content_type, bytes)) => {
            fs::write(path, &bytes).await?;
            info!(path = ?path, size = bytes.len(), content_type = %content_type, "Wrote image");
        }
        None => warn!(path = ?path, "Cached data is not a base64 data URI, nothing written"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_cache::{CacheConfig, HttpFetcher};
    use kv_store::{FileStore, KeyValueStore};
    use std::sync::Arc;
    use tempfile::tempdir;

    const URL: &str = "https://images.example.com/waffles.png";

    async fn manager(dir: &Path) -> (Arc<FileStore>, CacheManager) {
        let store = Arc::new(FileStore::new(dir.to_path_buf(), 1024 * 1024));
        store.init().await.unwrap();
        let manager = CacheManager::new(
            store.clone(),
            Arc::new(HttpFetcher::new()),
            CacheConfig::default(),
        );
        (store, manager)
    }

    async fn unreachable_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/missing.png", addr)
    }

    async fn seed(store: &FileStore, manager: &CacheManager, url: &str) {
        let entry = image_cache::CacheEntry {
            data: "data:image/png;base64,iVBORw==".to_string(),
            timestamp: now_millis(),
        };
        store
            .set(&manager.key_for(url), &serde_json::to_string(&entry).unwrap())
            .await
            .unwrap();
    }

    fn now_millis() -> i64 {
        use image_cache::Clock;
        image_cache::SystemClock.now_millis()
    }

    #[tokio::test]
    async fn test_load_from_cache_writes_output() {
        let dir = tempdir().unwrap();
        let (store, manager) = manager(&dir.path().join("store")).await;
        seed(&store, &manager, URL).await;

        let output = dir.path().join("waffles.png");
        let report = load(&manager, URL, None, "Waffles", Some(&output))
            .await
            .unwrap();

        assert_eq!(report.state, "loaded");
        assert_eq!(report.cache.hits, 1);
        assert_eq!(std::fs::read(&output).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_load_failure_uses_fallback() {
        let dir = tempdir().unwrap();
        let (_, manager) = manager(dir.path()).await;
        let url = unreachable_url().await;

        let output = dir.path().join("out.png");
        let report = load(
            &manager,
            &url,
            Some("/static/fallback.png".to_string()),
            "",
            Some(&output),
        )
        .await
        .unwrap();

        assert_eq!(report.state, "fallback_loaded");
        assert_eq!(report.src.as_deref(), Some("/static/fallback.png"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_load_failure_without_fallback() {
        let dir = tempdir().unwrap();
        let (_, manager) = manager(dir.path()).await;
        let url = unreachable_url().await;

        let report = load(&manager, &url, None, "", None).await.unwrap();
        assert_eq!(report.state, "placeholder_shown");
        assert_eq!(report.cache.fetches, 1);
    }

    #[tokio::test]
    async fn test_load_empty_url() {
        let dir = tempdir().unwrap();
        let (_, manager) = manager(dir.path()).await;

        let report = load(&manager, "", None, "", None).await.unwrap();
        assert_eq!(report.state, "loading");
        assert_eq!(report.cache.fetches, 0);
    }

    #[tokio::test]
    async fn test_lookup() {
        let dir = tempdir().unwrap();
        let (store, manager) = manager(dir.path()).await;

        let miss = lookup(&manager, URL).await;
        assert!(!miss.cached);

        seed(&store, &manager, URL).await;
        let hit = lookup(&manager, URL).await;
        assert!(hit.cached);
        assert_eq!(hit.size, Some(4));
        assert_eq!(hit.key, manager.key_for(URL));
    }
}
