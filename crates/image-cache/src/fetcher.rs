//! Image retrieval over HTTP

use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

/// Raw image bytes plus the content type the server reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Network boundary of the loader
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// Fetches images with a plain HTTP GET.
///
/// No request timeout is configured; the transport defaults apply.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Use a preconfigured client (proxy, user agent, ...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        debug!(url, "Fetching image");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url, "Image request failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
            .to_vec();

        debug!(
            url,
            size = bytes.len(),
            content_type = %content_type,
            "Fetched image"
        );

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;

    async fn spawn_image_server() -> String {
        let router = Router::new()
            .route(
                "/cat.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G']) }),
            )
            .route("/untyped", get(|| async { vec![1u8, 2, 3] }))
            .route(
                "/agent",
                get(|headers: HeaderMap| async move {
                    headers
                        .get(header::USER_AGENT)
                        .map(|v| v.as_bytes().to_vec())
                        .unwrap_or_default()
                }),
            )
            .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/broken.png",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let base = spawn_image_server().await;
        let fetcher = HttpFetcher::new();

        let image = fetcher.fetch(&format!("{}/cat.png", base)).await.unwrap();
        assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(image.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_with_client_sends_custom_user_agent() {
        let base = spawn_image_server().await;
        let client = Client::builder()
            .user_agent("recipe-images/1.0")
            .build()
            .unwrap();
        let fetcher = HttpFetcher::with_client(client);

        let image = fetcher.fetch(&format!("{}/agent", base)).await.unwrap();
        assert_eq!(image.bytes, b"recipe-images/1.0".to_vec());
    }

    #[tokio::test]
    async fn test_fetch_without_content_type_header() {
        let base = spawn_image_server().await;
        let fetcher = HttpFetcher::new();

        let image = fetcher.fetch(&format!("{}/untyped", base)).await.unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3]);
        // Vec<u8> bodies are served as octet-stream by axum
        assert_eq!(image.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let base = spawn_image_server().await;
        let fetcher = HttpFetcher::new();

        let err = fetcher
            .fetch(&format!("{}/missing.png", base))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(404));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let base = spawn_image_server().await;
        let fetcher = HttpFetcher::new();

        let err = fetcher
            .fetch(&format!("{}/broken.png", base))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(500));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new();
        let err = fetcher
            .fetch(&format!("http://{}/cat.png", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
