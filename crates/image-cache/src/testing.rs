//! Scripted fetcher for unit tests

use crate::error::FetchError;
use crate::fetcher::{FetchedImage, ImageFetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

struct Script {
    result: Result<FetchedImage, FetchError>,
    gate: Option<Arc<Semaphore>>,
}

/// Answers fetches from a per-URL script and counts calls.
///
/// Unscripted URLs answer 404. A gated URL blocks until its gate is opened.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, content_type: &str, bytes: &[u8]) {
        self.script(url, Ok(image(content_type, bytes)), None);
    }

    pub fn fail(&self, url: &str, error: FetchError) {
        self.script(url, Err(error), None);
    }

    /// Respond only once the returned gate gets a permit
    pub fn respond_gated(&self, url: &str, content_type: &str, bytes: &[u8]) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.script(url, Ok(image(content_type, bytes)), Some(gate.clone()));
        gate
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn script(&self, url: &str, result: Result<FetchedImage, FetchError>, gate: Option<Arc<Semaphore>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), Script { result, gate });
    }
}

fn image(content_type: &str, bytes: &[u8]) -> FetchedImage {
    FetchedImage {
        bytes: bytes.to_vec(),
        content_type: content_type.to_string(),
    }
}

/// Let the gate through for every current and future waiter
pub fn open(gate: &Semaphore) {
    gate.add_permits(1);
}

#[async_trait]
impl ImageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        let (result, gate) = match self.scripts.lock().unwrap().get(url) {
            Some(script) => (script.result.clone(), script.gate.clone()),
            None => (Err(FetchError::Status(404)), None),
        };

        if let Some(gate) = gate {
            // Dropping the permit hands it to the next waiter
            let _permit = gate.acquire().await;
        }

        result
    }
}
