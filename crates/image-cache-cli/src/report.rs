//! JSON reports printed by the CLI

use image_cache::codec::decode_data_uri;
use image_cache::{CacheStats, DisplayState};
use serde::Serialize;

const PREVIEW_CHARS: usize = 64;

/// Outcome of `image-cache load`
#[derive(Debug, Serialize)]
pub struct LoadReport {
    pub url: String,
    pub state: &'static str,
    /// Data URI preview or fallback URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    pub cache: CacheStats,
}

impl LoadReport {
    pub fn new(url: &str, state: &DisplayState, cache: CacheStats) -> Self {
        let mut report = Self {
            url: url.to_string(),
            state: state_name(state),
            src: None,
            content_type: None,
            size: None,
            cache,
        };

        match state {
            DisplayState::Loaded { data } => {
                report.src = Some(preview(data));
                if let Some((content_type, bytes)) = decode_data_uri(data) {
                    report.content_type = Some(content_type);
                    report.size = Some(bytes.len());
                }
            }
            DisplayState::FallbackLoaded { url } => report.src = Some(url.clone()),
            DisplayState::Loading | DisplayState::PlaceholderShown => {}
        }

        report
    }
}

/// Outcome of `image-cache lookup`
#[derive(Debug, Serialize)]
pub struct LookupReport {
    pub url: String,
    pub key: String,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl LookupReport {
    pub fn new(url: &str, key: String, data: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            key,
            cached: data.is_some(),
            size: data
                .and_then(decode_data_uri)
                .map(|(_, bytes)| bytes.len()),
        }
    }
}

pub fn state_name(state: &DisplayState) -> &'static str {
    match state {
        DisplayState::Loading => "loading",
        DisplayState::Loaded { .. } => "loaded",
        DisplayState::FallbackLoaded { .. } => "fallback_loaded",
        DisplayState::PlaceholderShown => "placeholder_shown",
    }
}

fn preview(data: &str) -> String {
    match data.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &data[..idx]),
        None => data.to_string(),
    }
}
