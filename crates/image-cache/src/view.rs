//! Display state machine for one image instance
//!
//! An [`ImageView`] starts in [`DisplayState::Loading`] and settles into
//! `Loaded`, `FallbackLoaded` or `PlaceholderShown`. Every source change
//! bumps a generation counter; a load that finishes for an older generation,
//! or after the view was unmounted, is discarded instead of applied. In-flight
//! loads are never aborted.

use crate::cache::CacheManager;
use crate::codec;
use crate::error::{ImageCacheError, RenderError, Result};
use crate::global;
use crate::types::LoadRequest;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Where a view is in its load sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DisplayState {
    Loading,
    /// Primary source, as a data URI
    Loaded { data: String },
    /// Fallback URL, used as-is
    FallbackLoaded { url: String },
    PlaceholderShown,
}

impl DisplayState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, DisplayState::Loading)
    }

    /// Source handed to the renderer, if any
    fn src(&self) -> Option<&str> {
        match self {
            DisplayState::Loaded { data } => Some(data),
            DisplayState::FallbackLoaded { url } => Some(url),
            DisplayState::Loading | DisplayState::PlaceholderShown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    #[default]
    Medium,
    Large,
    XLarge,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVariant {
    #[default]
    Default,
    Rounded,
    Circle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectFit {
    #[default]
    Cover,
    Contain,
    Fill,
    ScaleDown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingStrategy {
    #[default]
    Lazy,
    Eager,
}

/// Presentation options passed through to the renderer untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub size: ImageSize,
    pub variant: ImageVariant,
    pub object_fit: ObjectFit,
    pub loading: LoadingStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
}

/// What the surrounding UI should draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rendered {
    Skeleton {
        presentation: Presentation,
    },
    Image {
        src: String,
        alt: String,
        presentation: Presentation,
    },
    Placeholder {
        src: String,
        presentation: Presentation,
    },
}

struct Control {
    generation: u64,
    request: Option<LoadRequest>,
    mounted: bool,
}

struct Shared {
    control: Mutex<Control>,
    state: watch::Sender<DisplayState>,
    discarded: AtomicU64,
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a finished load if it still belongs to the current request
    fn apply(&self, generation: u64, outcome: DisplayState) {
        let control = self.control();
        if !control.mounted || control.generation != generation {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(
                generation,
                current = control.generation,
                mounted = control.mounted,
                "Discarding stale image result"
            );
            return;
        }
        self.state.send_replace(outcome);
    }
}

/// One display instance of a cached image
pub struct ImageView {
    manager: CacheManager,
    shared: Arc<Shared>,
    alt: String,
    presentation: Presentation,
}

impl ImageView {
    pub fn new(manager: CacheManager, alt: impl Into<String>) -> Self {
        let (state, _) = watch::channel(DisplayState::Loading);
        Self {
            manager,
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    generation: 0,
                    request: None,
                    mounted: true,
                }),
                state,
                discarded: AtomicU64::new(0),
            }),
            alt: alt.into(),
            presentation: Presentation::default(),
        }
    }

    /// A view backed by the process-wide manager
    pub fn global(alt: impl Into<String>) -> Result<Self> {
        let manager = global::manager().ok_or(ImageCacheError::NotInitialized)?;
        Ok(Self::new(manager.clone(), alt))
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    /// Point the view at a new source.
    ///
    /// Resets to `Loading` and starts a load task unless the request is
    /// unchanged. An empty URL stays in `Loading` without touching the
    /// network. Outside a Tokio runtime nothing can be fetched, so the view
    /// settles as if the fetch had failed.
    pub fn set_source(&self, request: LoadRequest) {
        let generation = {
            let mut control = self.shared.control();
            if !control.mounted || control.request.as_ref() == Some(&request) {
                return;
            }
            control.generation += 1;
            control.request = Some(request.clone());
            self.shared.state.send_replace(DisplayState::Loading);
            control.generation
        };

        if request.url.is_empty() {
            debug!(generation, "Empty image source, waiting for a URL");
            return;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(url = %request.url, error = %e, "No async runtime to load image");
                self.shared.apply(generation, failed_outcome(&request));
                return;
            }
        };

        let manager = self.manager.clone();
        let shared = self.shared.clone();
        runtime.spawn(async move {
            let outcome = match manager.load(&request.url).await {
                Ok(data) => DisplayState::Loaded { data },
                Err(e) => {
                    warn!(url = %request.url, error = %e, "Failed to load image");
                    failed_outcome(&request)
                }
            };
            shared.apply(generation, outcome);
        });
    }

    /// The renderer could not display `error.src`.
    ///
    /// A failing primary image moves to the fallback when one exists; a
    /// failing fallback moves to the placeholder. Reports for a source that
    /// is no longer displayed are ignored.
    pub fn report_render_error(&self, error: RenderError) {
        let control = self.shared.control();
        if !control.mounted {
            return;
        }

        let current = self.shared.state.borrow().clone();
        if current.src() != Some(error.src.as_str()) {
            debug!(error = %error, "Ignoring render error for a source no longer shown");
            return;
        }

        let fallback = control.request.as_ref().and_then(|r| r.fallback());
        let next = match (&current, fallback) {
            (DisplayState::Loaded { .. }, Some(url)) => DisplayState::FallbackLoaded {
                url: url.to_string(),
            },
            (DisplayState::Loaded { .. }, None) | (DisplayState::FallbackLoaded { .. }, _) => {
                DisplayState::PlaceholderShown
            }
            _ => return,
        };

        warn!(error = %error, "Image failed to render");
        self.shared.state.send_replace(next);
    }

    /// Detach the view; loads still in flight are ignored when they finish
    pub fn unmount(&self) {
        self.shared.control().mounted = false;
    }

    pub fn state(&self) -> DisplayState {
        self.shared.state.borrow().clone()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.shared.state.subscribe()
    }

    /// Wait until the view leaves `Loading`.
    ///
    /// Never resolves while the source URL is empty.
    pub async fn settled(&self) -> DisplayState {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(DisplayState::is_settled).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// Number of load results dropped because they were stale
    pub fn discarded_results(&self) -> u64 {
        self.shared.discarded.load(Ordering::Relaxed)
    }

    pub fn request(&self) -> Option<LoadRequest> {
        self.shared.control().request.clone()
    }

    pub fn render(&self) -> Rendered {
        let presentation = self.presentation.clone();
        match self.state() {
            DisplayState::Loading => Rendered::Skeleton { presentation },
            DisplayState::Loaded { data: src } | DisplayState::FallbackLoaded { url: src } => {
                Rendered::Image {
                    src,
                    alt: self.alt.clone(),
                    presentation,
                }
            }
            DisplayState::PlaceholderShown => Rendered::Placeholder {
                src: codec::placeholder_data_uri(),
                presentation,
            },
        }
    }
}

/// Where a view settles when its source cannot be loaded
fn failed_outcome(request: &LoadRequest) -> DisplayState {
    match request.fallback() {
        Some(url) => DisplayState::FallbackLoaded {
            url: url.to_string(),
        },
        None => DisplayState::PlaceholderShown,
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        self.unmount();
    }
}
