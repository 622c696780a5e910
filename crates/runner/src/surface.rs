//! Navigable surfaces: the thing a [`crate::page::PageController`] drives
//!
//! A surface loads one document at a time. Every load is tagged with the
//! navigation number the controller hands in, and completion is announced
//! on a broadcast channel so each navigation can listen for its own load
//! event only.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// Load completion announced by a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadEvent {
    /// Navigation number passed to [`Surface::begin_load`]
    pub navigation: u64,
    /// `Err` carries the reason a document could not be loaded
    pub outcome: Result<(), String>,
}

/// A navigable document surface
pub trait Surface: Send + Sync {
    /// Start loading `url`; completion is broadcast as a [`LoadEvent`]
    /// tagged with `navigation`
    fn begin_load(&self, url: Url, navigation: u64);

    /// Listen for load completions
    fn subscribe(&self) -> broadcast::Receiver<LoadEvent>;

    /// Markup of the current document
    fn document(&self) -> Option<Arc<str>>;

    /// Location of the current document
    fn location(&self) -> Option<Url>;

    /// Whether selectors may use shadow-piercing combinators
    fn supports_shadow_selectors(&self) -> bool {
        false
    }

    /// Release the surface; further loads are ignored
    fn close(&self);
}

#[derive(Default)]
struct SurfaceState {
    current_navigation: u64,
    document: Option<Arc<str>>,
    location: Option<Url>,
    loading: Option<JoinHandle<()>>,
    closed: bool,
}

/// Surface that loads documents over HTTP
///
/// Starting a new load aborts the previous one, and a load that completes
/// after being superseded is discarded. Must be used from within a tokio
/// runtime.
pub struct HttpSurface {
    client: reqwest::Client,
    state: Arc<Mutex<SurfaceState>>,
    loads: broadcast::Sender<LoadEvent>,
}

impl HttpSurface {
    pub fn new(client: reqwest::Client) -> Self {
        let (loads, _) = broadcast::channel(16);
        Self {
            client,
            state: Arc::new(Mutex::new(SurfaceState::default())),
            loads,
        }
    }
}

impl Surface for HttpSurface {
    fn begin_load(&self, url: Url, navigation: u64) {
        let mut state = self.state.lock();
        if state.closed {
            warn!("Ignoring load of {} on a closed surface", url);
            return;
        }
        if let Some(previous) = state.loading.take() {
            previous.abort();
        }
        state.current_navigation = navigation;

        let client = self.client.clone();
        let shared = Arc::clone(&self.state);
        let loads = self.loads.clone();
        state.loading = Some(tokio::spawn(async move {
            debug!("Loading {} (navigation {})", url, navigation);
            let loaded = async {
                let response = client.get(url.clone()).send().await?;
                let location = response.url().clone();
                let body = response.text().await?;
                Ok::<_, reqwest::Error>((location, body))
            }
            .await;

            let outcome = {
                let mut state = shared.lock();
                if state.closed || state.current_navigation != navigation {
                    debug!("Discarding superseded load of {}", url);
                    return;
                }
                state.loading = None;
                match loaded {
                    Ok((location, body)) => {
                        state.location = Some(location);
                        state.document = Some(Arc::from(body));
                        Ok(())
                    }
                    Err(e) => Err(e.to_string()),
                }
            };
            // Nobody listening is fine: the navigation may have been abandoned
            let _ = loads.send(LoadEvent { navigation, outcome });
        }));
    }

    fn subscribe(&self) -> broadcast::Receiver<LoadEvent> {
        self.loads.subscribe()
    }

    fn document(&self) -> Option<Arc<str>> {
        self.state.lock().document.clone()
    }

    fn location(&self) -> Option<Url> {
        self.state.lock().location.clone()
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if let Some(loading) = state.loading.take() {
            loading.abort();
        }
        state.closed = true;
        state.document = None;
        state.location = None;
    }
}
