//! Page controller used by step definitions
//!
//! Combines two capabilities behind one object: driving a navigable
//! [`Surface`] (for DOM assertions) and issuing out-of-band HTTP requests
//! (for status codes and headers, which rendering does not expose). The
//! metadata of the most recent request is cached and tied to the current
//! page: every navigation drops it.
//!
//! Navigation and requests carry no timeout of their own. A load or request
//! that never completes blocks the calling step; only [`PageController::wait_for`]
//! gives up after a deadline.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use scraper::{Html, Selector};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, warn};
use url::Url;

use crate::error::{PageError, PageResult};
use crate::surface::{HttpSurface, Surface};

/// Polling cadence of [`PageController::wait_for`]
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default budget of [`PageController::wait_for`]
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Shadow-piercing tokens removed from selectors on surfaces without support
const SHADOW_COMBINATORS: [(&str, &str); 2] = [("::shadow", ""), ("/deep/", " ")];

/// Configuration for a page controller
#[derive(Debug, Clone, Default)]
pub struct PageConfig {
    /// Base that relative navigation and request targets are resolved against
    pub base_url: Option<Url>,
}

/// An element matched by a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedNode {
    /// Outer markup
    pub html: String,
    pub inner_html: String,
    pub text: String,
}

/// Elements matched by a selector, in document order
pub type MatchedNodes = Vec<MatchedNode>;

/// Status and headers of the last out-of-band request
#[derive(Debug, Clone)]
struct LastResponse {
    status: u16,
    headers: HeaderMap,
}

/// One navigable surface plus cached response metadata
pub struct PageController {
    surface: Option<Arc<dyn Surface>>,
    client: reqwest::Client,
    config: PageConfig,
    navigation: u64,
    last_response: Option<LastResponse>,
}

impl PageController {
    pub fn new(surface: Arc<dyn Surface>, client: reqwest::Client, config: PageConfig) -> Self {
        Self {
            surface: Some(surface),
            client,
            config,
            navigation: 0,
            last_response: None,
        }
    }

    /// Controller over an [`HttpSurface`] sharing one HTTP client
    pub fn http(config: PageConfig) -> Self {
        let client = reqwest::Client::new();
        let surface = Arc::new(HttpSurface::new(client.clone()));
        Self::new(surface, client, config)
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.config.base_url.as_ref()
    }

    /// Resolve `target` against the configured base unless it is absolute
    pub fn resolve(&self, target: &str) -> PageResult<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.config.base_url.as_ref().ok_or_else(|| PageError::InvalidUrl {
                    url: target.to_string(),
                    reason: "relative target without a configured base".to_string(),
                })?;
                base.join(target).map_err(|e| PageError::InvalidUrl {
                    url: target.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(PageError::InvalidUrl {
                url: target.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn surface(&self) -> PageResult<Arc<dyn Surface>> {
        self.surface.clone().ok_or(PageError::Disposed)
    }

    /// Load `target` and wait until that load has finished
    ///
    /// Each call listens for the load event of its own navigation number, so
    /// a late completion of an earlier, abandoned navigation never resolves
    /// a newer one.
    pub async fn navigate(&mut self, target: &str) -> PageResult<()> {
        let url = self.resolve(target)?;
        let surface = self.surface()?;

        self.navigation += 1;
        let navigation = self.navigation;
        self.last_response = None;

        let mut loads = surface.subscribe();
        surface.begin_load(url.clone(), navigation);
        debug!("Navigating to {} (navigation {})", url, navigation);

        loop {
            match loads.recv().await {
                Ok(event) if event.navigation == navigation => {
                    return event.outcome.map_err(|reason| PageError::Navigation {
                        url: url.to_string(),
                        reason,
                    });
                }
                Ok(event) => debug!("Ignoring load event of navigation {}", event.navigation),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} load events while navigating", skipped)
                }
                Err(RecvError::Closed) => return Err(PageError::Disposed),
            }
        }
    }

    /// Issue an HTTP request outside the surface and return the raw body
    ///
    /// `data` goes into the query string for GET and into a form body
    /// otherwise. Any completed response, whatever its status, resolves and
    /// becomes the cached metadata; only transport failures reject.
    pub async fn request(
        &mut self,
        target: &str,
        method: Method,
        data: &[(&str, &str)],
    ) -> PageResult<String> {
        let url = self.resolve(target)?;
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url);
        if !data.is_empty() {
            request = if method == Method::GET {
                request.query(data)
            } else {
                request.form(data)
            };
        }

        let response = request.send().await?;
        self.last_response = Some(LastResponse {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
        });
        Ok(response.text().await?)
    }

    /// Wait for at least one element matching `selector`
    ///
    /// Checks right away, then every [`POLL_INTERVAL`] until `timeout` has
    /// elapsed. The poll timer lives inside this future and is gone as soon
    /// as it resolves or rejects.
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> PageResult<MatchedNodes> {
        let selector = self.effective_selector(selector)?;
        let parsed = parse_selector(&selector)?;

        let started = Instant::now();
        let mut ticker = interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let surface = self.surface()?;
            if let Some(document) = surface.document() {
                let nodes = select(&document, &parsed);
                if !nodes.is_empty() {
                    return Ok(nodes);
                }
            }
            if started.elapsed() >= timeout {
                return Err(PageError::Timeout {
                    selector,
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        }
    }

    /// [`PageController::wait_for`] with the default five second budget
    pub async fn wait_for_default(&self, selector: &str) -> PageResult<MatchedNodes> {
        self.wait_for(selector, DEFAULT_WAIT_TIMEOUT).await
    }

    /// Elements currently matching `selector`, without waiting
    pub fn query(&self, selector: &str) -> PageResult<MatchedNodes> {
        let selector = self.effective_selector(selector)?;
        let parsed = parse_selector(&selector)?;
        let document = self.surface()?.document().ok_or(PageError::NoCurrentPage)?;
        Ok(select(&document, &parsed))
    }

    /// Status of the last request, fetching the current page first if needed
    pub async fn status_code(&mut self) -> PageResult<u16> {
        if self.last_response.is_none() {
            self.fetch_headers().await?;
        }
        self.last_response
            .as_ref()
            .map(|r| r.status)
            .ok_or(PageError::NoCurrentPage)
    }

    /// One header of the last request, fetching the current page first if needed
    pub async fn response_header(&mut self, name: &str) -> PageResult<Option<String>> {
        if self.last_response.is_none() {
            self.fetch_headers().await?;
        }
        let response = self.last_response.as_ref().ok_or(PageError::NoCurrentPage)?;
        Ok(response
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string))
    }

    async fn fetch_headers(&mut self) -> PageResult<()> {
        let location = self.location().ok_or(PageError::NoCurrentPage)?;
        self.request(location.as_str(), Method::GET, &[]).await?;
        Ok(())
    }

    pub fn document(&self) -> Option<Arc<str>> {
        self.surface.as_ref().and_then(|s| s.document())
    }

    pub fn location(&self) -> Option<Url> {
        self.surface.as_ref().and_then(|s| s.location())
    }

    pub fn is_disposed(&self) -> bool {
        self.surface.is_none()
    }

    /// Release the surface and forget all cached state; safe to repeat
    pub fn dispose(&mut self) {
        if let Some(surface) = self.surface.take() {
            debug!("Disposing page surface");
            surface.close();
        }
        self.last_response = None;
    }

    fn effective_selector(&self, selector: &str) -> PageResult<String> {
        let surface = self.surface()?;
        if surface.supports_shadow_selectors() {
            Ok(selector.to_string())
        } else {
            Ok(strip_shadow_combinators(selector))
        }
    }
}

impl Drop for PageController {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Remove shadow-piercing combinators for selector engines without them
pub fn strip_shadow_combinators(selector: &str) -> String {
    let mut stripped = selector.to_string();
    for (token, replacement) in SHADOW_COMBINATORS {
        stripped = stripped.replace(token, replacement);
    }
    stripped
}

fn parse_selector(selector: &str) -> PageResult<Selector> {
    Selector::parse(selector).map_err(|e| PageError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn select(document: &str, selector: &Selector) -> MatchedNodes {
    let html = Html::parse_document(document);
    html.select(selector)
        .map(|element| MatchedNode {
            html: element.html(),
            inner_html: element.inner_html(),
            text: element.text().collect(),
        })
        .collect()
}
