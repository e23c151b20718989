//! Content acquisition strategies
//!
//! Design: each source knows which documents it can serve via `applies()`
//! and produces raw text via `fetch()`. ContentResolver tries applicable
//! sources in registration order and keeps the first non-empty text.

use super::extract::{filter_excessive_newlines, html_to_text, is_html};
use crate::error::{ContentError, ReaderError};
use crate::types::Document;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, warn};

/// Default rendering proxy: `GET {base}/{url}` answers with plain text
pub const DEFAULT_PROXY_BASE: &str = "https://r.jina.ai";

/// Returned when every attempted source failed
pub const CONTENT_UNAVAILABLE: &str = "[Content unavailable - conversion error]";

/// Categories converted by the rendering proxy rather than local extraction
pub fn uses_render_proxy(category: Option<&str>) -> bool {
    match category.map(str::trim) {
        None | Some("") => true,
        Some(c) => c.eq_ignore_ascii_case("article") || c.eq_ignore_ascii_case("pdf"),
    }
}

/// HTTP client for third-party content (never carries the API token)
pub fn content_http_client(
    user_agent: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, ReaderError> {
    let ua = user_agent.unwrap_or(DEFAULT_USER_AGENT);
    reqwest::Client::builder()
        .user_agent(ua)
        .timeout(timeout)
        .build()
        .map_err(ReaderError::ClientBuildError)
}

/// Trait for document content sources
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Returns true if this source can serve the document
    fn applies(&self, doc: &Document) -> bool;

    /// Produce raw text for the document
    ///
    /// Called only if `applies()` returned true.
    async fn fetch(&self, doc: &Document) -> Result<String, ContentError>;

    /// Whether a failure here marks the content unavailable
    ///
    /// Sources that only shortcut a later source return false; their
    /// failures just move on to the next source.
    fn failure_is_reported(&self) -> bool {
        true
    }
}

/// Rendering/conversion proxy client
#[derive(Debug, Clone)]
pub struct RenderProxy {
    http: reqwest::Client,
    base: String,
}

impl RenderProxy {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Convert `target` to plain text
    pub async fn convert(
        &self,
        target: &str,
        source_name: &'static str,
    ) -> Result<String, ContentError> {
        let url = format!("{}/{}", self.base, target);
        debug!(source = source_name, url = %url, "Requesting proxy conversion");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static("text/plain"))
            .send()
            .await
            .map_err(|e| request_error(source_name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                source_name,
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| request_error(source_name, e))?;
        Ok(filter_excessive_newlines(&text))
    }
}

/// Presigned direct-fetch URL (uploaded files), converted by the proxy
pub struct PresignedObjectSource {
    proxy: RenderProxy,
}

impl PresignedObjectSource {
    pub fn new(proxy: RenderProxy) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl ContentSource for PresignedObjectSource {
    fn name(&self) -> &'static str {
        "presigned_object"
    }

    fn applies(&self, doc: &Document) -> bool {
        non_blank(doc.raw_source_url.as_deref()).is_some()
    }

    async fn fetch(&self, doc: &Document) -> Result<String, ContentError> {
        let url = non_blank(doc.raw_source_url.as_deref())
            .ok_or(ContentError::MissingUrl(self.name()))?;
        self.proxy.convert(url, self.name()).await
    }

    fn failure_is_reported(&self) -> bool {
        false
    }
}

/// Proxy conversion of the document's live URL (articles, PDFs, uncategorized)
pub struct RenderProxySource {
    proxy: RenderProxy,
}

impl RenderProxySource {
    pub fn new(proxy: RenderProxy) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl ContentSource for RenderProxySource {
    fn name(&self) -> &'static str {
        "render_proxy"
    }

    fn applies(&self, doc: &Document) -> bool {
        uses_render_proxy(doc.category.as_deref()) && doc.conversion_url().is_some()
    }

    async fn fetch(&self, doc: &Document) -> Result<String, ContentError> {
        let url = doc.conversion_url().ok_or(ContentError::MissingUrl(self.name()))?;
        self.proxy.convert(url, self.name()).await
    }
}

/// HTML already stored on the document
///
/// Primary source for categories the proxy does not handle; fallback for
/// the rest when the proxy fails.
pub struct StoredHtmlSource;

#[async_trait]
impl ContentSource for StoredHtmlSource {
    fn name(&self) -> &'static str {
        "stored_html"
    }

    fn applies(&self, doc: &Document) -> bool {
        non_blank(doc.html_content.as_deref()).is_some()
    }

    async fn fetch(&self, doc: &Document) -> Result<String, ContentError> {
        let html = doc.html_content.as_deref().unwrap_or_default();
        Ok(html_to_text(html).await)
    }
}

/// Direct GET of the document URL, extracting text when the body is HTML
pub struct LiveHtmlSource {
    http: reqwest::Client,
}

impl LiveHtmlSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ContentSource for LiveHtmlSource {
    fn name(&self) -> &'static str {
        "live_html"
    }

    fn applies(&self, doc: &Document) -> bool {
        !uses_render_proxy(doc.category.as_deref())
            && non_blank(doc.html_content.as_deref()).is_none()
            && doc.conversion_url().is_some()
    }

    async fn fetch(&self, doc: &Document) -> Result<String, ContentError> {
        let url = doc.conversion_url().ok_or(ContentError::MissingUrl(self.name()))?;

        let response = self
            .http
            .get(url)
            .header(
                ACCEPT,
                HeaderValue::from_static("text/html,application/xhtml+xml"),
            )
            .send()
            .await
            .map_err(|e| request_error(self.name(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                source_name: self.name(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response
            .text()
            .await
            .map_err(|e| request_error(self.name(), e))?;

        if is_html(&content_type, &body) {
            Ok(html_to_text(&body).await)
        } else {
            Ok(body)
        }
    }
}

/// Ordered content sources with fallback
pub struct ContentResolver {
    sources: Vec<Box<dyn ContentSource>>,
}

impl Default for ContentResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Create a resolver with the standard sources
    ///
    /// Order: presigned object, render proxy, stored HTML, live HTML.
    pub fn with_defaults(http: reqwest::Client, proxy_base: &str) -> Self {
        let proxy = RenderProxy::new(http.clone(), proxy_base);
        let mut resolver = Self::new();
        resolver.register(Box::new(PresignedObjectSource::new(proxy.clone())));
        resolver.register(Box::new(RenderProxySource::new(proxy)));
        resolver.register(Box::new(StoredHtmlSource));
        resolver.register(Box::new(LiveHtmlSource::new(http)));
        resolver
    }

    /// Register a source; sources are tried in registration order
    pub fn register(&mut self, source: Box<dyn ContentSource>) {
        self.sources.push(source);
    }

    /// Raw text for `doc`
    ///
    /// Empty when no source applies. [`CONTENT_UNAVAILABLE`] when a source
    /// that reports failures failed and none produced text. Never an error.
    pub async fn resolve(&self, doc: &Document) -> String {
        let mut failed = false;

        for source in &self.sources {
            if !source.applies(doc) {
                continue;
            }
            debug!(source = source.name(), doc = %doc.id, "Trying content source");

            match source.fetch(doc).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => {
                    debug!(
                        source = source.name(),
                        doc = %doc.id,
                        "Content source returned no text"
                    );
                }
                Err(e) => {
                    warn!(
                        source = source.name(),
                        doc = %doc.id,
                        error = %e,
                        "Content source failed"
                    );
                    failed |= source.failure_is_reported();
                }
            }
        }

        if failed {
            CONTENT_UNAVAILABLE.to_string()
        } else {
            String::new()
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn request_error(source_name: &'static str, err: reqwest::Error) -> ContentError {
    ContentError::Request {
        source_name,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        result: Result<&'static str, ()>,
        calls: Arc<AtomicUsize>,
        reported: bool,
    }

    #[async_trait]
    impl ContentSource for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn applies(&self, _doc: &Document) -> bool {
            true
        }

        async fn fetch(&self, _doc: &Document) -> Result<String, ContentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .map(String::from)
                .map_err(|_| ContentError::Status {
                    source_name: self.name,
                    status: 500,
                })
        }

        fn failure_is_reported(&self) -> bool {
            self.reported
        }
    }

    fn scripted(
        name: &'static str,
        result: Result<&'static str, ()>,
    ) -> (Box<dyn ContentSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Scripted {
                name,
                result,
                calls: calls.clone(),
                reported: true,
            }),
            calls,
        )
    }

    #[test]
    fn test_uses_render_proxy() {
        assert!(uses_render_proxy(None));
        assert!(uses_render_proxy(Some("")));
        assert!(uses_render_proxy(Some("article")));
        assert!(uses_render_proxy(Some("pdf")));
        assert!(!uses_render_proxy(Some("tweet")));
        assert!(!uses_render_proxy(Some("email")));
    }

    #[test]
    fn test_default_source_applicability() {
        let http = reqwest::Client::new();
        let proxy = RenderProxy::new(http.clone(), DEFAULT_PROXY_BASE);
        let presigned = PresignedObjectSource::new(proxy.clone());
        let render = RenderProxySource::new(proxy);
        let live = LiveHtmlSource::new(http);

        let article = Document {
            url: "https://example.com/a".to_string(),
            category: Some("article".to_string()),
            html_content: Some("<p>x</p>".to_string()),
            ..Default::default()
        };
        assert!(!presigned.applies(&article));
        assert!(render.applies(&article));
        assert!(StoredHtmlSource.applies(&article));
        assert!(!live.applies(&article));

        let tweet = Document {
            url: "https://example.com/t".to_string(),
            category: Some("tweet".to_string()),
            raw_source_url: Some("http://127.0.0.1:9/obj?sig=1".to_string()),
            ..Default::default()
        };
        assert!(presigned.applies(&tweet));
        assert!(!render.applies(&tweet));
        assert!(!StoredHtmlSource.applies(&tweet));
        assert!(live.applies(&tweet));

        let bare = Document::default();
        assert!(!render.applies(&bare));
        assert!(!live.applies(&bare));
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let (failing, failing_calls) = scripted("failing", Err(()));
        let (empty, _) = scripted("empty", Ok("   "));
        let (good, good_calls) = scripted("good", Ok("text"));
        let (unused, unused_calls) = scripted("unused", Ok("other"));

        let mut resolver = ContentResolver::new();
        resolver.register(failing);
        resolver.register(empty);
        resolver.register(good);
        resolver.register(unused);

        assert_eq!(resolver.resolve(&Document::default()).await, "text");
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(good_calls.load(Ordering::SeqCst), 1);
        assert_eq!(unused_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failed_yields_sentinel() {
        let (a, _) = scripted("a", Err(()));
        let (b, _) = scripted("b", Ok(""));
        let mut resolver = ContentResolver::new();
        resolver.register(a);
        resolver.register(b);

        assert_eq!(resolver.resolve(&Document::default()).await, CONTENT_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unreported_failure_yields_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut resolver = ContentResolver::new();
        resolver.register(Box::new(Scripted {
            name: "shortcut",
            result: Err(()),
            calls: calls.clone(),
            reported: false,
        }));

        assert_eq!(resolver.resolve(&Document::default()).await, "");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_presigned_without_urls_yields_empty() {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let resolver = ContentResolver::with_defaults(http, "http://127.0.0.1:9");
        let doc = Document {
            id: "upload".to_string(),
            raw_source_url: Some("http://127.0.0.1:9/obj?sig=1".to_string()),
            category: Some("pdf".to_string()),
            ..Default::default()
        };

        assert_eq!(resolver.resolve(&doc).await, "");
    }

    #[tokio::test]
    async fn test_nothing_applicable_yields_empty() {
        let resolver = ContentResolver::with_defaults(reqwest::Client::new(), DEFAULT_PROXY_BASE);
        assert_eq!(resolver.resolve(&Document::default()).await, "");
    }

    #[tokio::test]
    async fn test_stored_html_source() {
        let doc = Document {
            category: Some("email".to_string()),
            html_content: Some(
                "<html><head><title>Hi</title></head><body><p>Body here</p></body></html>"
                    .to_string(),
            ),
            ..Default::default()
        };
        assert_eq!(StoredHtmlSource.fetch(&doc).await.unwrap(), "Hi\n\nBody here");
    }
}
