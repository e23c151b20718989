//! HTTP client for the Readwise and Reader APIs
//!
//! Every call is a single request against the upstream service. Rate limits
//! surface as [`ReaderError::RateLimited`]; nothing here retries.

use crate::error::ReaderError;
use crate::types::{
    Book, CreateDocumentRequest, CreateHighlightRequest, DailyReview, Document, DocumentPage,
    ExportHighlightsParams, ExportPage, Highlight, ListBooksParams, ListDocumentsParams,
    ListHighlightsParams, Page, Tag, TagPage, UpdateDocumentRequest,
};
use crate::DEFAULT_USER_AGENT;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default API root; v2 and v3 live underneath
pub const DEFAULT_API_BASE: &str = "https://readwise.io/api";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry delay assumed when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Page size used when pulling every highlight of one book
const BOOK_HIGHLIGHTS_PAGE_SIZE: u32 = 1000;

/// Upstream connection settings
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Readwise access token
    pub token: String,
    /// API root (without `/v2` or `/v3`)
    pub api_base: String,
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ReaderConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Readwise (v2) and Reader (v3) API client
#[derive(Debug, Clone)]
pub struct ReaderClient {
    http: reqwest::Client,
    api_base: String,
}

impl ReaderClient {
    /// Build a client; fails without a token
    pub fn new(config: ReaderConfig) -> Result<Self, ReaderError> {
        if config.token.trim().is_empty() {
            return Err(ReaderError::MissingToken);
        }

        let mut headers = HeaderMap::new();
        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Token {}", config.token.trim()))
            .map_err(|_| ReaderError::InvalidArgument("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(ReaderError::ClientBuildError)?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Check that the token is accepted (`204` from `/v2/auth/`)
    pub async fn validate_auth(&self) -> Result<(), ReaderError> {
        self.send(Method::GET, "/v2/auth/", &[], None::<&()>).await?;
        Ok(())
    }

    /// Save a URL or HTML document to Reader
    pub async fn create_document(
        &self,
        request: &CreateDocumentRequest,
    ) -> Result<Document, ReaderError> {
        self.json(Method::POST, "/v3/save/", &[], Some(request)).await
    }

    /// Fetch one page of `/list/`
    ///
    /// Only API-side filters are sent; see [`ListDocumentsParams::query_pairs`].
    pub async fn list_documents(
        &self,
        params: &ListDocumentsParams,
    ) -> Result<DocumentPage, ReaderError> {
        self.json(Method::GET, "/v3/list/", &params.query_pairs(), None::<&()>)
            .await
    }

    /// Patch document metadata
    pub async fn update_document(
        &self,
        id: &str,
        update: &UpdateDocumentRequest,
    ) -> Result<Document, ReaderError> {
        let path = format!("/v3/update/{}/", encode_segment(id));
        self.json(Method::PATCH, &path, &[], Some(update)).await
    }

    pub async fn delete_document(&self, id: &str) -> Result<(), ReaderError> {
        let path = format!("/v3/delete/{}/", encode_segment(id));
        self.send(Method::DELETE, &path, &[], None::<&()>).await?;
        Ok(())
    }

    /// All tags, following `nextPageCursor`
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ReaderError> {
        let mut tags = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let query: Vec<(&'static str, String)> = cursor
                .take()
                .map(|c| vec![("pageCursor", c)])
                .unwrap_or_default();
            let page: TagPage = self.json(Method::GET, "/v3/tags/", &query, None::<&()>).await?;
            tags.extend(page.results);
            match page.next_page_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(tags)
    }

    pub async fn list_highlights(
        &self,
        params: &ListHighlightsParams,
    ) -> Result<Page<Highlight>, ReaderError> {
        self.json(Method::GET, "/v2/highlights/", &params.query_pairs(), None::<&()>)
            .await
    }

    /// Create highlights; upstream answers with the affected books
    pub async fn create_highlight(
        &self,
        request: &CreateHighlightRequest,
    ) -> Result<Value, ReaderError> {
        self.json(Method::POST, "/v2/highlights/", &[], Some(request))
            .await
    }

    /// One page of `/export/`
    pub async fn export_highlights(
        &self,
        params: &ExportHighlightsParams,
    ) -> Result<ExportPage, ReaderError> {
        self.json(Method::GET, "/v2/export/", &params.query_pairs(), None::<&()>)
            .await
    }

    /// Every exported book, following `nextPageCursor`
    pub async fn export_all_highlights(
        &self,
        params: &ExportHighlightsParams,
    ) -> Result<Vec<Book>, ReaderError> {
        let mut params = params.clone();
        let mut books = Vec::new();
        loop {
            let page = self.export_highlights(&params).await?;
            books.extend(page.results);
            match page.next_page_cursor {
                Some(next) if !next.is_empty() => params.page_cursor = Some(next),
                _ => break,
            }
        }
        debug!(books = books.len(), "Export sweep complete");
        Ok(books)
    }

    pub async fn daily_review(&self) -> Result<DailyReview, ReaderError> {
        self.json(Method::GET, "/v2/review/", &[], None::<&()>).await
    }

    pub async fn list_books(&self, params: &ListBooksParams) -> Result<Page<Book>, ReaderError> {
        self.json(Method::GET, "/v2/books/", &params.query_pairs(), None::<&()>)
            .await
    }

    /// Highlights of one book (single large page)
    pub async fn book_highlights(&self, book_id: u64) -> Result<Vec<Highlight>, ReaderError> {
        let params = ListHighlightsParams {
            book_id: Some(book_id),
            page_size: Some(BOOK_HIGHLIGHTS_PAGE_SIZE),
            ..Default::default()
        };
        Ok(self.list_highlights(&params).await?.results)
    }

    async fn json<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<T, ReaderError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let text = self.send(method, path, query, body).await?;
        serde_json::from_str(&text).map_err(|e| ReaderError::DecodeError(e.to_string()))
    }

    /// Send a request and return the body of a successful response
    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<String, ReaderError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path, query)?;
        debug!(method = %method, url = %url, "Readwise API request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ReaderError::from_reqwest)?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers());
            return Err(ReaderError::RateLimited { retry_after });
        }

        let text = response.text().await.map_err(ReaderError::from_reqwest)?;

        if !status.is_success() {
            return Err(ReaderError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body: text,
            });
        }

        Ok(text)
    }

    fn endpoint(&self, path: &str, query: &[(&'static str, String)]) -> Result<Url, ReaderError> {
        let mut url = Url::parse(&format!("{}{}", self.api_base, path))
            .map_err(|e| ReaderError::InvalidArgument(format!("invalid API URL: {}", e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

/// Seconds from a `Retry-After` header, defaulting to 60
fn parse_retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// Percent-encode an id for use as a single path segment
fn encode_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token() {
        let result = ReaderClient::new(ReaderConfig::new("  "));
        assert!(matches!(result, Err(ReaderError::MissingToken)));
    }

    #[test]
    fn test_config_defaults() {
        let config = ReaderConfig::new("tok");
        assert_eq!(config.api_base, "https://readwise.io/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), Duration::from_secs(60));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Duration::from_secs(30));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), Duration::from_secs(60));
    }

    #[test]
    fn test_endpoint_query() {
        let mut config = ReaderConfig::new("tok");
        config.api_base = "http://localhost:9999/api/".to_string();
        let client = ReaderClient::new(config).unwrap();

        let url = client
            .endpoint(
                "/v3/list/",
                &[("location", "new".to_string()), ("pageCursor", "a b".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9999/api/v3/list/?location=new&pageCursor=a+b"
        );
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("01gq9"), "01gq9");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }
}
