//! Core types for ReadKit
//!
//! Upstream payloads deserialize leniently: almost every field is optional
//! because the Reader (v3) and Readwise (v2) APIs omit or null fields freely.
//! Tool argument records derive [`JsonSchema`] so the tool surface can publish
//! input schemas.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Reader document location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    New,
    Later,
    Shortlist,
    Archive,
    Feed,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::New => "new",
            Location::Later => "later",
            Location::Shortlist => "shortlist",
            Location::Archive => "archive",
            Location::Feed => "feed",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reader document category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Article,
    Book,
    Tweet,
    Pdf,
    Email,
    Youtube,
    Podcast,
    Video,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Article => "article",
            DocumentCategory::Book => "book",
            DocumentCategory::Tweet => "tweet",
            DocumentCategory::Pdf => "pdf",
            DocumentCategory::Email => "email",
            DocumentCategory::Youtube => "youtube",
            DocumentCategory::Podcast => "podcast",
            DocumentCategory::Video => "video",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readwise (v2) book category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookCategory {
    Books,
    Articles,
    Tweets,
    Supplementals,
    Podcasts,
}

impl BookCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookCategory::Books => "books",
            BookCategory::Articles => "articles",
            BookCategory::Tweets => "tweets",
            BookCategory::Supplementals => "supplementals",
            BookCategory::Podcasts => "podcasts",
        }
    }
}

/// How a highlight location is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Page,
    Order,
    TimeOffset,
}

/// A saved Reader document
///
/// `category` and `location` stay as strings so values added upstream
/// later still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Time-limited presigned URL for direct content access
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// String or epoch number depending on the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Either a list of names or an object keyed by tag key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_opened_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_moved_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
}

impl Document {
    /// URL to hand to converters: `source_url` first, then `url`
    pub fn conversion_url(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| Some(self.url.as_str()).filter(|u| !u.trim().is_empty()))
    }

    /// Tag names regardless of which shape upstream used
    pub fn tag_names(&self) -> Vec<String> {
        match &self.tags {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(o) => o.get("name").and_then(Value::as_str).map(String::from),
                    _ => None,
                })
                .collect(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, v)| {
                    v.get("name")
                        .and_then(Value::as_str)
                        .map(String::from)
                        .unwrap_or_else(|| key.clone())
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Save a document (URL or HTML) to Reader
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateDocumentRequest {
    /// URL of the document to save
    pub url: String,
    /// HTML content of the document (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Tags to add to the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Location to save the document (default: new)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Category of the document (auto-detected if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DocumentCategory>,
}

/// Fields that can be changed on an existing document
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateDocumentRequest {
    /// New title for the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New author for the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// New summary for the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// New published date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// New image URL for the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// New location for the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// New category for the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DocumentCategory>,
}

/// Document listing parameters
///
/// Only some of these reach the API; `addedAfter`, `limit`, `withFullContent`
/// and the `content*` options are handled client-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsParams {
    /// Filter by specific document ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Filter documents updated after this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_after: Option<String>,
    /// Filter documents added after this date (ISO 8601). Fetches all documents
    /// first and filters client-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_after: Option<String>,
    /// Filter by document location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Filter by document category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DocumentCategory>,
    /// Filter by tag name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Page cursor for pagination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_cursor: Option<String>,
    /// PERFORMANCE WARNING: include raw HTML content. Only use when raw HTML is explicitly needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_html_content: Option<bool>,
    /// Request presigned direct-fetch URLs for uploaded files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub with_raw_source_url: Option<bool>,
    /// PERFORMANCE WARNING: include full converted text content for each document. Default: false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_full_content: Option<bool>,
    /// Maximum content length per document in characters. Default: 50000.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_max_length: Option<usize>,
    /// Character offset to start content from, for paging through large documents. Default: 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_start_offset: Option<usize>,
    /// Keep only content sections containing any of these keywords (case-insensitive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_filter_keywords: Option<Vec<String>>,
    /// Maximum number of documents to return (applied client-side)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ListDocumentsParams {
    pub fn wants_full_content(&self) -> bool {
        self.with_full_content.unwrap_or(false)
    }

    pub fn wants_html_content(&self) -> bool {
        self.with_html_content.unwrap_or(false)
    }

    /// Keyword filters as supplied
    pub fn keywords(&self) -> &[String] {
        self.content_filter_keywords.as_deref().unwrap_or_default()
    }

    /// Positive client-side limit, if any
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|l| *l > 0)
    }

    /// Parameters understood by the upstream `/list/` endpoint
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "id", self.id.as_ref());
        push_opt(&mut pairs, "updatedAfter", self.updated_after.as_ref());
        push_opt(&mut pairs, "location", self.location.map(|l| l.as_str()));
        push_opt(&mut pairs, "category", self.category.map(|c| c.as_str()));
        push_opt(&mut pairs, "tag", self.tag.as_ref());
        push_opt(&mut pairs, "pageCursor", self.page_cursor.as_ref());
        push_opt(&mut pairs, "withHtmlContent", self.with_html_content);
        push_opt(&mut pairs, "withRawSourceUrl", self.with_raw_source_url);
        pairs
    }
}

fn push_opt<T: ToString>(
    pairs: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: Option<T>,
) {
    if let Some(v) = value {
        pairs.push((key, v.to_string()));
    }
}

/// One page of `/list/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentPage {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_cursor: Option<String>,
    pub results: Vec<Document>,
}

/// Reader tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub key: String,
    pub name: String,
}

/// One page of `/tags/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagPage {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_cursor: Option<String>,
    pub results: Vec<Tag>,
}

/// Severity of an advisory message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

impl MessageKind {
    pub fn label(&self) -> &'static str {
        match self {
            MessageKind::Info => "INFO",
            MessageKind::Warning => "WARNING",
            MessageKind::Error => "ERROR",
        }
    }
}

/// Advisory message appended to a tool response
///
/// Used for partial degradation that should not fail the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
}

impl ApiMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            content: content.into(),
        }
    }
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.content)
    }
}

/// Tag attached to a highlight or book (v2 API)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
}

/// Readwise highlight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Highlight {
    pub id: u64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<u64>,
    pub tags: Vec<HighlightTag>,
}

impl Highlight {
    /// Note with empty strings treated as absent
    pub fn note_text(&self) -> Option<&str> {
        self.note.as_deref().filter(|n| !n.is_empty())
    }
}

/// Readwise book (source work grouping highlights)
///
/// The export endpoint identifies books by `user_book_id` and embeds
/// `highlights`; `/books/` uses `id` and has no highlights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_book_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readable_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub book_tags: Vec<HighlightTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readwise_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_highlights: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_highlight_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
}

impl Book {
    /// Identifier regardless of which endpoint produced the record
    pub fn book_id(&self) -> Option<u64> {
        self.id.or(self.user_book_id)
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn author_text(&self) -> &str {
        self.author.as_deref().unwrap_or_default()
    }

    /// Copy without the embedded highlights
    pub fn summary_only(&self) -> Book {
        Book {
            highlights: Vec::new(),
            ..self.clone()
        }
    }
}

/// Page-numbered v2 listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Page<T> {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Highlight listing parameters (v2 names)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListHighlightsParams {
    /// Number of results per page (default: 100, max: 1000)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Page number for pagination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Filter highlights by specific book ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<u64>,
    /// Filter highlights updated before this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "updated__lt")]
    pub updated_lt: Option<String>,
    /// Filter highlights updated after this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "updated__gt")]
    pub updated_gt: Option<String>,
    /// Filter highlights made before this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "highlighted_at__lt")]
    pub highlighted_at_lt: Option<String>,
    /// Filter highlights made after this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "highlighted_at__gt")]
    pub highlighted_at_gt: Option<String>,
}

impl ListHighlightsParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "page_size", self.page_size);
        push_opt(&mut pairs, "page", self.page);
        push_opt(&mut pairs, "book_id", self.book_id);
        push_opt(&mut pairs, "updated__lt", self.updated_lt.as_ref());
        push_opt(&mut pairs, "updated__gt", self.updated_gt.as_ref());
        push_opt(&mut pairs, "highlighted_at__lt", self.highlighted_at_lt.as_ref());
        push_opt(&mut pairs, "highlighted_at__gt", self.highlighted_at_gt.as_ref());
        pairs
    }
}

/// Highlight to create manually
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NewHighlight {
    /// The highlight text (required)
    pub text: String,
    /// Title of the source book/article
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author of the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Cover image of the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// URL of the original source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Unique identifier for your app/source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Category of the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<BookCategory>,
    /// Personal note or annotation for the highlight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Location in the source (page number, position, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<i64>,
    /// Type of location reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_type: Option<LocationType>,
    /// When the highlight was made (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted_at: Option<String>,
    /// Link to the highlight in its source app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_url: Option<String>,
}

/// Batch of highlights to create
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateHighlightRequest {
    /// Array of highlights to create
    pub highlights: Vec<NewHighlight>,
}

/// Export parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportHighlightsParams {
    /// Only export highlights updated after this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_after: Option<String>,
    /// Comma-separated list of book IDs to export highlights from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<String>,
    /// Include deleted highlights in export (default: false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_deleted: Option<bool>,
    /// Cursor for pagination through large exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_cursor: Option<String>,
}

impl ExportHighlightsParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "updatedAfter", self.updated_after.as_ref());
        push_opt(&mut pairs, "ids", self.ids.as_ref());
        push_opt(&mut pairs, "includeDeleted", self.include_deleted);
        push_opt(&mut pairs, "pageCursor", self.page_cursor.as_ref());
        pairs
    }
}

/// One page of `/export/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportPage {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_cursor: Option<String>,
    pub results: Vec<Book>,
}

/// Highlight as served by the daily review
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewHighlight {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Daily review (spaced repetition) batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyReview {
    pub review_id: u64,
    pub review_url: String,
    pub review_completed: bool,
    pub highlights: Vec<ReviewHighlight>,
}

/// Book listing parameters (v2 names)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListBooksParams {
    /// Number of results per page (default: 100, max: 1000)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Page number for pagination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Filter books by category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<BookCategory>,
    /// Filter books by source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Filter books updated before this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "updated__lt")]
    pub updated_lt: Option<String>,
    /// Filter books updated after this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "updated__gt")]
    pub updated_gt: Option<String>,
    /// Filter books with last highlight before this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "last_highlight_at__lt")]
    pub last_highlight_at_lt: Option<String>,
    /// Filter books with last highlight after this date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "last_highlight_at__gt")]
    pub last_highlight_at_gt: Option<String>,
}

impl ListBooksParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "page_size", self.page_size);
        push_opt(&mut pairs, "page", self.page);
        push_opt(&mut pairs, "category", self.category.map(|c| c.as_str()));
        push_opt(&mut pairs, "source", self.source.as_ref());
        push_opt(&mut pairs, "updated__lt", self.updated_lt.as_ref());
        push_opt(&mut pairs, "updated__gt", self.updated_gt.as_ref());
        push_opt(&mut pairs, "last_highlight_at__lt", self.last_highlight_at_lt.as_ref());
        push_opt(&mut pairs, "last_highlight_at__gt", self.last_highlight_at_gt.as_ref());
        pairs
    }
}

/// Field targeted by a field query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    DocumentTitle,
    DocumentAuthor,
    HighlightText,
    HighlightNote,
    HighlightTags,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::DocumentTitle => "document_title",
            SearchField::DocumentAuthor => "document_author",
            SearchField::HighlightText => "highlight_text",
            SearchField::HighlightNote => "highlight_note",
            SearchField::HighlightTags => "highlight_tags",
        }
    }
}

/// Search restricted to one field
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldQuery {
    /// Field to search in
    pub field: SearchField,
    /// Term to search for in the specified field
    pub search_term: String,
}

/// Highlight search parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHighlightsParams {
    /// Main text to search for across all highlight content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_query: Option<String>,
    /// Specific field searches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_queries: Option<Vec<FieldQuery>>,
    /// Filter results to specific book
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<u64>,
    /// Maximum number of results to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Scored highlight search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHighlightsResult {
    pub highlight: Highlight,
    pub book: Book,
    pub score: u32,
    pub matched_fields: Vec<String>,
}

/// Combined document + highlight topic search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicSearchResults {
    pub documents: Vec<Document>,
    pub highlights: Vec<SearchHighlightsResult>,
    pub books: Vec<Book>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_lenient_deserialize() {
        let doc: Document = serde_json::from_value(json!({
            "id": "01abc",
            "url": "https://read.readwise.io/read/01abc",
            "title": null,
            "word_count": null,
            "category": "rss",
            "tags": {"ai": {"name": "AI", "type": "manual"}},
            "published_date": 1700000000000u64
        }))
        .unwrap();

        assert_eq!(doc.id, "01abc");
        assert!(doc.title.is_none());
        assert_eq!(doc.category.as_deref(), Some("rss"));
        assert_eq!(doc.tag_names(), vec!["AI".to_string()]);
    }

    #[test]
    fn test_tag_names_from_list() {
        let doc = Document {
            tags: Some(json!(["rust", "async"])),
            ..Default::default()
        };
        assert_eq!(doc.tag_names(), vec!["rust", "async"]);
        assert!(Document::default().tag_names().is_empty());
    }

    #[test]
    fn test_conversion_url_prefers_source_url() {
        let doc = Document {
            url: "https://read.readwise.io/read/1".to_string(),
            source_url: Some("https://example.com/post".to_string()),
            ..Default::default()
        };
        assert_eq!(doc.conversion_url(), Some("https://example.com/post"));

        let doc = Document {
            url: "https://read.readwise.io/read/1".to_string(),
            source_url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(doc.conversion_url(), Some("https://read.readwise.io/read/1"));

        assert_eq!(Document::default().conversion_url(), None);
    }

    #[test]
    fn test_list_params_query_pairs_skip_client_side_fields() {
        let params = ListDocumentsParams {
            location: Some(Location::Later),
            page_cursor: Some("abc".to_string()),
            with_html_content: Some(true),
            added_after: Some("2024-01-01".to_string()),
            limit: Some(3),
            content_max_length: Some(100),
            ..Default::default()
        };
        let pairs = params.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("location", "later".to_string()),
                ("pageCursor", "abc".to_string()),
                ("withHtmlContent", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_params_camel_case_arguments() {
        let params: ListDocumentsParams = serde_json::from_value(json!({
            "addedAfter": "2024-05-01T00:00:00Z",
            "withFullContent": true,
            "contentFilterKeywords": ["rust"],
            "limit": 0
        }))
        .unwrap();
        assert!(params.wants_full_content());
        assert_eq!(params.keywords(), ["rust".to_string()]);
        assert_eq!(params.effective_limit(), None);
    }

    #[test]
    fn test_book_id_from_either_field() {
        let exported: Book = serde_json::from_value(json!({
            "user_book_id": 42,
            "title": "Dune",
            "highlights": [{"id": 1, "text": "Fear is the mind-killer."}]
        }))
        .unwrap();
        assert_eq!(exported.book_id(), Some(42));
        assert_eq!(exported.highlights.len(), 1);
        assert!(exported.summary_only().highlights.is_empty());
    }

    #[test]
    fn test_api_message_display() {
        assert_eq!(ApiMessage::info("done").to_string(), "INFO: done");
        assert_eq!(ApiMessage::error("bad").to_string(), "ERROR: bad");
        let value = serde_json::to_value(ApiMessage::warning("careful")).unwrap();
        assert_eq!(value, json!({"type": "warning", "content": "careful"}));
    }
}
