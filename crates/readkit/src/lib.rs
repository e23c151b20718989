//! ReadKit - AI-friendly Readwise and Reader tools
//!
//! This crate exposes the Readwise (v2) and Reader (v3) APIs as a set of
//! LLM tools, and turns fetched documents into bounded, keyword-focused,
//! offset-addressable plain text.
//!
//! ## Content Pipeline
//!
//! Document content comes from a pluggable set of sources. The
//! [`ContentResolver`] tries each applicable [`ContentSource`] in order and
//! keeps the first one that produces text:
//! - [`PresignedObjectSource`] - presigned file URL via the rendering proxy
//! - [`RenderProxySource`] - article/PDF URL via the rendering proxy
//! - [`StoredHtmlSource`] - HTML returned by the API
//! - [`LiveHtmlSource`] - direct fetch of the document URL
//!
//! The text is then windowed by [`content::process`]: keyword sections with
//! surrounding context, a per-document budget, and a start offset for paging.

pub mod client;
pub mod content;
mod error;
pub mod listing;
pub mod search;
mod tool;
mod types;

pub use client::{ReaderClient, ReaderConfig, DEFAULT_API_BASE};
pub use content::{
    ContentOptions, ContentResolver, ContentSource, ExtractionResult, LiveHtmlSource,
    PresignedObjectSource, RenderProxySource, StoredHtmlSource, WindowLimits,
    CONTENT_UNAVAILABLE, DEFAULT_PROXY_BASE, NO_MATCH_SENTINEL,
};
pub use error::{ContentError, DictionaryError, ReaderError};
pub use listing::{ListingLimits, ListingResult};
pub use tool::{
    BookHighlightsArgs, DeleteDocumentArgs, NoArgs, TopicSearchArgs, Tool, ToolBuilder,
    ToolDefinition, ToolOutput, UpdateDocumentArgs,
};
pub use types::*;

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "Everruns ReadKit/1.0";

/// Short description of the tool set for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Reads and writes a Readwise / Readwise Reader library.

- Save, list, update and delete Reader documents
- List tags, highlights and books; create and export highlights
- Topic and highlight search with simple relevance scoring
- Optional LLM-ready document content with paging and keyword focus"#;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# ReadKit Tools

Tools for a Readwise / Readwise Reader library. Every call goes to the
Readwise API; nothing is cached.

## Documents
- `readwise_save_document`: save a URL (optionally with HTML, tags, location, category)
- `readwise_list_documents`: list documents with filters
- `readwise_update_document`: change title, author, summary, dates, image, location or category
- `readwise_delete_document`: delete by ID
- `readwise_list_tags`: every tag
- `readwise_topic_search`: match terms against documents and highlights

## Highlights and books
- `readwise_list_highlights`, `readwise_create_highlight`, `readwise_export_highlights`
- `readwise_get_daily_review`
- `readwise_list_books`, `readwise_get_book_highlights`
- `readwise_search_highlights`: text query plus field queries
  (document_title, document_author, highlight_text, highlight_note, highlight_tags)

## Document content
Set `withFullContent: true` on `readwise_list_documents` to receive converted
text. Content is expensive: without `limit` only the first 5 documents get
content.

- `contentMaxLength` (default 50000): characters per document
- `contentStartOffset`: continue where a truncated document stopped; the
  `contentNote` field gives the next offset
- `contentFilterKeywords`: keep only sections (with two sections of context
  on each side) that mention a keyword

## Client-side filters
- `addedAfter`: documents saved after this date. Without `pageCursor` or
  `limit` every page is fetched first; with them only the requested page is
  filtered.
- `limit`: applied after the API responds

## Messages
Responses may end with a `Messages:` block of `INFO`, `WARNING` or `ERROR`
lines describing client-side filtering, truncation or capping.

## Errors
- Rate limits: "Rate limit exceeded. Too many requests. Please retry after N seconds."
- Other API failures include the HTTP status and response body

## Examples

### Recent documents with focused content
```json
{"addedAfter": "2024-05-01", "withFullContent": true, "contentFilterKeywords": ["ownership"]}
```

### Next chunk of a long document
```json
{"id": "01h...", "withFullContent": true, "contentMaxLength": 20000, "contentStartOffset": 20000}
```
"#;
