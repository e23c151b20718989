//! Document listing with client-side filtering and content enrichment
//!
//! The upstream `/list/` endpoint knows nothing about `addedAfter`, result
//! limits or converted content. This module fills those gaps: it sweeps or
//! fetches a page, filters by save date, caps how many documents get full
//! content, and runs the content pipeline concurrently per document.

use crate::client::ReaderClient;
use crate::content::window::{char_len, process_with_limits, DEFAULT_MAX_LENGTH};
use crate::content::{ContentDebug, ContentOptions, ContentResolver, WindowLimits};
use crate::error::ReaderError;
use crate::types::{ApiMessage, Document, ListDocumentsParams};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

const ADDED_AFTER_SWEEP_NOTE: &str = "Documents were filtered client-side based on the addedAfter date. All documents were fetched from the API first, then filtered by their saved_at date.";

const ADDED_AFTER_PAGE_NOTE: &str = "Documents were filtered client-side based on the addedAfter date, but only within the requested page because a pageCursor or limit was supplied. Documents on other pages were not checked.";

/// Thresholds for full-content listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLimits {
    /// Documents enriched with content when no `limit` is given
    pub default_full_content_limit: usize,
    /// Above this many matches the cap is reported as an error
    pub full_content_error_threshold: usize,
    pub window: WindowLimits,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            default_full_content_limit: 5,
            full_content_error_threshold: 20,
            window: WindowLimits::default(),
        }
    }
}

/// Processing metadata attached to an enriched document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub content_truncated: bool,
    pub content_total_length: usize,
    pub content_extracted_sections: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_debug: Option<ContentDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_keywords_used: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_filter_note: Option<String>,
}

/// Listed document plus optional converted content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub metadata: Option<ContentMetadata>,
}

/// Outcome of a listing call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResult {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_cursor: Option<String>,
    pub documents: Vec<DocumentView>,
    #[serde(skip)]
    pub messages: Vec<ApiMessage>,
}

/// List documents, applying client-side filters and optional enrichment
pub async fn list_documents(
    client: &ReaderClient,
    resolver: &ContentResolver,
    params: &ListDocumentsParams,
    limits: &ListingLimits,
) -> Result<ListingResult, ReaderError> {
    let mut params = params.clone();
    if params.wants_full_content() {
        params.with_html_content = Some(true);
        params.with_raw_source_url = Some(true);
    }

    let cutoff = params
        .added_after
        .as_deref()
        .map(parse_cutoff)
        .transpose()?;

    let mut messages = Vec::new();
    let (mut documents, mut count, next_page_cursor) = match cutoff {
        Some(cutoff) if params.page_cursor.is_none() && params.effective_limit().is_none() => {
            let all = sweep(client, &params).await?;
            let filtered = filter_saved_after(all, cutoff);
            messages.push(ApiMessage::info(ADDED_AFTER_SWEEP_NOTE));
            let count = filtered.len() as u64;
            (filtered, count, None)
        }
        Some(cutoff) => {
            let page = client.list_documents(&params).await?;
            let filtered = filter_saved_after(page.results, cutoff);
            messages.push(ApiMessage::warning(ADDED_AFTER_PAGE_NOTE));
            let count = filtered.len() as u64;
            (filtered, count, page.next_page_cursor)
        }
        None => {
            let page = client.list_documents(&params).await?;
            (page.results, page.count, page.next_page_cursor)
        }
    };

    let mut capped = false;
    if params.wants_full_content() {
        let cap = params
            .effective_limit()
            .unwrap_or(limits.default_full_content_limit);
        if count > cap as u64 {
            messages.insert(0, full_content_cap_message(count, cap, limits));
            documents.truncate(cap);
            count = documents.len() as u64;
            capped = true;
        }
    }
    if let Some(limit) = params.effective_limit() {
        if !capped && documents.len() > limit {
            documents.truncate(limit);
            count = documents.len() as u64;
        }
        messages.push(ApiMessage::info(format!(
            "Document limit of {} was applied client-side after API response.",
            limit
        )));
    }

    let keywords = params.keywords();
    if !keywords.is_empty() {
        messages.push(ApiMessage::info(format!(
            "Content was filtered for keywords: {}. Check individual documents for contentFilterNote if no matches found.",
            keywords.join(", ")
        )));
    }

    let documents = if params.wants_full_content() {
        let options = content_options(&params);
        join_all(
            documents
                .into_iter()
                .map(|doc| enrich(resolver, doc, &params, &options, &limits.window)),
        )
        .await
    } else {
        documents
            .into_iter()
            .map(|doc| plain_view(doc, params.wants_html_content()))
            .collect()
    };

    Ok(ListingResult {
        count,
        next_page_cursor,
        documents,
        messages,
    })
}

/// Human-readable (content) or compact JSON (metadata only) rendering
pub fn render_listing(result: &ListingResult, params: &ListDocumentsParams) -> String {
    let compact = params.wants_full_content()
        && (params.content_max_length.is_some() || !params.keywords().is_empty());
    if compact {
        render_compact(result)
    } else {
        render_summary_json(result)
    }
}

fn render_compact(result: &ListingResult) -> String {
    let mut out = format!("Found {} document(s).\n\n", result.count);

    for (i, view) in result.documents.iter().enumerate() {
        let doc = &view.document;
        out.push_str(&format!("Document {}:\n", i + 1));
        out.push_str(&format!("Title: {}\n", text_or(doc.title.as_deref(), "Untitled")));
        out.push_str(&format!("Author: {}\n", text_or(doc.author.as_deref(), "Unknown")));
        out.push_str(&format!("Category: {}\n", text_or(doc.category.as_deref(), "Unknown")));
        out.push_str(&format!("URL: {}\n", doc.url));

        if let Some(content) = view.content.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(&format!(
                "\nContent ({} characters):\n{}\n",
                char_len(content),
                content
            ));
        }
        if let Some(meta) = &view.metadata {
            if meta.content_truncated {
                out.push_str(&format!(
                    "\n[Content was truncated. Original length: {} chars]\n",
                    meta.content_total_length
                ));
            }
            if let Some(note) = &meta.content_filter_note {
                out.push_str(&format!("\n[{}]\n", note));
            }
        }

        out.push('\n');
        out.push_str(&"=".repeat(50));
        out.push_str("\n\n");
    }

    if let Some(cursor) = &result.next_page_cursor {
        out.push_str(&format!("Next page cursor: {}\n", cursor));
    }
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryListing<'a> {
    count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_cursor: Option<&'a str>,
    documents: Vec<SummaryDocument<'a>>,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    id: &'a str,
    title: Option<&'a str>,
    author: Option<&'a str>,
    category: Option<&'a str>,
    url: &'a str,
    summary: Option<&'a str>,
    reading_progress: Option<f64>,
}

fn render_summary_json(result: &ListingResult) -> String {
    let summary = SummaryListing {
        count: result.count,
        next_page_cursor: result.next_page_cursor.as_deref(),
        documents: result
            .documents
            .iter()
            .map(|view| {
                let doc = &view.document;
                SummaryDocument {
                    id: &doc.id,
                    title: doc.title.as_deref(),
                    author: doc.author.as_deref(),
                    category: doc.category.as_deref(),
                    url: &doc.url,
                    summary: doc.summary.as_deref(),
                    reading_progress: doc.reading_progress,
                }
            })
            .collect(),
    };
    serde_json::to_string_pretty(&summary).unwrap_or_default()
}

/// Parse an `addedAfter` value: RFC 3339, naive date-time (UTC) or date
pub fn parse_cutoff(value: &str) -> Result<DateTime<Utc>, ReaderError> {
    parse_timestamp(value).ok_or_else(|| {
        ReaderError::InvalidArgument(format!("addedAfter is not a valid ISO 8601 date: {}", value))
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Documents saved strictly after `cutoff`; missing or bad `saved_at` excluded
fn filter_saved_after(documents: Vec<Document>, cutoff: DateTime<Utc>) -> Vec<Document> {
    documents
        .into_iter()
        .filter(|doc| {
            doc.saved_at
                .as_deref()
                .and_then(parse_timestamp)
                .is_some_and(|saved| saved > cutoff)
        })
        .collect()
}

/// Every page for `params`, following `nextPageCursor`
async fn sweep(
    client: &ReaderClient,
    params: &ListDocumentsParams,
) -> Result<Vec<Document>, ReaderError> {
    let mut params = params.clone();
    params.page_cursor = None;
    let mut documents = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = client.list_documents(&params).await?;
        pages += 1;
        documents.extend(page.results);
        match page.next_page_cursor {
            Some(next) if !next.is_empty() => params.page_cursor = Some(next),
            _ => break,
        }
    }

    info!(pages, documents = documents.len(), "Swept all document pages");
    Ok(documents)
}

fn full_content_cap_message(total: u64, cap: usize, limits: &ListingLimits) -> ApiMessage {
    if total <= limits.full_content_error_threshold as u64 {
        ApiMessage::info(format!(
            "Found {} documents, but only returning the first {} due to full content request. \
             To get the remaining {} documents with full content, you can fetch them individually by their IDs using the update/read document API.",
            total,
            cap,
            total - cap as u64
        ))
    } else {
        ApiMessage::error(format!(
            "Found {} documents, but only returning the first {} due to full content request. \
             Getting full content for more than {} documents is not supported due to performance limitations.",
            total, cap, limits.full_content_error_threshold
        ))
    }
}

fn content_options(params: &ListDocumentsParams) -> ContentOptions {
    ContentOptions {
        max_length: params.content_max_length.unwrap_or(DEFAULT_MAX_LENGTH),
        start_offset: params.content_start_offset.unwrap_or(0),
        filter_keywords: params.keywords().to_vec(),
    }
}

fn plain_view(mut doc: Document, keep_html: bool) -> DocumentView {
    if !keep_html {
        doc.html_content = None;
    }
    DocumentView {
        document: doc,
        content: None,
        metadata: None,
    }
}

async fn enrich(
    resolver: &ContentResolver,
    doc: Document,
    params: &ListDocumentsParams,
    options: &ContentOptions,
    window: &WindowLimits,
) -> DocumentView {
    let raw = resolver.resolve(&doc).await;
    if raw.is_empty() {
        debug!(doc = %doc.id, "No content available");
        return DocumentView {
            content: Some(String::new()),
            ..plain_view(doc, true)
        };
    }

    let result = process_with_limits(&raw, options, window);
    let mut metadata = ContentMetadata {
        content_truncated: result.truncated,
        content_total_length: result.total_length,
        content_extracted_sections: result.extracted_sections.as_ref().map_or(0, Vec::len),
        content_debug: result.debug,
        ..Default::default()
    };

    if result.truncated {
        metadata.content_note = Some(format!(
            "Content truncated. Original length: {} chars. To get more content, use contentStartOffset={}",
            result.total_length,
            options.start_offset + options.max_length
        ));
    }

    if !options.filter_keywords.is_empty() {
        metadata.content_keywords_used = params.content_filter_keywords.clone();
        if result.extracted_sections.as_ref().map_or(true, Vec::is_empty) {
            metadata.content_filter_note = Some(format!(
                "No content sections found containing the keywords: {}",
                options.filter_keywords.join(", ")
            ));
        }
    }

    DocumentView {
        document: doc,
        content: Some(result.content),
        metadata: Some(metadata),
    }
}

fn text_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}
