//! Tool builder and contract for ReadKit

use crate::client::{ReaderClient, ReaderConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT};
use crate::content::sources::content_http_client;
use crate::content::{ContentResolver, DEFAULT_PROXY_BASE};
use crate::error::ReaderError;
use crate::listing::{list_documents, render_listing, ListingLimits};
use crate::search::{search_documents_and_highlights, search_highlights};
use crate::types::{
    ApiMessage, CreateDocumentRequest, CreateHighlightRequest, ExportHighlightsParams,
    ListBooksParams, ListDocumentsParams, ListHighlightsParams, SearchHighlightsParams,
    UpdateDocumentRequest,
};
use crate::{TOOL_DESCRIPTION, TOOL_LLMTXT};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

pub const SAVE_DOCUMENT: &str = "readwise_save_document";
pub const LIST_DOCUMENTS: &str = "readwise_list_documents";
pub const UPDATE_DOCUMENT: &str = "readwise_update_document";
pub const DELETE_DOCUMENT: &str = "readwise_delete_document";
pub const LIST_TAGS: &str = "readwise_list_tags";
pub const TOPIC_SEARCH: &str = "readwise_topic_search";
pub const LIST_HIGHLIGHTS: &str = "readwise_list_highlights";
pub const CREATE_HIGHLIGHT: &str = "readwise_create_highlight";
pub const EXPORT_HIGHLIGHTS: &str = "readwise_export_highlights";
pub const GET_DAILY_REVIEW: &str = "readwise_get_daily_review";
pub const LIST_BOOKS: &str = "readwise_list_books";
pub const GET_BOOK_HIGHLIGHTS: &str = "readwise_get_book_highlights";
pub const SEARCH_HIGHLIGHTS: &str = "readwise_search_highlights";

/// Arguments for [`UPDATE_DOCUMENT`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateDocumentArgs {
    /// Document ID to update
    pub id: String,
    #[serde(flatten)]
    pub update: UpdateDocumentRequest,
}

/// Arguments for [`DELETE_DOCUMENT`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeleteDocumentArgs {
    /// Document ID to delete
    pub id: String,
}

/// Arguments for [`TOPIC_SEARCH`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopicSearchArgs {
    /// List of search terms to match against document content (case-insensitive)
    pub search_terms: Vec<String>,
}

/// Arguments for [`GET_BOOK_HIGHLIGHTS`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookHighlightsArgs {
    /// The ID of the book to get highlights from
    pub book_id: u64,
}

/// Tools that take no arguments
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// Published tool metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Text payload plus advisory messages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ApiMessage>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            messages: Vec::new(),
        }
    }

    /// Text with a trailing `Messages:` block when there are any
    pub fn render(&self) -> String {
        if self.messages.is_empty() {
            return self.text.clone();
        }
        let lines: Vec<String> = self.messages.iter().map(ToString::to_string).collect();
        format!("{}\n\nMessages:\n{}", self.text, lines.join("\n"))
    }
}

struct ToolSpec {
    name: &'static str,
    description: &'static str,
    schema: fn() -> Value,
}

fn schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_default()
}

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: SAVE_DOCUMENT,
        description: "Save a document (URL or HTML content) to Readwise Reader",
        schema: schema::<CreateDocumentRequest>,
    },
    ToolSpec {
        name: LIST_DOCUMENTS,
        description: "List documents from Readwise Reader with optional filtering, client-side date filtering and optional LLM-ready content (paged with contentStartOffset/contentMaxLength, focused with contentFilterKeywords)",
        schema: schema::<ListDocumentsParams>,
    },
    ToolSpec {
        name: UPDATE_DOCUMENT,
        description: "Update a document in Readwise Reader",
        schema: schema::<UpdateDocumentArgs>,
    },
    ToolSpec {
        name: DELETE_DOCUMENT,
        description: "Delete a document from Readwise Reader",
        schema: schema::<DeleteDocumentArgs>,
    },
    ToolSpec {
        name: LIST_TAGS,
        description: "List all tags from Readwise Reader",
        schema: schema::<NoArgs>,
    },
    ToolSpec {
        name: TOPIC_SEARCH,
        description: "Search documents and highlights by topic: case-insensitive matching on document title, summary, notes and tags, plus scored highlight search",
        schema: schema::<TopicSearchArgs>,
    },
    ToolSpec {
        name: LIST_HIGHLIGHTS,
        description: "List highlights from Readwise with optional filtering by book, date, or other criteria",
        schema: schema::<ListHighlightsParams>,
    },
    ToolSpec {
        name: CREATE_HIGHLIGHT,
        description: "Create new highlights manually in Readwise",
        schema: schema::<CreateHighlightRequest>,
    },
    ToolSpec {
        name: EXPORT_HIGHLIGHTS,
        description: "Export highlights from Readwise with optional filtering, one page at a time. Useful for bulk analysis or backup.",
        schema: schema::<ExportHighlightsParams>,
    },
    ToolSpec {
        name: GET_DAILY_REVIEW,
        description: "Get your daily review highlights for spaced repetition learning",
        schema: schema::<NoArgs>,
    },
    ToolSpec {
        name: LIST_BOOKS,
        description: "List books that have highlights in Readwise with optional filtering",
        schema: schema::<ListBooksParams>,
    },
    ToolSpec {
        name: GET_BOOK_HIGHLIGHTS,
        description: "Get all highlights from a specific book",
        schema: schema::<BookHighlightsArgs>,
    },
    ToolSpec {
        name: SEARCH_HIGHLIGHTS,
        description: "Search across all highlights using a text query and field-specific filters, ranked by a weighted match score",
        schema: schema::<SearchHighlightsParams>,
    },
];

/// Builder for configuring the ReadKit tools
#[derive(Debug, Clone)]
pub struct ToolBuilder {
    token: Option<String>,
    api_base: String,
    proxy_base: String,
    user_agent: Option<String>,
    timeout: Duration,
    limits: ListingLimits,
}

impl Default for ToolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolBuilder {
    pub fn new() -> Self {
        Self {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
            limits: ListingLimits::default(),
        }
    }

    /// Set the Readwise access token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the API root (`/v2` and `/v3` are appended)
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Override the rendering proxy base URL
    pub fn proxy_base(mut self, base: impl Into<String>) -> Self {
        self.proxy_base = base.into();
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Per-request timeout for API and content fetches
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Listing and windowing thresholds
    pub fn limits(mut self, limits: ListingLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Build the tool; fails without a token
    pub fn build(self) -> Result<Tool, ReaderError> {
        let config = ReaderConfig {
            token: self.token.unwrap_or_default(),
            api_base: self.api_base,
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
        };
        let client = ReaderClient::new(config)?;
        let http = content_http_client(self.user_agent.as_deref(), self.timeout)?;
        let resolver = ContentResolver::with_defaults(http, &self.proxy_base);

        Ok(Tool {
            client,
            resolver,
            limits: self.limits,
        })
    }
}

/// Configured ReadKit tool set
pub struct Tool {
    client: ReaderClient,
    resolver: ContentResolver,
    limits: ListingLimits,
}

impl Tool {
    /// Create a new tool builder
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    /// Get tool description
    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Upstream API client
    pub fn client(&self) -> &ReaderClient {
        &self.client
    }

    /// Names of every tool, in publication order
    pub fn names() -> impl Iterator<Item = &'static str> {
        TOOLS.iter().map(|t| t.name)
    }

    /// Name, description and input schema of every tool
    pub fn definitions() -> Vec<ToolDefinition> {
        TOOLS
            .iter()
            .map(|spec| ToolDefinition {
                name: spec.name.to_string(),
                description: spec.description.to_string(),
                input_schema: (spec.schema)(),
            })
            .collect()
    }

    /// Run tool `name` with JSON `args`
    pub async fn call(&self, name: &str, args: Value) -> Result<ToolOutput, ReaderError> {
        info!(tool = name, "Tool call");
        match name {
            SAVE_DOCUMENT => self.save_document(parse_args(args)?).await,
            LIST_DOCUMENTS => self.list_documents(parse_args(args)?).await,
            UPDATE_DOCUMENT => self.update_document(parse_args(args)?).await,
            DELETE_DOCUMENT => self.delete_document(parse_args(args)?).await,
            LIST_TAGS => self.list_tags().await,
            TOPIC_SEARCH => self.topic_search(parse_args(args)?).await,
            LIST_HIGHLIGHTS => self.list_highlights(parse_args(args)?).await,
            CREATE_HIGHLIGHT => self.create_highlight(parse_args(args)?).await,
            EXPORT_HIGHLIGHTS => self.export_highlights(parse_args(args)?).await,
            GET_DAILY_REVIEW => self.daily_review().await,
            LIST_BOOKS => self.list_books(parse_args(args)?).await,
            GET_BOOK_HIGHLIGHTS => self.book_highlights(parse_args(args)?).await,
            SEARCH_HIGHLIGHTS => self.search_highlights(parse_args(args)?).await,
            other => Err(ReaderError::UnknownTool(other.to_string())),
        }
    }

    async fn save_document(&self, req: CreateDocumentRequest) -> Result<ToolOutput, ReaderError> {
        require(&req.url, "url")?;
        let doc = self.client.create_document(&req).await?;
        let location = doc
            .location
            .clone()
            .or_else(|| req.location.map(|l| l.to_string()))
            .unwrap_or_else(|| "new".to_string());
        Ok(ToolOutput::text(format!(
            "Document saved successfully!\nID: {}\nTitle: {}\nURL: {}\nLocation: {}",
            doc.id,
            doc.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("Untitled"),
            doc.url,
            location
        )))
    }

    async fn list_documents(&self, params: ListDocumentsParams) -> Result<ToolOutput, ReaderError> {
        let result = list_documents(&self.client, &self.resolver, &params, &self.limits).await?;
        Ok(ToolOutput {
            text: render_listing(&result, &params),
            messages: result.messages,
        })
    }

    async fn update_document(&self, args: UpdateDocumentArgs) -> Result<ToolOutput, ReaderError> {
        require(&args.id, "id")?;
        let doc = self.client.update_document(&args.id, &args.update).await?;
        let id = if doc.id.is_empty() { args.id } else { doc.id };
        Ok(ToolOutput::text(format!(
            "Document updated successfully!\nID: {}\nReader URL: {}",
            id, doc.url
        )))
    }

    async fn delete_document(&self, args: DeleteDocumentArgs) -> Result<ToolOutput, ReaderError> {
        require(&args.id, "id")?;
        self.client.delete_document(&args.id).await?;
        Ok(ToolOutput::text(format!(
            "Document {} deleted successfully!",
            args.id
        )))
    }

    async fn list_tags(&self) -> Result<ToolOutput, ReaderError> {
        let tags = self.client.list_tags().await?;
        Ok(ToolOutput::text(pretty(&tags)))
    }

    async fn topic_search(&self, args: TopicSearchArgs) -> Result<ToolOutput, ReaderError> {
        if args.search_terms.iter().all(|t| t.trim().is_empty()) {
            return Err(ReaderError::InvalidArgument(
                "searchTerms must contain at least one term".to_string(),
            ));
        }
        let results = search_documents_and_highlights(&self.client, &args.search_terms).await?;
        let minimal = json!({
            "documents": results.documents.iter().map(|d| json!({
                "id": d.id,
                "title": d.title,
                "author": d.author,
                "url": d.url,
            })).collect::<Vec<_>>(),
            "highlights": results.highlights.iter().map(|hit| json!({
                "text": hit.highlight.text,
                "book": hit.book.title,
                "author": hit.book.author,
            })).collect::<Vec<_>>(),
            "books": results.books.iter().map(|b| json!({
                "id": b.book_id(),
                "title": b.title,
                "author": b.author,
                "num_highlights": b.num_highlights,
            })).collect::<Vec<_>>(),
        });
        Ok(ToolOutput::text(pretty(&minimal)))
    }

    async fn list_highlights(
        &self,
        params: ListHighlightsParams,
    ) -> Result<ToolOutput, ReaderError> {
        let page = self.client.list_highlights(&params).await?;
        let minimal = json!({
            "count": page.count,
            "results": page.results.iter().map(|h| with_note(json!({
                "id": h.id,
                "text": h.text,
                "book_id": h.book_id,
            }), h.note_text())).collect::<Vec<_>>(),
        });
        Ok(ToolOutput::text(pretty(&minimal)))
    }

    async fn create_highlight(
        &self,
        req: CreateHighlightRequest,
    ) -> Result<ToolOutput, ReaderError> {
        if req.highlights.is_empty() {
            return Err(ReaderError::InvalidArgument(
                "highlights must contain at least one highlight".to_string(),
            ));
        }
        for highlight in &req.highlights {
            require(&highlight.text, "highlights[].text")?;
        }
        let created = self.client.create_highlight(&req).await?;
        Ok(ToolOutput::text(pretty(&created)))
    }

    async fn export_highlights(
        &self,
        params: ExportHighlightsParams,
    ) -> Result<ToolOutput, ReaderError> {
        let page = self.client.export_highlights(&params).await?;
        Ok(ToolOutput::text(pretty(&page)))
    }

    async fn daily_review(&self) -> Result<ToolOutput, ReaderError> {
        let review = self.client.daily_review().await?;
        let minimal = json!({
            "review_id": review.review_id,
            "review_url": review.review_url,
            "highlights": review.highlights.iter().map(|h| with_note(json!({
                "text": h.text,
                "title": h.title,
                "author": h.author,
            }), h.note.as_deref())).collect::<Vec<_>>(),
        });
        Ok(ToolOutput::text(pretty(&minimal)))
    }

    async fn list_books(&self, params: ListBooksParams) -> Result<ToolOutput, ReaderError> {
        let page = self.client.list_books(&params).await?;
        let minimal = json!({
            "count": page.count,
            "results": page.results.iter().map(|b| json!({
                "id": b.book_id(),
                "title": b.title,
                "author": b.author,
                "category": b.category,
                "num_highlights": b.num_highlights,
            })).collect::<Vec<_>>(),
        });
        Ok(ToolOutput::text(pretty(&minimal)))
    }

    async fn book_highlights(&self, args: BookHighlightsArgs) -> Result<ToolOutput, ReaderError> {
        let highlights = self.client.book_highlights(args.book_id).await?;
        let minimal: Vec<Value> = highlights
            .iter()
            .map(|h| with_note(json!({"id": h.id, "text": h.text}), h.note_text()))
            .collect();
        Ok(ToolOutput::text(pretty(&minimal)))
    }

    async fn search_highlights(
        &self,
        params: SearchHighlightsParams,
    ) -> Result<ToolOutput, ReaderError> {
        let results = search_highlights(&self.client, &params).await?;
        let minimal: Vec<Value> = results
            .iter()
            .map(|hit| {
                let mut value = with_note(
                    json!({"text": hit.highlight.text}),
                    hit.highlight.note_text(),
                );
                if let Value::Object(map) = &mut value {
                    map.insert("book".to_string(), json!(hit.book.title));
                    map.insert("author".to_string(), json!(hit.book.author));
                    map.insert("score".to_string(), json!(hit.score));
                }
                value
            })
            .collect();
        Ok(ToolOutput::text(pretty(&minimal)))
    }
}

/// Deserialize tool arguments; `null` counts as an empty object
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ReaderError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ReaderError::InvalidArgument(e.to_string()))
}

fn require(value: &str, field: &str) -> Result<(), ReaderError> {
    if value.trim().is_empty() {
        Err(ReaderError::InvalidArgument(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

fn with_note(mut value: Value, note: Option<&str>) -> Value {
    if let (Value::Object(map), Some(note)) = (&mut value, note.filter(|n| !n.is_empty())) {
        map.insert("note".to_string(), Value::String(note.to_string()));
    }
    value
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_cover_every_tool() {
        let defs = Tool::definitions();
        assert_eq!(defs.len(), 13);
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, Tool::names().collect::<Vec<_>>());
        assert!(names.iter().all(|n| n.starts_with("readwise_")));
        for def in &defs {
            assert!(def.input_schema.is_object(), "{} has no schema", def.name);
        }
    }

    #[test]
    fn test_list_documents_schema_is_camel_case() {
        let def = Tool::definitions()
            .into_iter()
            .find(|d| d.name == LIST_DOCUMENTS)
            .unwrap();
        let props = def.input_schema["properties"].as_object().unwrap();
        assert!(props.contains_key("addedAfter"));
        assert!(props.contains_key("contentFilterKeywords"));
        assert!(!props.contains_key("withRawSourceUrl"));
    }

    #[test]
    fn test_update_schema_includes_flattened_fields() {
        let def = Tool::definitions()
            .into_iter()
            .find(|d| d.name == UPDATE_DOCUMENT)
            .unwrap();
        let props = def.input_schema["properties"].as_object().unwrap();
        assert!(props.contains_key("id"));
        assert!(props.contains_key("title"));
    }

    #[test]
    fn test_render_messages() {
        let output = ToolOutput {
            text: "body".to_string(),
            messages: vec![ApiMessage::info("one"), ApiMessage::warning("two")],
        };
        assert_eq!(output.render(), "body\n\nMessages:\nINFO: one\nWARNING: two");
        assert_eq!(ToolOutput::text("plain").render(), "plain");
    }

    #[test]
    fn test_parse_args() {
        let args: DeleteDocumentArgs = parse_args(json!({"id": "abc"})).unwrap();
        assert_eq!(args.id, "abc");
        let none: NoArgs = parse_args(Value::Null).unwrap();
        let _ = none;
        let bad: Result<BookHighlightsArgs, _> = parse_args(json!({"bookId": "x"}));
        assert!(matches!(bad, Err(ReaderError::InvalidArgument(_))));
    }

    #[test]
    fn test_with_note() {
        assert_eq!(with_note(json!({"id": 1}), Some("n")), json!({"id": 1, "note": "n"}));
        assert_eq!(with_note(json!({"id": 1}), Some("")), json!({"id": 1}));
        assert_eq!(with_note(json!({"id": 1}), None), json!({"id": 1}));
    }

    #[test]
    fn test_build_requires_token() {
        assert!(matches!(
            ToolBuilder::new().build(),
            Err(ReaderError::MissingToken)
        ));
        assert!(ToolBuilder::new().token("tok").build().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let tool = ToolBuilder::new().token("tok").build().unwrap();
        let err = tool.call("readwise_nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ReaderError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn test_argument_validation() {
        let tool = ToolBuilder::new()
            .token("tok")
            .api_base("http://127.0.0.1:9")
            .build()
            .unwrap();
        let err = tool
            .call(SAVE_DOCUMENT, json!({"url": "  "}))
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::InvalidArgument(_)));

        let err = tool
            .call(TOPIC_SEARCH, json!({"searchTerms": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::InvalidArgument(_)));
    }
}
