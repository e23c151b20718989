//! Topic and highlight search
//!
//! Both searches run client-side over full sweeps of the user's library;
//! the upstream API offers no search endpoint. Scoring is a fixed-weight
//! heuristic.

use crate::client::ReaderClient;
use crate::error::ReaderError;
use crate::types::{
    Book, Document, ExportHighlightsParams, Highlight, ListBooksParams, ListDocumentsParams,
    SearchField, SearchHighlightsParams, SearchHighlightsResult, TopicSearchResults,
};
use std::collections::HashSet;
use tracing::debug;

/// Highlight hits pulled into an enhanced topic search
const TOPIC_HIGHLIGHT_LIMIT: usize = 50;

/// Largest books page requested when resolving matched books
const TOPIC_BOOKS_PAGE_MAX: usize = 100;

/// All documents whose title, summary, notes or tags mention any term
pub async fn search_documents_by_topic(
    client: &ReaderClient,
    terms: &[String],
) -> Result<Vec<Document>, ReaderError> {
    let needles = lowercase_terms(terms);
    let mut params = ListDocumentsParams {
        with_html_content: Some(false),
        ..Default::default()
    };
    let mut matches = Vec::new();
    let mut scanned = 0usize;

    loop {
        let page = client.list_documents(&params).await?;
        scanned += page.results.len();
        matches.extend(
            page.results
                .into_iter()
                .filter(|doc| document_matches(doc, &needles)),
        );
        match page.next_page_cursor {
            Some(next) if !next.is_empty() => params.page_cursor = Some(next),
            _ => break,
        }
    }

    debug!(scanned, matched = matches.len(), "Topic search over documents");
    Ok(matches)
}

fn document_matches(doc: &Document, needles: &[String]) -> bool {
    if needles.is_empty() {
        return false;
    }
    let tags = doc.tag_names().join(" ");
    let haystack = [
        doc.title.as_deref().unwrap_or_default(),
        doc.summary.as_deref().unwrap_or_default(),
        doc.notes.as_deref().unwrap_or_default(),
        tags.as_str(),
    ]
    .join(" ")
    .to_lowercase();
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

/// Scored search across every exported highlight
pub async fn search_highlights(
    client: &ReaderClient,
    params: &SearchHighlightsParams,
) -> Result<Vec<SearchHighlightsResult>, ReaderError> {
    let books = client
        .export_all_highlights(&ExportHighlightsParams::default())
        .await?;
    Ok(score_highlights(&books, params))
}

/// Score highlights in `books` against `params`, best first
pub fn score_highlights(
    books: &[Book],
    params: &SearchHighlightsParams,
) -> Vec<SearchHighlightsResult> {
    let text_query = params
        .text_query
        .as_deref()
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);
    let field_queries: Vec<(SearchField, String)> = params
        .field_queries
        .iter()
        .flatten()
        .map(|fq| (fq.field, fq.search_term.to_lowercase()))
        .collect();

    let mut results = Vec::new();

    for book in books {
        if let Some(wanted) = params.book_id {
            if book.book_id() != Some(wanted) {
                continue;
            }
        }
        let title = book.title_text().to_lowercase();
        let author = book.author_text().to_lowercase();

        for highlight in &book.highlights {
            let text = highlight.text.to_lowercase();
            let note = highlight.note_text().map(str::to_lowercase);
            let mut hit = Hit::default();

            if let Some(query) = &text_query {
                hit.add(text.contains(query.as_str()), 10, SearchField::HighlightText);
                hit.add(contains_opt(&note, query), 8, SearchField::HighlightNote);
                hit.add(title.contains(query.as_str()), 6, SearchField::DocumentTitle);
                hit.add(author.contains(query.as_str()), 4, SearchField::DocumentAuthor);
            }

            for (field, term) in &field_queries {
                let (matched, weight) = match field {
                    SearchField::DocumentTitle => (title.contains(term.as_str()), 8),
                    SearchField::DocumentAuthor => (author.contains(term.as_str()), 8),
                    SearchField::HighlightText => (text.contains(term.as_str()), 10),
                    SearchField::HighlightNote => (contains_opt(&note, term), 8),
                    SearchField::HighlightTags => (tags_match(highlight, term), 6),
                };
                hit.add(matched, weight, *field);
            }

            if hit.score > 0 {
                results.push(SearchHighlightsResult {
                    highlight: highlight.clone(),
                    book: book.summary_only(),
                    score: hit.score,
                    matched_fields: hit.fields,
                });
            }
        }
    }

    // Stable: equal scores keep export order
    results.sort_by(|a, b| b.score.cmp(&a.score));
    if let Some(limit) = params.limit.filter(|l| *l > 0) {
        results.truncate(limit);
    }
    results
}

#[derive(Default)]
struct Hit {
    score: u32,
    fields: Vec<String>,
}

impl Hit {
    fn add(&mut self, matched: bool, weight: u32, field: SearchField) {
        if !matched {
            return;
        }
        self.score += weight;
        let name = field.as_str();
        if !self.fields.iter().any(|f| f == name) {
            self.fields.push(name.to_string());
        }
    }
}

fn contains_opt(haystack: &Option<String>, needle: &str) -> bool {
    haystack.as_deref().is_some_and(|h| h.contains(needle))
}

fn tags_match(highlight: &Highlight, term: &str) -> bool {
    highlight
        .tags
        .iter()
        .any(|t| t.name.to_lowercase().contains(term))
}

/// Documents, highlights and their books for a set of topic terms
pub async fn search_documents_and_highlights(
    client: &ReaderClient,
    terms: &[String],
) -> Result<TopicSearchResults, ReaderError> {
    let documents = search_documents_by_topic(client, terms).await?;

    let highlight_params = SearchHighlightsParams {
        text_query: Some(terms.join(" ")),
        limit: Some(TOPIC_HIGHLIGHT_LIMIT),
        ..Default::default()
    };
    let highlights = search_highlights(client, &highlight_params).await?;

    let mut seen = HashSet::new();
    let book_ids: Vec<u64> = highlights
        .iter()
        .filter_map(|hit| hit.book.book_id())
        .filter(|id| seen.insert(*id))
        .collect();

    let books = if book_ids.is_empty() {
        Vec::new()
    } else {
        let params = ListBooksParams {
            page_size: Some(book_ids.len().min(TOPIC_BOOKS_PAGE_MAX) as u32),
            ..Default::default()
        };
        client
            .list_books(&params)
            .await?
            .results
            .into_iter()
            .filter(|book| book.book_id().is_some_and(|id| book_ids.contains(&id)))
            .collect()
    };

    Ok(TopicSearchResults {
        documents,
        highlights,
        books,
    })
}

fn lowercase_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldQuery, HighlightTag};
    use serde_json::json;

    fn library() -> Vec<Book> {
        vec![
            Book {
                user_book_id: Some(1),
                title: Some("Deep Work".to_string()),
                author: Some("Cal Newport".to_string()),
                highlights: vec![
                    Highlight {
                        id: 10,
                        text: "Focus is a skill.".to_string(),
                        note: Some("focus matters".to_string()),
                        ..Default::default()
                    },
                    Highlight {
                        id: 11,
                        text: "Shallow work is easy.".to_string(),
                        tags: vec![HighlightTag {
                            id: None,
                            name: "Productivity".to_string(),
                        }],
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            Book {
                user_book_id: Some(2),
                title: Some("Focus Reader".to_string()),
                author: Some("Anon".to_string()),
                highlights: vec![Highlight {
                    id: 20,
                    text: "Unrelated text.".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_text_query_scoring() {
        let params = SearchHighlightsParams {
            text_query: Some("FOCUS".to_string()),
            ..Default::default()
        };
        let results = score_highlights(&library(), &params);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].highlight.id, 10);
        assert_eq!(results[0].score, 18);
        assert_eq!(results[0].matched_fields, vec!["highlight_text", "highlight_note"]);
        assert_eq!(results[1].highlight.id, 20);
        assert_eq!(results[1].score, 6);
        assert!(results[0].book.highlights.is_empty());
    }

    #[test]
    fn test_field_queries_and_dedup() {
        let params = SearchHighlightsParams {
            text_query: Some("deep".to_string()),
            field_queries: Some(vec![
                FieldQuery {
                    field: SearchField::DocumentTitle,
                    search_term: "deep".to_string(),
                },
                FieldQuery {
                    field: SearchField::HighlightTags,
                    search_term: "productiv".to_string(),
                },
            ]),
            ..Default::default()
        };
        let results = score_highlights(&library(), &params);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].highlight.id, 11);
        assert_eq!(results[0].score, 6 + 8 + 6);
        assert_eq!(results[0].matched_fields, vec!["document_title", "highlight_tags"]);
        assert_eq!(results[1].score, 14);
    }

    #[test]
    fn test_book_filter_and_limit() {
        let params = SearchHighlightsParams {
            text_query: Some("work".to_string()),
            book_id: Some(1),
            limit: Some(1),
            ..Default::default()
        };
        let results = score_highlights(&library(), &params);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].highlight.id, 11);
    }

    #[test]
    fn test_no_query_matches_nothing() {
        let results = score_highlights(&library(), &SearchHighlightsParams::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_document_matches() {
        let doc = Document {
            title: Some("Rust in Production".to_string()),
            notes: Some("".to_string()),
            tags: Some(json!({"async": {"name": "Async"}})),
            ..Default::default()
        };
        assert!(document_matches(&doc, &lowercase_terms(&["RUST".to_string()])));
        assert!(document_matches(&doc, &lowercase_terms(&["async".to_string()])));
        assert!(!document_matches(&doc, &lowercase_terms(&["python".to_string()])));
        assert!(!document_matches(&doc, &lowercase_terms(&["  ".to_string()])));
    }
}
