//! Content windowing and keyword filtering
//!
//! Turns a document's full text into a bounded payload: optionally reduced
//! to the sections around keyword matches, then offset and capped. All
//! lengths and offsets count chars, not bytes.
//!
//! Sectioning falls back in three steps: blank-line paragraphs, then
//! sentences for one long unbroken paragraph (transcripts), then
//! overlapping fixed-width windows when sentences are still too long.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Default per-document content cap
pub const DEFAULT_MAX_LENGTH: usize = 50_000;

/// Returned when keyword filtering matched no section
pub const NO_MATCH_SENTINEL: &str = "[No content found matching the specified keywords]";

/// Joins selected chunks
pub const CHUNK_SEPARATOR: &str = "\n\n--- \n\n";

/// Budget charged per chunk for the separator
const SEPARATOR_COST: usize = 4;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("static regex"));
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s+").expect("static regex"));

/// Heuristic thresholds for sectioning and budget allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLimits {
    /// A lone paragraph longer than this is re-split into sentences
    pub single_paragraph_max: usize,
    /// Any sentence longer than this switches to fixed windows
    pub sentence_max: usize,
    pub window_width: usize,
    pub window_stride: usize,
    /// Sections taken on each side of a match
    pub context_radius: usize,
    /// Most chunks emitted per document
    pub max_chunks: usize,
    /// Smallest chunk worth emitting
    pub min_chunk: usize,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            single_paragraph_max: 2000,
            sentence_max: 1500,
            window_width: 800,
            window_stride: 700,
            context_radius: 2,
            max_chunks: 10,
            min_chunk: 200,
        }
    }
}

/// Per-request content shaping options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentOptions {
    pub max_length: usize,
    pub start_offset: usize,
    pub filter_keywords: Vec<String>,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            start_offset: 0,
            filter_keywords: Vec::new(),
        }
    }
}

/// Diagnostics reported when keywords were supplied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDebug {
    pub keyword_count: usize,
    pub original_length: usize,
    /// Blank-line paragraph count, whichever sectioning ran
    pub paragraph_count: usize,
    pub keyword_filtering_applied: bool,
    pub final_length: usize,
}

/// Bounded content plus a description of what was cut
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub content: String,
    pub truncated: bool,
    /// Char length of the input before any processing
    pub total_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_sections: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<ContentDebug>,
}

/// Shape `content` with the default limits
pub fn process(content: &str, options: &ContentOptions) -> ExtractionResult {
    process_with_limits(content, options, &WindowLimits::default())
}

/// Shape `content` according to `options` and `limits`
pub fn process_with_limits(
    content: &str,
    options: &ContentOptions,
    limits: &WindowLimits,
) -> ExtractionResult {
    let total_length = char_len(content);
    if content.trim().is_empty() {
        return ExtractionResult {
            content: String::new(),
            truncated: false,
            total_length,
            extracted_sections: None,
            debug: None,
        };
    }

    let keywords: Vec<String> = options
        .filter_keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| k.to_lowercase())
        .collect();

    let mut truncated = false;
    let mut extracted_sections = None;
    let mut filtering_applied = false;
    let mut no_match = false;
    let mut processed = content.to_string();

    if !keywords.is_empty() {
        let sections = split_sections(content, limits);
        let chunks = matching_chunks(&sections, &keywords, limits);

        if chunks.is_empty() {
            no_match = true;
            processed = NO_MATCH_SENTINEL.to_string();
        } else {
            let (selected, cut) = allocate_budget(&chunks, options.max_length, limits);
            truncated |= cut;
            processed = selected.join(CHUNK_SEPARATOR);
            filtering_applied = true;
            extracted_sections = Some(chunks);
        }
    }

    // The sentinel is returned verbatim
    if !no_match {
        let len = char_len(&processed);
        if options.start_offset > 0 && options.start_offset < len {
            processed = skip_chars(&processed, options.start_offset).to_string();
            truncated = true;
        }

        if !filtering_applied && char_len(&processed) > options.max_length {
            processed = take_chars(&processed, options.max_length).to_string();
            truncated = true;
        }
    }

    let debug = (!options.filter_keywords.is_empty()).then(|| ContentDebug {
        keyword_count: options.filter_keywords.len(),
        original_length: total_length,
        paragraph_count: PARAGRAPH_BREAK.split(content).count(),
        keyword_filtering_applied: filtering_applied,
        final_length: char_len(&processed),
    });

    debug!(
        total_length,
        final_length = char_len(&processed),
        truncated,
        filtering_applied,
        "Processed content"
    );

    ExtractionResult {
        content: processed,
        truncated,
        total_length,
        extracted_sections,
        debug,
    }
}

/// Paragraphs, else sentences, else overlapping windows
fn split_sections(content: &str, limits: &WindowLimits) -> Vec<String> {
    let paragraphs: Vec<String> = PARAGRAPH_BREAK.split(content).map(String::from).collect();
    if paragraphs.len() != 1 || char_len(&paragraphs[0]) <= limits.single_paragraph_max {
        return paragraphs;
    }

    let sentences: Vec<String> = SENTENCE_BREAK
        .split(content)
        .map(|s| format!("{}.", s.trim()))
        .collect();
    if sentences.iter().all(|s| char_len(s) <= limits.sentence_max) {
        return sentences;
    }

    sliding_windows(content, limits.window_width, limits.window_stride)
}

fn sliding_windows(content: &str, width: usize, stride: usize) -> Vec<String> {
    let bounds: Vec<usize> = content
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(content.len()))
        .collect();
    let len = bounds.len() - 1;

    (0..len)
        .step_by(stride.max(1))
        .filter_map(|start| {
            let end = (start + width).min(len);
            let window = content[bounds[start]..bounds[end]].trim();
            (!window.is_empty()).then(|| window.to_string())
        })
        .collect()
}

/// Context chunks around every matching section, in document order
fn matching_chunks(
    sections: &[String],
    keywords: &[String],
    limits: &WindowLimits,
) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();

    for (i, section) in sections.iter().enumerate() {
        let lower = section.to_lowercase();
        if !keywords.iter().any(|k| lower.contains(k.as_str())) {
            continue;
        }

        let start = i.saturating_sub(limits.context_radius);
        let end = (i + limits.context_radius + 1).min(sections.len());
        let candidate = sections[start..end].join(". ").trim().to_string();

        let duplicate = chunks
            .iter()
            .any(|accepted| accepted.contains(&candidate) || candidate.contains(accepted.as_str()));
        if !duplicate {
            chunks.push(candidate);
        }
    }

    chunks
}

/// Spread `budget` over the chunks; the flag reports whether anything was cut
fn allocate_budget(
    chunks: &[String],
    budget: usize,
    limits: &WindowLimits,
) -> (Vec<String>, bool) {
    let max_chunks = limits.max_chunks.max(1);
    let nominal = budget / chunks.len().min(max_chunks);

    let mut selected = Vec::new();
    let mut used = 0usize;
    let mut cut = false;

    for chunk in chunks {
        if used >= budget || selected.len() >= max_chunks {
            break;
        }
        let remaining = budget - used;
        let allotted = limits.min_chunk.max(nominal.min(remaining));
        let len = char_len(chunk);

        if len <= allotted {
            selected.push(chunk.clone());
            used += len + SEPARATOR_COST;
        } else if remaining >= limits.min_chunk {
            let keep = allotted.saturating_sub(3);
            selected.push(format!("{}...", take_chars(chunk, keep)));
            used += allotted + SEPARATOR_COST;
            cut = true;
        } else {
            break;
        }
    }

    // Chunks left behind for lack of budget (not the chunk cap)
    if selected.len() < chunks.len() && selected.len() < max_chunks {
        cut = true;
    }

    (selected, cut)
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn skip_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[i..],
        None => "",
    }
}
