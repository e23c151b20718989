//! Merged-word segmentation
//!
//! Text pulled out of poorly spaced markup often glues words together
//! ("whatyou"). A frequency-ranked dictionary and a minimum-cost split
//! (Zipf cost per word) recover the boundaries.
//!
//! The dictionary is process-wide and loaded at most once, on first use.
//! Concurrent first callers wait on the same load. If loading fails the
//! segmenter stays disabled for the life of the process.

use crate::error::DictionaryError;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Environment variable naming an alternative word list
pub const WORDLIST_ENV: &str = "READKIT_WORDLIST";

/// Inputs shorter than this (in chars) are returned untouched
pub const MIN_SEGMENT_TEXT_LEN: usize = 10;

/// Tokens shorter than this are never split
pub const MIN_SEGMENT_TOKEN_LEN: usize = 6;

/// Built-in word list, most frequent first
const EMBEDDED_WORDS: &str = include_str!("../../data/words.txt");

static DICTIONARY: OnceCell<Option<Dictionary>> = OnceCell::const_new();

/// Splits a run-together word into dictionary words
pub trait WordSegmenter: Send + Sync {
    /// Returns the pieces (at least two) or `None` when no confident split exists
    fn split(&self, word: &str) -> Option<Vec<String>>;
}

/// Frequency-ranked dictionary with per-word costs
#[derive(Debug, Clone)]
pub struct Dictionary {
    costs: HashMap<String, f64>,
    max_word_len: usize,
}

impl Dictionary {
    /// Build from words ordered most frequent first
    ///
    /// Non-alphabetic entries are ignored; repeated words keep their first rank.
    pub fn from_ranked_words<'a, I>(words: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ranked: Vec<String> = Vec::new();
        for word in words {
            let word = word.trim().to_ascii_lowercase();
            if !word.is_empty() && word.bytes().all(|b| b.is_ascii_alphabetic()) {
                ranked.push(word);
            }
        }
        if ranked.is_empty() {
            return Err(DictionaryError::Empty);
        }

        let log_n = (ranked.len() as f64).ln().max(1.0);
        let mut costs = HashMap::with_capacity(ranked.len());
        let mut max_word_len = 0;
        for (rank, word) in ranked.into_iter().enumerate() {
            max_word_len = max_word_len.max(word.len());
            costs
                .entry(word)
                .or_insert_with(|| ((rank + 1) as f64 * log_n).ln());
        }

        Ok(Self {
            costs,
            max_word_len,
        })
    }

    /// Parse a newline-separated word list
    pub fn from_word_list(list: &str) -> Result<Self, DictionaryError> {
        Self::from_ranked_words(list.lines())
    }

    /// The dictionary compiled into the crate
    pub fn embedded() -> Result<Self, DictionaryError> {
        Self::from_word_list(EMBEDDED_WORDS)
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.costs.contains_key(&word.to_ascii_lowercase())
    }
}

impl WordSegmenter for Dictionary {
    fn split(&self, word: &str) -> Option<Vec<String>> {
        if word.is_empty() || !word.is_ascii() {
            return None;
        }
        let lower = word.to_ascii_lowercase();
        if self.costs.contains_key(&lower) {
            return None;
        }
        let n = lower.len();

        // best[i]: cheapest segmentation of lower[..i]; back[i]: length of its last piece
        let mut best = vec![f64::INFINITY; n + 1];
        let mut back = vec![0usize; n + 1];
        best[0] = 0.0;

        for i in 1..=n {
            for k in 1..=i.min(self.max_word_len) {
                let prev = best[i - k];
                if !prev.is_finite() {
                    continue;
                }
                if let Some(cost) = self.costs.get(&lower[i - k..i]) {
                    let total = prev + cost;
                    if total < best[i] {
                        best[i] = total;
                        back[i] = k;
                    }
                }
            }
        }

        if !best[n].is_finite() {
            return None;
        }

        // Slice the original token so capitalization survives
        let mut pieces = Vec::new();
        let mut end = n;
        while end > 0 {
            let k = back[end];
            pieces.push(word[end - k..end].to_string());
            end -= k;
        }
        pieces.reverse();

        if pieces.len() < 2 {
            None
        } else {
            Some(pieces)
        }
    }
}

/// The process-wide dictionary, loading it on first call
///
/// `None` means loading failed; that outcome is sticky.
pub async fn shared_dictionary() -> Option<&'static Dictionary> {
    DICTIONARY
        .get_or_init(|| async {
            match load_dictionary().await {
                Ok(dictionary) => {
                    info!(words = dictionary.len(), "Word segmentation dictionary loaded");
                    Some(dictionary)
                }
                Err(e) => {
                    warn!(error = %e, "Word segmentation disabled");
                    None
                }
            }
        })
        .await
        .as_ref()
}

async fn load_dictionary() -> Result<Dictionary, DictionaryError> {
    match std::env::var(WORDLIST_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            let list = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| DictionaryError::Read {
                    path: path.clone(),
                    source,
                })?;
            Dictionary::from_word_list(&list)
        }
        _ => Dictionary::embedded(),
    }
}

/// Split merged words in `text` using the shared dictionary
///
/// Never fails: without a dictionary the text comes back unchanged.
pub async fn segment_merged_words(text: &str) -> String {
    if text.chars().count() < MIN_SEGMENT_TEXT_LEN {
        return text.to_string();
    }
    match shared_dictionary().await {
        Some(dictionary) => segment_with(dictionary, text),
        None => text.to_string(),
    }
}

/// Split merged words in `text` with an explicit segmenter
pub fn segment_with(segmenter: &dyn WordSegmenter, text: &str) -> String {
    if text.chars().count() < MIN_SEGMENT_TEXT_LEN {
        return text.to_string();
    }

    let mut segmented = 0usize;
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|token| {
            if is_candidate(token) {
                if let Some(pieces) = segmenter.split(token) {
                    segmented += 1;
                    return pieces.join(" ");
                }
            }
            token.to_string()
        })
        .collect();

    debug!(tokens = tokens.len(), segmented, "Word segmentation pass");
    tokens.join(" ")
}

fn is_candidate(token: &str) -> bool {
    token.len() >= MIN_SEGMENT_TOKEN_LEN && token.bytes().all(|b| b.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_dictionary() -> Dictionary {
        Dictionary::from_word_list(
            "the\nof\nwhat\nyou\nbefore\nafter\nmachine\nlearning\ntogether\nto\nget\nher",
        )
        .unwrap()
    }

    #[test]
    fn test_split_merged_words() {
        let dict = small_dictionary();
        assert_eq!(
            dict.split("whatyou"),
            Some(vec!["what".to_string(), "you".to_string()])
        );
        assert_eq!(
            dict.split("MachineLearning"),
            Some(vec!["Machine".to_string(), "Learning".to_string()])
        );
    }

    #[test]
    fn test_known_word_is_not_split() {
        let dict = small_dictionary();
        assert_eq!(dict.split("together"), None);
    }

    #[test]
    fn test_unknown_word_is_not_split() {
        let dict = small_dictionary();
        assert_eq!(dict.split("xylophone"), None);
        assert_eq!(dict.split("café"), None);
    }

    #[test]
    fn test_short_text_untouched() {
        let dict = small_dictionary();
        assert_eq!(segment_with(&dict, "whatyou"), "whatyou");
        assert_eq!(segment_with(&dict, ""), "");
    }

    #[test]
    fn test_segment_only_letter_tokens() {
        let dict = small_dictionary();
        assert_eq!(
            segment_with(&dict, "tell me whatyou think of beforeafter2 now"),
            "tell me what you think of beforeafter2 now"
        );
    }

    #[test]
    fn test_empty_word_list() {
        assert!(matches!(
            Dictionary::from_word_list("\n123\n\n"),
            Err(DictionaryError::Empty)
        ));
    }

    #[test]
    fn test_embedded_dictionary() {
        let dict = Dictionary::embedded().unwrap();
        assert!(dict.len() > 1000);
        assert!(dict.contains("what"));
        assert_eq!(
            dict.split("whatyou"),
            Some(vec!["what".to_string(), "you".to_string()])
        );
        assert_eq!(dict.split("together"), None);
    }

    #[test]
    fn test_embedded_dictionary_keeps_common_words() {
        let dict = Dictionary::embedded().unwrap();
        for word in [
            "become",
            "weekend",
            "notebook",
            "herein",
            "passage",
            "elsewhere",
            "heartbeat",
            "passwords",
            "discovering",
            "islands",
        ] {
            assert_eq!(dict.split(word), None, "{} was split", word);
        }

        let text = "We will become better at discovering islands and passwords on the weekend";
        assert_eq!(segment_with(&dict, text), text);
    }

    #[test]
    fn test_shared_dictionary_loads_once() {
        let first = tokio_test::block_on(shared_dictionary());
        let second = tokio_test::block_on(shared_dictionary());
        assert!(first.is_some());
        assert!(std::ptr::eq(first.unwrap(), second.unwrap()));
    }

    #[tokio::test]
    async fn test_concurrent_first_use_shares_one_dictionary() {
        let loaded = futures::future::join_all((0..8).map(|_| shared_dictionary())).await;
        let first = loaded[0].unwrap();
        assert!(loaded
            .iter()
            .all(|dict| dict.is_some_and(|d| std::ptr::eq(d, first))));
    }
}
