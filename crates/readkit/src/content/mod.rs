//! Document content pipeline
//!
//! Data flows source resolution → HTML extraction → word segmentation →
//! windowing. Every stage degrades to a sentinel or empty string instead
//! of failing the surrounding call.

pub mod extract;
pub mod segment;
pub mod sources;
pub mod window;

pub use extract::{filter_excessive_newlines, html_to_text, is_html};
pub use segment::{segment_merged_words, Dictionary, WordSegmenter};
pub use sources::{
    ContentResolver, ContentSource, LiveHtmlSource, PresignedObjectSource, RenderProxy,
    RenderProxySource, StoredHtmlSource, CONTENT_UNAVAILABLE, DEFAULT_PROXY_BASE,
};
pub use window::{
    process, process_with_limits, ContentDebug, ContentOptions, ExtractionResult, WindowLimits,
    NO_MATCH_SENTINEL,
};
