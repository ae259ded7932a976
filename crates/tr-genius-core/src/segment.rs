//! Legal-article / paragraph segmenter.
//!
//! Splits extracted document text into retrieval units. Legislation is cut
//! at article headers (`Art. 5º.`) so every unit is one article; anything
//! else falls back to blank-line paragraphs.
//!
//! # Algorithm
//!
//! 1. Collapse every whitespace run to a single space and trim.
//! 2. Find article headers matching `Art.␣<digits>[º][.]` (case-sensitive).
//! 3. With at least `min_article_markers` headers, emit one unit per header
//!    plus the body up to the next header. Text before the first header is
//!    discarded.
//! 4. Otherwise split the *original* text on blank lines (a newline,
//!    optional whitespace, a newline) and emit the trimmed paragraphs.
//! 5. In both modes, units of `min_unit_chars` characters or fewer are
//!    dropped.
//!
//! Text with neither headers nor usable paragraphs yields no units. That is
//! not an error here; the ingestion layer reports it as unusable content.
//!
//! # Example
//!
//! ```rust
//! use tr_genius_core::segment::segment;
//!
//! let units = segment("Art. 1º. Texto um.\n\nArt. 2º. Texto dois.");
//! assert_eq!(units, vec!["Art. 1º. Texto um.", "Art. 2º. Texto dois."]);
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Units with this many characters or fewer are dropped.
pub const DEFAULT_MIN_UNIT_CHARS: usize = 10;

/// Header count at which article mode takes over from paragraph mode.
pub const DEFAULT_MIN_ARTICLE_MARKERS: usize = 2;

fn article_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Art\.\s[0-9]+º?\.?").expect("article marker pattern"))
}

fn blank_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("blank line pattern"))
}

/// Tunable segmentation thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    pub min_unit_chars: usize,
    pub min_article_markers: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_unit_chars: DEFAULT_MIN_UNIT_CHARS,
            min_article_markers: DEFAULT_MIN_ARTICLE_MARKERS,
        }
    }
}

/// Which strategy produced a segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Articles,
    Paragraphs,
}

/// Segmenter with explicit thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    config: SegmentConfig,
}

impl Segmenter {
    pub fn new(config: SegmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Split `text` into retrieval units, in source order.
    pub fn segment(&self, text: &str) -> Vec<String> {
        self.segment_with_mode(text).0
    }

    /// Like [`segment`](Self::segment), also reporting the mode used.
    pub fn segment_with_mode(&self, text: &str) -> (Vec<String>, SegmentMode) {
        let normalized = normalize_whitespace(text);
        let markers: Vec<_> = article_marker().find_iter(&normalized).collect();

        if markers.len() >= self.config.min_article_markers.max(1) {
            let mut units = Vec::with_capacity(markers.len());
            for (i, m) in markers.iter().enumerate() {
                let end = markers
                    .get(i + 1)
                    .map(|next| next.start())
                    .unwrap_or(normalized.len());
                self.push_unit(&mut units, &normalized[m.start()..end]);
            }
            debug!(
                markers = markers.len(),
                units = units.len(),
                "segmented by article headers"
            );
            return (units, SegmentMode::Articles);
        }

        let mut units = Vec::new();
        for paragraph in blank_line().split(text) {
            self.push_unit(&mut units, paragraph);
        }
        debug!(units = units.len(), "segmented by paragraphs");
        (units, SegmentMode::Paragraphs)
    }

    fn push_unit(&self, units: &mut Vec<String>, candidate: &str) {
        let trimmed = candidate.trim();
        if trimmed.chars().count() > self.config.min_unit_chars {
            units.push(trimmed.to_string());
        }
    }
}

/// Segment with the default thresholds.
pub fn segment(text: &str) -> Vec<String> {
    Segmenter::default().segment(text)
}

/// Collapse whitespace runs to one space and trim both ends.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
