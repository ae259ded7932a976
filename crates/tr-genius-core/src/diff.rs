//! Word-level diff between two texts, and per-section comparison of
//! document snapshots.
//!
//! # Algorithm
//!
//! 1. Tokenize both texts into alternating runs of whitespace and
//!    non-whitespace, so concatenating the tokens gives back the text.
//! 2. Fill the longest-common-subsequence table over the two token
//!    sequences. The table is one flat `Vec<u32>` indexed `i * (m + 1) + j`.
//! 3. Backtrack from the bottom-right corner. Equal tokens are kept on both
//!    sides. Otherwise the candidate token is consumed as an insertion
//!    whenever that keeps the LCS length (`table[i][j-1] >= table[i-1][j]`),
//!    and only then the reference token as a deletion. This tie-break fixes
//!    the output for a given input pair.
//!
//! Time and memory are `O(n·m)` in tokens. Inputs above
//! [`DiffLimits::max_tokens`] on either side fail with
//! [`CoreError::DiffTooLarge`] before anything is allocated.
//!
//! # Example
//!
//! ```rust
//! use tr_genius_core::diff::{align, DiffLimits, DiffMarkers};
//!
//! let diff = align("o gato preto", "o gato branco", &DiffLimits::default()).unwrap();
//! let out = diff.render(&DiffMarkers::brackets());
//! assert_eq!(out.reference_annotated, "o gato [-preto-]");
//! assert_eq!(out.candidate_annotated, "o gato {+branco+}");
//! ```

use serde::Deserialize;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::models::DocumentSnapshot;

/// Default per-side token ceiling.
pub const DEFAULT_MAX_TOKENS: usize = 4096;

/// Input bounds for [`align`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiffLimits {
    pub max_tokens: usize,
}

impl Default for DiffLimits {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// How a token relates to the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Equal,
    Inserted,
    Deleted,
}

/// One token of an aligned side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffToken<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Named marker sets for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    /// `{+…+}` and `[-…-]`, as in `git diff --word-diff`. A backslash
    /// escapes `\`, `{`, `}`, `[` and `]` in token text.
    #[default]
    Brackets,
    /// `<ins>…</ins>` and `<del>…</del>`, token text HTML-escaped.
    Html,
}

/// Marker pairs wrapped around inserted and deleted tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffMarkers {
    pub insert_open: &'static str,
    pub insert_close: &'static str,
    pub delete_open: &'static str,
    pub delete_close: &'static str,
    pub escape: TextEscape,
}

/// How token text is escaped so markers stay unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEscape {
    /// Backslash before `\`, `{`, `}`, `[` and `]`.
    Backslash,
    /// `&`, `<` and `>` as HTML entities.
    Html,
}

impl DiffMarkers {
    pub fn brackets() -> Self {
        Self {
            insert_open: "{+",
            insert_close: "+}",
            delete_open: "[-",
            delete_close: "-]",
            escape: TextEscape::Backslash,
        }
    }

    pub fn html() -> Self {
        Self {
            insert_open: "<ins>",
            insert_close: "</ins>",
            delete_open: "<del>",
            delete_close: "</del>",
            escape: TextEscape::Html,
        }
    }

    pub fn for_style(style: MarkerStyle) -> Self {
        match style {
            MarkerStyle::Brackets => Self::brackets(),
            MarkerStyle::Html => Self::html(),
        }
    }

    /// Remove the markers from an annotated side and undo the escaping,
    /// giving back the text that was rendered.
    pub fn strip(&self, annotated: &str) -> String {
        let markers = [
            self.insert_open,
            self.insert_close,
            self.delete_open,
            self.delete_close,
        ];
        let mut out = String::with_capacity(annotated.len());
        let mut rest = annotated;
        'scan: while let Some(c) = rest.chars().next() {
            if self.escape == TextEscape::Backslash && c == '\\' {
                let mut chars = rest[1..].chars();
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
                rest = chars.as_str();
                continue;
            }
            for marker in markers {
                if let Some(after) = rest.strip_prefix(marker) {
                    rest = after;
                    continue 'scan;
                }
            }
            if self.escape == TextEscape::Html {
                for (entity, plain) in [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>')] {
                    if let Some(after) = rest.strip_prefix(entity) {
                        out.push(plain);
                        rest = after;
                        continue 'scan;
                    }
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}

/// The annotated pair shown side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedPair {
    pub reference_annotated: String,
    pub candidate_annotated: String,
}

/// Aligned token sequences for both sides.
///
/// `reference` holds [`TokenKind::Equal`] and [`TokenKind::Deleted`]
/// tokens, `candidate` holds `Equal` and `Inserted` ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDiff<'a> {
    pub reference: Vec<DiffToken<'a>>,
    pub candidate: Vec<DiffToken<'a>>,
}

impl<'a> WordDiff<'a> {
    /// True when neither side has an inserted or deleted token.
    pub fn is_identical(&self) -> bool {
        self.reference
            .iter()
            .chain(self.candidate.iter())
            .all(|t| t.kind == TokenKind::Equal)
    }

    /// Tokens present only in the candidate.
    pub fn inserted(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.candidate
            .iter()
            .filter(|t| t.kind == TokenKind::Inserted)
            .map(|t| t.text)
    }

    /// Tokens present only in the reference.
    pub fn deleted(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.reference
            .iter()
            .filter(|t| t.kind == TokenKind::Deleted)
            .map(|t| t.text)
    }

    pub fn render(&self, markers: &DiffMarkers) -> AnnotatedPair {
        AnnotatedPair {
            reference_annotated: render_side(&self.reference, markers),
            candidate_annotated: render_side(&self.candidate, markers),
        }
    }
}

/// Split `text` into maximal whitespace and non-whitespace runs.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|prev| prev != space) {
            tokens.push(&text[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Align `candidate` against `reference` word by word.
pub fn align<'a>(
    reference: &'a str,
    candidate: &'a str,
    limits: &DiffLimits,
) -> Result<WordDiff<'a>> {
    let a = tokenize(reference);
    let b = tokenize(candidate);
    for tokens in [a.len(), b.len()] {
        if tokens > limits.max_tokens {
            return Err(CoreError::DiffTooLarge {
                tokens,
                limit: limits.max_tokens,
            });
        }
    }

    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];
    for i in 1..=n {
        for j in 1..=m {
            table[i * width + j] = if a[i - 1] == b[j - 1] {
                table[(i - 1) * width + j - 1] + 1
            } else {
                table[(i - 1) * width + j].max(table[i * width + j - 1])
            };
        }
    }

    let mut reference_tokens = Vec::with_capacity(n);
    let mut candidate_tokens = Vec::with_capacity(m);
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && a[i - 1] == b[j - 1] {
            reference_tokens.push(DiffToken {
                kind: TokenKind::Equal,
                text: a[i - 1],
            });
            candidate_tokens.push(DiffToken {
                kind: TokenKind::Equal,
                text: b[j - 1],
            });
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i * width + j - 1] >= table[(i - 1) * width + j]) {
            candidate_tokens.push(DiffToken {
                kind: TokenKind::Inserted,
                text: b[j - 1],
            });
            j -= 1;
        } else {
            reference_tokens.push(DiffToken {
                kind: TokenKind::Deleted,
                text: a[i - 1],
            });
            i -= 1;
        }
    }
    reference_tokens.reverse();
    candidate_tokens.reverse();

    debug!(
        reference_tokens = n,
        candidate_tokens = m,
        common = table[n * width + m],
        "aligned texts"
    );
    Ok(WordDiff {
        reference: reference_tokens,
        candidate: candidate_tokens,
    })
}

/// Diff with default limits and HTML markers.
pub fn diff_words(reference: &str, candidate: &str) -> Result<AnnotatedPair> {
    Ok(align(reference, candidate, &DiffLimits::default())?.render(&DiffMarkers::html()))
}

fn render_side(tokens: &[DiffToken<'_>], markers: &DiffMarkers) -> String {
    let mut out = String::new();
    for token in tokens {
        let (open, close) = match token.kind {
            TokenKind::Equal => ("", ""),
            TokenKind::Inserted => (markers.insert_open, markers.insert_close),
            TokenKind::Deleted => (markers.delete_open, markers.delete_close),
        };
        out.push_str(open);
        push_escaped(&mut out, token.text, markers.escape);
        out.push_str(close);
    }
    out
}

fn push_escaped(out: &mut String, text: &str, escape: TextEscape) {
    for c in text.chars() {
        match (escape, c) {
            (TextEscape::Backslash, '\\' | '{' | '}' | '[' | ']') => {
                out.push('\\');
                out.push(c);
            }
            (TextEscape::Html, '&') => out.push_str("&amp;"),
            (TextEscape::Html, '<') => out.push_str("&lt;"),
            (TextEscape::Html, '>') => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Outcome of comparing one section across two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionDiff {
    Same {
        content: String,
    },
    Changed {
        reference_annotated: String,
        candidate_annotated: String,
    },
}

impl SectionDiff {
    pub fn is_same(&self) -> bool {
        matches!(self, SectionDiff::Same { .. })
    }
}

/// Per-section comparison result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    pub section_id: String,
    pub diff: SectionDiff,
}

/// Compare `candidate` against `reference` for each of `section_ids`.
///
/// Sections a snapshot lacks compare as empty text.
pub fn diff_sections<S: AsRef<str>>(
    reference: &DocumentSnapshot,
    candidate: &DocumentSnapshot,
    section_ids: &[S],
    limits: &DiffLimits,
    markers: &DiffMarkers,
) -> Result<Vec<SectionReport>> {
    section_ids
        .iter()
        .map(|id| {
            let id = id.as_ref();
            let old = reference.section(id);
            let new = candidate.section(id);
            let diff = if old == new {
                SectionDiff::Same {
                    content: new.to_string(),
                }
            } else {
                let pair = align(old, new, limits)?.render(markers);
                SectionDiff::Changed {
                    reference_annotated: pair.reference_annotated,
                    candidate_annotated: pair.candidate_annotated,
                }
            };
            Ok(SectionReport {
                section_id: id.to_string(),
                diff,
            })
        })
        .collect()
}
