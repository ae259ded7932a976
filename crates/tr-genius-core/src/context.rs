//! Context assembly for generation requests.
//!
//! Turns the selected corpus entries into one text block for the prompt
//! builder:
//!
//! ```text
//! --- INÍCIO DOS DOCUMENTOS DE APOIO ---
//! Contexto do ficheiro "<name>":
//! <unit>
//!
//! <unit>
//!
//! ---
//!
//! Contexto do ficheiro "<name>":
//! ...
//! --- FIM DOS DOCUMENTOS DE APOIO ---
//! ```
//!
//! No size budgeting happens here. The whole selected corpus is emitted, so
//! a large reference text produces a large block; bounding it against the
//! generation API's input limit is up to the caller.

use tracing::{debug, warn};

use crate::models::CorpusEntry;

/// Opening line of the assembled block.
pub const CONTEXT_START: &str = "--- INÍCIO DOS DOCUMENTOS DE APOIO ---";

/// Closing line of the assembled block.
pub const CONTEXT_END: &str = "--- FIM DOS DOCUMENTOS DE APOIO ---";

/// Separator between entry blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Separator between units inside a block.
const UNIT_SEPARATOR: &str = "\n\n";

/// Assemble the context for the selected entries of `entries`.
///
/// Returns an empty string when nothing is selected; callers omit the
/// support-document part of the prompt entirely in that case.
pub fn build_context<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a CorpusEntry>,
{
    let blocks: Vec<String> = entries
        .into_iter()
        .filter(|e| e.is_selected())
        .map(|e| {
            format!(
                "Contexto do ficheiro \"{}\":\n{}",
                e.name(),
                e.units().join(UNIT_SEPARATOR)
            )
        })
        .collect();

    if blocks.is_empty() {
        return String::new();
    }

    let context = format!(
        "{CONTEXT_START}\n{}\n{CONTEXT_END}",
        blocks.join(BLOCK_SEPARATOR)
    );
    debug!(
        blocks = blocks.len(),
        chars = context.chars().count(),
        "assembled context"
    );
    context
}

/// [`build_context`], logging a warning when the result exceeds
/// `warn_chars` characters. The context is never truncated.
pub fn build_context_checked<'a, I>(entries: I, warn_chars: usize) -> String
where
    I: IntoIterator<Item = &'a CorpusEntry>,
{
    let context = build_context(entries);
    let chars = context.chars().count();
    if chars > warn_chars {
        warn!(
            chars,
            limit = warn_chars,
            "assembled context is larger than the configured warning threshold"
        );
    }
    context
}
