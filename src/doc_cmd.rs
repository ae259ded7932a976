//! `trg doc ...` handlers: save, history and per-section diff.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

use tr_genius_core::diff::{DiffMarkers, SectionDiff};
use tr_genius_core::history::{RecordOutcome, SnapshotStore};
use tr_genius_core::models::{fingerprint_attachments, DocumentState};

use crate::config::{Config, SectionsConfig};
use crate::corpus_cmd::open_store;

/// Which section list a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentKind {
    /// Estudo Técnico Preliminar.
    Etp,
    /// Termo de Referência.
    Tr,
}

impl DocumentKind {
    pub fn section_ids(self, sections: &SectionsConfig) -> &[String] {
        match self {
            DocumentKind::Etp => &sections.etp,
            DocumentKind::Tr => &sections.tr,
        }
    }
}

/// Document state as written by the editor, e.g.
///
/// ```json
/// {"name": "TR - Limpeza", "sectionValues": {"tr-input-objeto": "..."}, "attachments": ["anexo.pdf"]}
/// ```
///
/// Attachment paths are relative to the state file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFile {
    pub name: String,
    #[serde(default, alias = "sections")]
    pub section_values: BTreeMap<String, String>,
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
}

/// Read a state file and fingerprint its attachments.
pub fn read_state(path: &Path) -> Result<DocumentState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document state: {}", path.display()))?;
    let state: StateFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse document state: {}", path.display()))?;

    let base = path.parent().unwrap_or(Path::new("."));
    let mut attachments = Vec::with_capacity(state.attachments.len());
    for attachment in &state.attachments {
        let full = base.join(attachment);
        let bytes = std::fs::read(&full)
            .with_context(|| format!("Failed to read attachment: {}", full.display()))?;
        let name = attachment
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        attachments.push((name, bytes));
    }

    Ok(DocumentState {
        name: state.name,
        section_values: state.section_values,
        attachments_fingerprint: fingerprint_attachments(&attachments),
    })
}

pub fn run_save(config: &Config, id: &str, state_path: &Path) -> Result<()> {
    let state = read_state(state_path)?;
    let mut snapshots = SnapshotStore::new(open_store(config)?);
    match snapshots.record_if_changed(id, &state)? {
        RecordOutcome::Appended(snapshot) => println!("recorded: {}", snapshot.summary),
        RecordOutcome::Unchanged => println!("unchanged"),
    }
    Ok(())
}

pub fn run_history(config: &Config, id: &str) -> Result<()> {
    let snapshots = SnapshotStore::new(open_store(config)?);
    let history = snapshots.history(id)?;
    if history.is_empty() {
        println!("No history for document {}", id);
        return Ok(());
    }
    for (index, snapshot) in history.iter().enumerate() {
        println!(
            "{:<4} {}  {}",
            index,
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"),
            snapshot.summary
        );
    }
    Ok(())
}

pub fn run_diff(
    config: &Config,
    id: &str,
    kind: DocumentKind,
    index_a: usize,
    index_b: usize,
) -> Result<()> {
    let snapshots = SnapshotStore::new(open_store(config)?);
    let report = snapshots.compare(
        id,
        index_a,
        index_b,
        kind.section_ids(&config.sections),
        &config.diff.limits(),
        &DiffMarkers::for_style(config.diff.markers),
    )?;

    for section in report {
        println!("== {} ==", section.section_id);
        match section.diff {
            SectionDiff::Same { .. } => println!("sem alterações"),
            SectionDiff::Changed {
                reference_annotated,
                candidate_annotated,
            } => {
                println!("- {}", reference_annotated);
                println!("+ {}", candidate_annotated);
            }
        }
        println!();
    }
    Ok(())
}
