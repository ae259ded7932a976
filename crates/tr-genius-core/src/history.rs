//! Snapshot store: per-document version history.
//!
//! A save hands the current [`DocumentState`] to
//! [`SnapshotStore::record_if_changed`]. When the name, any section value or
//! the attachment fingerprint differs from the latest snapshot, a new one is
//! put at the front of the history with a one-line summary of what changed.
//! Saving an unchanged document records nothing.
//!
//! Histories are stored newest first under [`history_key`], one key per
//! document. Snapshots are never edited or reordered once written.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::diff::{diff_sections, DiffLimits, DiffMarkers, SectionReport};
use crate::error::{CoreError, Result};
use crate::models::{DocumentSnapshot, DocumentState};
use crate::store::{self, history_key, KeyValueStore};

/// Summary of a document's first snapshot.
pub const CREATED_SUMMARY: &str = "Documento criado.";

/// Result of [`SnapshotStore::record_if_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Appended(DocumentSnapshot),
    Unchanged,
}

/// History store backed by a key-value store.
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Snapshots of `document_id`, newest first. Unknown documents have an
    /// empty history.
    pub fn history(&self, document_id: &str) -> Result<Vec<DocumentSnapshot>> {
        let key = history_key(document_id);
        match self.store.get(&key)? {
            None => Ok(Vec::new()),
            Some(raw) => store::decode(&key, &raw, |value| {
                serde_json::from_value(value).map_err(|e| CoreError::Schema {
                    key: key.clone(),
                    reason: e.to_string(),
                })
            }),
        }
    }

    /// Record `state` if it differs from the latest snapshot, stamped now.
    pub fn record_if_changed(
        &mut self,
        document_id: &str,
        state: &DocumentState,
    ) -> Result<RecordOutcome> {
        self.record_if_changed_at(document_id, state, Utc::now())
    }

    /// Record `state` if it differs from the latest snapshot, stamped `now`.
    pub fn record_if_changed_at(
        &mut self,
        document_id: &str,
        state: &DocumentState,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        let mut history = self.history(document_id)?;
        let summary = match summarize_changes(history.first(), state) {
            Some(summary) => summary,
            None => {
                debug!(document_id, "document unchanged, no snapshot recorded");
                return Ok(RecordOutcome::Unchanged);
            }
        };

        let snapshot = DocumentSnapshot {
            section_values: state.section_values.clone(),
            summary,
            timestamp: now,
            name: Some(state.name.clone()),
            attachments_fingerprint: Some(state.attachments_fingerprint.clone()),
        };
        history.insert(0, snapshot.clone());
        self.store
            .set(&history_key(document_id), &store::encode(&history)?)?;
        info!(
            document_id,
            versions = history.len(),
            summary = %snapshot.summary,
            "recorded snapshot"
        );
        Ok(RecordOutcome::Appended(snapshot))
    }

    /// Compare snapshot `index_a` (shown as the candidate) against
    /// `index_b` (the reference) for each of `section_ids`.
    pub fn compare<S: AsRef<str>>(
        &self,
        document_id: &str,
        index_a: usize,
        index_b: usize,
        section_ids: &[S],
        limits: &DiffLimits,
        markers: &DiffMarkers,
    ) -> Result<Vec<SectionReport>> {
        let history = self.history(document_id)?;
        let len = history.len();
        let candidate = history
            .get(index_a)
            .ok_or(CoreError::SnapshotNotFound { index: index_a, len })?;
        let reference = history
            .get(index_b)
            .ok_or(CoreError::SnapshotNotFound { index: index_b, len })?;
        diff_sections(reference, candidate, section_ids, limits, markers)
    }
}

/// Describe what changed between `previous` and `state`, or `None` when
/// nothing did.
///
/// Snapshots loaded from histories that did not record the name or the
/// attachment fingerprint only compare on section values.
pub fn summarize_changes(
    previous: Option<&DocumentSnapshot>,
    state: &DocumentState,
) -> Option<String> {
    let previous = match previous {
        None => return Some(CREATED_SUMMARY.to_string()),
        Some(p) => p,
    };

    let mut changes = Vec::new();
    if let Some(old_name) = previous.name.as_deref() {
        if old_name != state.name {
            changes.push(format!(
                "nome alterado de \"{}\" para \"{}\"",
                old_name, state.name
            ));
        }
    }
    if previous.section_values != state.section_values {
        changes.push("conteúdo das seções modificado".to_string());
    }
    if let Some(old_fp) = previous.attachments_fingerprint.as_deref() {
        if old_fp != state.attachments_fingerprint {
            changes.push("anexos atualizados".to_string());
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(format!("Alteração: {}.", changes.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::SectionDiff;
    use crate::store::memory::InMemoryStore;
    use chrono::TimeZone;

    fn state(name: &str, sections: &[(&str, &str)], fp: &str) -> DocumentState {
        DocumentState {
            name: name.to_string(),
            section_values: sections
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            attachments_fingerprint: fp.to_string(),
        }
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    fn snapshots() -> (Arc<InMemoryStore>, SnapshotStore) {
        let kv = Arc::new(InMemoryStore::new());
        (kv.clone(), SnapshotStore::new(kv))
    }

    #[test]
    fn first_save_is_creation() {
        let (_, mut store) = snapshots();
        let outcome = store
            .record_if_changed_at("1", &state("ETP", &[("obj", "x")], ""), at(0))
            .unwrap();
        match outcome {
            RecordOutcome::Appended(s) => {
                assert_eq!(s.summary, CREATED_SUMMARY);
                assert_eq!(s.timestamp, at(0));
            }
            RecordOutcome::Unchanged => panic!("expected a snapshot"),
        }
    }

    #[test]
    fn identical_save_is_noop() {
        let (_, mut store) = snapshots();
        let s = state("ETP", &[("obj", "x")], "fp");
        store.record_if_changed_at("1", &s, at(0)).unwrap();
        let second = store.record_if_changed_at("1", &s, at(1)).unwrap();
        assert_eq!(second, RecordOutcome::Unchanged);
        assert_eq!(store.history("1").unwrap().len(), 1);
    }

    #[test]
    fn summary_lists_changed_categories_in_order() {
        let (_, mut store) = snapshots();
        store
            .record_if_changed_at("1", &state("ETP", &[("obj", "x")], "a"), at(0))
            .unwrap();
        store
            .record_if_changed_at("1", &state("ETP final", &[("obj", "y")], "b"), at(1))
            .unwrap();
        store
            .record_if_changed_at("1", &state("ETP final", &[("obj", "y")], "c"), at(2))
            .unwrap();

        let history = store.history("1").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].summary, "Alteração: anexos atualizados.");
        assert_eq!(
            history[1].summary,
            "Alteração: nome alterado de \"ETP\" para \"ETP final\", conteúdo das seções modificado, anexos atualizados."
        );
        assert_eq!(history[2].summary, CREATED_SUMMARY);
        assert!(history[0].timestamp > history[1].timestamp);
    }

    #[test]
    fn histories_are_per_document() {
        let (_, mut store) = snapshots();
        store
            .record_if_changed_at("1", &state("A", &[], ""), at(0))
            .unwrap();
        assert!(store.history("2").unwrap().is_empty());
    }

    #[test]
    fn history_round_trips_through_store() {
        let (kv, mut store) = snapshots();
        store
            .record_if_changed_at("7", &state("A", &[("obj", "um")], ""), at(0))
            .unwrap();
        store
            .record_if_changed_at("7", &state("A", &[("obj", "dois")], ""), at(1))
            .unwrap();
        let reopened = SnapshotStore::new(kv);
        assert_eq!(reopened.history("7").unwrap(), store.history("7").unwrap());
    }

    #[test]
    fn legacy_history_without_name_compares_sections_only() {
        let kv = Arc::new(InMemoryStore::new());
        kv.set(
            &history_key("9"),
            r#"[{"sections":{"obj":"x"},"summary":"Documento criado.","timestamp":"2024-05-01T12:00:00Z"}]"#,
        )
        .unwrap();
        let mut store = SnapshotStore::new(kv);
        let same = store
            .record_if_changed_at("9", &state("Renomeado", &[("obj", "x")], "fp"), at(5))
            .unwrap();
        assert_eq!(same, RecordOutcome::Unchanged);
        let changed = store
            .record_if_changed_at("9", &state("Renomeado", &[("obj", "z")], "fp"), at(6))
            .unwrap();
        assert!(matches!(changed, RecordOutcome::Appended(_)));
        assert_eq!(store.history("9").unwrap().len(), 2);
    }

    #[test]
    fn compare_reports_per_section() {
        let (_, mut store) = snapshots();
        store
            .record_if_changed_at(
                "1",
                &state("TR", &[("obj", "Objeto."), ("just", "Motivo antigo.")], ""),
                at(0),
            )
            .unwrap();
        store
            .record_if_changed_at(
                "1",
                &state("TR", &[("obj", "Objeto."), ("just", "Motivo novo.")], ""),
                at(1),
            )
            .unwrap();

        let report = store
            .compare(
                "1",
                0,
                1,
                &["obj", "just"],
                &DiffLimits::default(),
                &DiffMarkers::brackets(),
            )
            .unwrap();
        assert!(report[0].diff.is_same());
        match &report[1].diff {
            SectionDiff::Changed {
                reference_annotated,
                candidate_annotated,
            } => {
                assert_eq!(reference_annotated, "Motivo [-antigo.-]");
                assert_eq!(candidate_annotated, "Motivo {+novo.+}");
            }
            other => panic!("expected a change, got {other:?}"),
        }
    }

    #[test]
    fn compare_out_of_range_index() {
        let (_, mut store) = snapshots();
        store
            .record_if_changed_at("1", &state("TR", &[], ""), at(0))
            .unwrap();
        let err = store
            .compare(
                "1",
                0,
                1,
                &["obj"],
                &DiffLimits::default(),
                &DiffMarkers::brackets(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::SnapshotNotFound { index: 1, len: 1 }));
    }
}
