//! Core data models: corpus entries, document states and snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A named, selectable collection of retrieval units.
///
/// Core entries hold the mandatory reference corpus. They carry no
/// selection flag because they are always part of the assembled context,
/// and the registry refuses to toggle or remove them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusEntry {
    Core {
        name: String,
        units: Vec<String>,
    },
    User {
        name: String,
        units: Vec<String>,
        selected: bool,
    },
}

impl CorpusEntry {
    pub fn core(name: impl Into<String>, units: Vec<String>) -> Self {
        CorpusEntry::Core {
            name: name.into(),
            units,
        }
    }

    /// A user-supplied entry. New uploads start out selected.
    pub fn user(name: impl Into<String>, units: Vec<String>) -> Self {
        CorpusEntry::User {
            name: name.into(),
            units,
            selected: true,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CorpusEntry::Core { name, .. } | CorpusEntry::User { name, .. } => name,
        }
    }

    pub fn units(&self) -> &[String] {
        match self {
            CorpusEntry::Core { units, .. } | CorpusEntry::User { units, .. } => units,
        }
    }

    pub fn is_selected(&self) -> bool {
        match self {
            CorpusEntry::Core { .. } => true,
            CorpusEntry::User { selected, .. } => *selected,
        }
    }

    pub fn is_core(&self) -> bool {
        matches!(self, CorpusEntry::Core { .. })
    }
}

/// The content of a document at save time, as handed to the history store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentState {
    pub name: String,
    pub section_values: BTreeMap<String, String>,
    pub attachments_fingerprint: String,
}

/// An immutable recorded state of a document.
///
/// `name` and `attachments_fingerprint` are kept so the next save can tell
/// which categories changed. Histories written before they existed load
/// with `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    #[serde(alias = "sections")]
    pub section_values: BTreeMap<String, String>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments_fingerprint: Option<String>,
}

impl DocumentSnapshot {
    /// Section text for `section_id`, or `""` when the snapshot predates it.
    pub fn section(&self, section_id: &str) -> &str {
        self.section_values
            .get(section_id)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// SHA-256 over attachment names and contents, in order.
///
/// Lengths are hashed ahead of each field so that moving bytes between a
/// name and its content changes the digest.
pub fn fingerprint_attachments<N, B>(attachments: &[(N, B)]) -> String
where
    N: AsRef<str>,
    B: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for (name, bytes) in attachments {
        let name = name.as_ref().as_bytes();
        let bytes = bytes.as_ref();
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name);
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_entries_are_always_selected() {
        let entry = CorpusEntry::core("Lei", vec![]);
        assert!(entry.is_selected());
        assert!(entry.is_core());
    }

    #[test]
    fn fingerprint_depends_on_content_and_order() {
        let one = ("a.pdf", b"one".as_slice());
        let two = ("b.pdf", b"two".as_slice());
        let a = fingerprint_attachments(&[one, two]);
        let b = fingerprint_attachments(&[two, one]);
        let c = fingerprint_attachments(&[one, two]);
        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_ne!(
            fingerprint_attachments(&[("ab", b"c".as_slice())]),
            fingerprint_attachments(&[("a", b"bc".as_slice())])
        );
    }

    #[test]
    fn snapshot_loads_legacy_sections_field() {
        let json = r#"{"sections":{"obj":"x"},"summary":"Documento criado.","timestamp":"2024-05-01T12:00:00Z"}"#;
        let snap: DocumentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.section("obj"), "x");
        assert_eq!(snap.section("missing"), "");
        assert!(snap.name.is_none());
    }
}
