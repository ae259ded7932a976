//! Corpus registry: the named, selectable sources that ground generation.
//!
//! Entries keep insertion order, which is also the order their blocks
//! appear in the assembled context. Names are unique; re-adding a name is
//! rejected so a second upload never masks the first.
//!
//! Every successful mutation writes the user entries to the
//! [`KeyValueStore`] under [`CORPUS_KEY`], as an ordered array. The write
//! is fire-and-forget: a failing store is logged and the in-memory change
//! stands. Core entries are never written; they are rebuilt by
//! [`CorpusRegistry::install_core`] on each start, and any core entry
//! found in stored data is dropped on load.
//!
//! Mutations take `&mut self`, so the read-modify-write of
//! snapshot-then-persist is never interleaved within a process.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::models::CorpusEntry;
use crate::store::{self, KeyValueStore, CORPUS_KEY};

/// Persisted form of one user entry.
///
/// `is_core` is only read, so data written before core entries were
/// excluded can still be filtered.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    name: String,
    units: Vec<String>,
    selected: bool,
    #[serde(default, skip_serializing)]
    is_core: bool,
}

/// Entry shape written before the versioned envelope existed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFile {
    name: String,
    #[serde(default)]
    chunks: Vec<String>,
    #[serde(default = "default_selected")]
    selected: bool,
    #[serde(default)]
    is_core: Option<bool>,
}

fn default_selected() -> bool {
    true
}

impl From<&CorpusEntry> for StoredEntry {
    fn from(entry: &CorpusEntry) -> Self {
        StoredEntry {
            name: entry.name().to_string(),
            units: entry.units().to_vec(),
            selected: entry.is_selected(),
            is_core: false,
        }
    }
}

impl From<StoredEntry> for CorpusEntry {
    fn from(stored: StoredEntry) -> Self {
        CorpusEntry::User {
            name: stored.name,
            units: stored.units,
            selected: stored.selected,
        }
    }
}

/// Registry of corpus entries backed by a key-value store.
pub struct CorpusRegistry {
    entries: Vec<CorpusEntry>,
    store: Arc<dyn KeyValueStore>,
}

impl CorpusRegistry {
    /// An empty registry. Nothing is read from `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            entries: Vec::new(),
            store,
        }
    }

    /// Restore the registry persisted in `store`, or an empty one.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let entries = match store.get(CORPUS_KEY)? {
            None => Vec::new(),
            Some(raw) => decode_entries(&raw)?,
        };
        debug!(entries = entries.len(), "loaded corpus registry");
        Ok(Self { entries, store })
    }

    /// Add a new entry. Fails with [`CoreError::DuplicateName`] if the name
    /// is taken.
    pub fn add_entry(&mut self, entry: CorpusEntry) -> Result<&CorpusEntry> {
        if self.contains(entry.name()) {
            return Err(CoreError::DuplicateName(entry.name().to_string()));
        }
        info!(
            name = entry.name(),
            units = entry.units().len(),
            core = entry.is_core(),
            "added corpus entry"
        );
        self.entries.push(entry);
        self.persist();
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// Install or refresh the core reference corpus.
    ///
    /// Core content is re-derived on every start, so an existing core entry
    /// with the same name is replaced in place. A new core entry goes in
    /// front of the user entries. A *user* entry with the same name is a
    /// [`CoreError::DuplicateName`].
    ///
    /// Nothing is written to the store: the persisted user entries are
    /// unchanged by this call.
    pub fn install_core(&mut self, name: &str, units: Vec<String>) -> Result<&CorpusEntry> {
        let entry = CorpusEntry::core(name, units);
        let index = match self.position(name) {
            Some(i) if self.entries[i].is_core() => {
                self.entries[i] = entry;
                i
            }
            Some(_) => return Err(CoreError::DuplicateName(name.to_string())),
            None => {
                let at = self.entries.iter().take_while(|e| e.is_core()).count();
                self.entries.insert(at, entry);
                at
            }
        };
        info!(
            name,
            units = self.entries[index].units().len(),
            "installed core corpus"
        );
        Ok(&self.entries[index])
    }

    /// Remove a user entry. Core entries fail with
    /// [`CoreError::ProtectedEntry`] and are left untouched.
    pub fn remove_entry(&mut self, name: &str) -> Result<CorpusEntry> {
        let index = self
            .position(name)
            .ok_or_else(|| CoreError::EntryNotFound(name.to_string()))?;
        if self.entries[index].is_core() {
            return Err(CoreError::ProtectedEntry(name.to_string()));
        }
        let removed = self.entries.remove(index);
        info!(name, "removed corpus entry");
        self.persist();
        Ok(removed)
    }

    /// Flip a user entry's selection and return the new state. Core entries
    /// fail with [`CoreError::ProtectedEntry`].
    pub fn toggle_selected(&mut self, name: &str) -> Result<bool> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| CoreError::EntryNotFound(name.to_string()))?;
        let now_selected = match entry {
            CorpusEntry::Core { .. } => return Err(CoreError::ProtectedEntry(name.to_string())),
            CorpusEntry::User { selected, .. } => {
                *selected = !*selected;
                *selected
            }
        };
        info!(name, selected = now_selected, "toggled corpus entry");
        self.persist();
        Ok(now_selected)
    }

    /// Selected entries, in insertion order.
    pub fn selected_entries(&self) -> Vec<&CorpusEntry> {
        self.entries.iter().filter(|e| e.is_selected()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&CorpusEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All entries, in insertion order.
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }

    fn persist(&self) {
        let stored: Vec<StoredEntry> = self
            .entries
            .iter()
            .filter(|e| !e.is_core())
            .map(StoredEntry::from)
            .collect();
        let result = store::encode(&stored).and_then(|raw| self.store.set(CORPUS_KEY, &raw));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist corpus registry");
        }
    }
}

fn decode_entries(raw: &str) -> Result<Vec<CorpusEntry>> {
    let stored: Vec<StoredEntry> = store::decode(CORPUS_KEY, raw, |value| {
        let legacy: Vec<LegacyFile> =
            serde_json::from_value(value).map_err(|e| CoreError::Schema {
                key: CORPUS_KEY.to_string(),
                reason: e.to_string(),
            })?;
        info!(entries = legacy.len(), "migrating unversioned corpus registry");
        Ok(legacy
            .into_iter()
            .map(|f| StoredEntry {
                name: f.name,
                units: f.chunks,
                selected: f.selected,
                is_core: f.is_core.unwrap_or(false),
            })
            .collect())
    })?;

    let mut entries: Vec<CorpusEntry> = Vec::with_capacity(stored.len());
    for s in stored {
        if s.is_core {
            debug!(name = %s.name, "ignoring stored core entry");
            continue;
        }
        if entries.iter().any(|e| e.name() == s.name) {
            warn!(name = %s.name, "dropping duplicate corpus entry in stored registry");
            continue;
        }
        entries.push(s.into());
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn units(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Unidade de texto número {i}.")).collect()
    }

    fn registry() -> (Arc<InMemoryStore>, CorpusRegistry) {
        let store = Arc::new(InMemoryStore::new());
        let reg = CorpusRegistry::new(store.clone());
        (store, reg)
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CoreError::Store("disk full".to_string()))
        }
    }

    #[test]
    fn add_and_enumerate_in_insertion_order() {
        let (_, mut reg) = registry();
        reg.add_entry(CorpusEntry::user("b.pdf", units(1))).unwrap();
        reg.add_entry(CorpusEntry::user("a.pdf", units(2))).unwrap();
        let names: Vec<_> = reg.selected_entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf"]);
    }

    #[test]
    fn duplicate_name_rejected_without_overwrite() {
        let (_, mut reg) = registry();
        reg.add_entry(CorpusEntry::user("a.pdf", units(1))).unwrap();
        let err = reg.add_entry(CorpusEntry::user("a.pdf", units(5))).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName(n) if n == "a.pdf"));
        assert_eq!(reg.get("a.pdf").unwrap().units().len(), 1);
    }

    #[test]
    fn toggle_and_remove_user_entry() {
        let (_, mut reg) = registry();
        reg.add_entry(CorpusEntry::user("a.pdf", units(1))).unwrap();
        assert!(!reg.toggle_selected("a.pdf").unwrap());
        assert!(reg.selected_entries().is_empty());
        assert!(reg.toggle_selected("a.pdf").unwrap());
        let removed = reg.remove_entry("a.pdf").unwrap();
        assert_eq!(removed.name(), "a.pdf");
        assert!(reg.is_empty());
    }

    #[test]
    fn core_entry_is_protected() {
        let (store, mut reg) = registry();
        reg.add_entry(CorpusEntry::core("Lei", units(3))).unwrap();
        let before = store.get(CORPUS_KEY).unwrap();

        assert!(matches!(
            reg.toggle_selected("Lei"),
            Err(CoreError::ProtectedEntry(_))
        ));
        assert!(matches!(
            reg.remove_entry("Lei"),
            Err(CoreError::ProtectedEntry(_))
        ));
        assert!(reg.get("Lei").unwrap().is_selected());
        assert_eq!(reg.len(), 1);
        assert_eq!(store.get(CORPUS_KEY).unwrap(), before);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let (_, mut reg) = registry();
        assert!(matches!(
            reg.toggle_selected("x"),
            Err(CoreError::EntryNotFound(_))
        ));
        assert!(matches!(reg.remove_entry("x"), Err(CoreError::EntryNotFound(_))));
    }

    #[test]
    fn persisted_registry_round_trips_user_entries() {
        let (store, mut reg) = registry();
        reg.add_entry(CorpusEntry::core("Lei", units(2))).unwrap();
        reg.add_entry(CorpusEntry::user("a.pdf", units(3))).unwrap();
        reg.add_entry(CorpusEntry::user("b.txt", units(1))).unwrap();
        reg.toggle_selected("b.txt").unwrap();

        let loaded = CorpusRegistry::load(store).unwrap();
        assert!(!loaded.contains("Lei"));
        assert_eq!(loaded.entries(), &reg.entries()[1..]);
    }

    #[test]
    fn renamed_core_leaves_no_orphan() {
        let (store, mut reg) = registry();
        reg.install_core("Lei antiga", units(2)).unwrap();
        reg.add_entry(CorpusEntry::user("a.pdf", units(1))).unwrap();

        let mut reloaded = CorpusRegistry::load(store).unwrap();
        reloaded.install_core("Lei nova", units(3)).unwrap();
        let names: Vec<_> = reloaded.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["Lei nova", "a.pdf"]);
        assert!(reloaded.get("Lei nova").unwrap().is_core());
    }

    #[test]
    fn install_core_does_not_write_store() {
        let (store, mut reg) = registry();
        reg.install_core("Lei", units(2)).unwrap();
        reg.install_core("Lei", units(4)).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get(CORPUS_KEY).unwrap(), None);
    }

    #[test]
    fn stored_core_entry_is_ignored() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(
                CORPUS_KEY,
                r#"{"version":1,"data":[
                    {"name":"Lei","units":["Art. 1º Texto."],"selected":true,"isCore":true},
                    {"name":"a.pdf","units":["Trecho."],"selected":true}]}"#,
            )
            .unwrap();
        let reg = CorpusRegistry::load(store).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(!reg.contains("Lei"));
    }

    #[test]
    fn install_core_goes_first_and_refreshes() {
        let (_, mut reg) = registry();
        reg.add_entry(CorpusEntry::user("a.pdf", units(1))).unwrap();
        reg.install_core("Lei", units(2)).unwrap();
        assert_eq!(reg.entries()[0].name(), "Lei");

        reg.install_core("Lei", units(4)).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.entries()[0].units().len(), 4);
    }

    #[test]
    fn install_core_refuses_user_name() {
        let (_, mut reg) = registry();
        reg.add_entry(CorpusEntry::user("Lei", units(1))).unwrap();
        assert!(matches!(
            reg.install_core("Lei", units(2)),
            Err(CoreError::DuplicateName(_))
        ));
    }

    #[test]
    fn legacy_array_is_migrated() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(
                CORPUS_KEY,
                r#"[{"name":"a.pdf","chunks":["Primeiro trecho útil."],"selected":false},
                    {"name":"Lei","chunks":[],"selected":true,"isCore":true}]"#,
            )
            .unwrap();
        let reg = CorpusRegistry::load(store).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(!reg.get("a.pdf").unwrap().is_selected());
        assert!(!reg.contains("Lei"));
    }

    #[test]
    fn malformed_value_is_schema_error() {
        let store = Arc::new(InMemoryStore::new());
        store.set(CORPUS_KEY, r#"{"foo":1}"#).unwrap();
        assert!(matches!(
            CorpusRegistry::load(store),
            Err(CoreError::Schema { .. })
        ));
    }

    #[test]
    fn store_failure_does_not_undo_mutation() {
        let mut reg = CorpusRegistry::new(Arc::new(FailingStore));
        reg.add_entry(CorpusEntry::user("a.pdf", units(1))).unwrap();
        assert!(reg.contains("a.pdf"));
    }
}
