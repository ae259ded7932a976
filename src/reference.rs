//! Core reference corpus (the procurement law) loading.
//!
//! The law ships as a JSON array of pages, `[{"page": 1, "content": "..."}]`.
//! Page contents are joined with blank lines and segmented like any other
//! document; the result is installed as the protected core entry.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use tr_genius_core::corpus::CorpusRegistry;
use tr_genius_core::segment::Segmenter;

use crate::config::CorpusConfig;

#[derive(Debug, Deserialize)]
struct Page {
    content: String,
}

/// Read and segment the reference corpus at `path`.
pub fn load_reference_corpus(path: &Path, segmenter: &Segmenter) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference corpus: {}", path.display()))?;
    let pages: Vec<Page> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse reference corpus: {}", path.display()))?;
    let text = pages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(segmenter.segment(&text))
}

/// Install the configured reference corpus as the core entry.
///
/// Returns whether a core entry was installed. Load failures are logged and
/// the registry keeps working with the user entries alone.
pub fn install_reference_corpus(
    registry: &mut CorpusRegistry,
    corpus: &CorpusConfig,
    segmenter: &Segmenter,
) -> bool {
    let Some(path) = corpus.core_path.as_deref() else {
        return false;
    };

    let units = match load_reference_corpus(path, segmenter) {
        Ok(units) => units,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "reference corpus unavailable, continuing without it");
            return false;
        }
    };

    match registry.install_core(&corpus.core_name, units) {
        Ok(entry) => {
            info!(name = entry.name(), units = entry.units().len(), "reference corpus ready");
            true
        }
        Err(e) => {
            warn!(error = %e, "could not install reference corpus");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tr_genius_core::store::memory::InMemoryStore;

    const LAW: &str = r#"[
        {"page": 1, "content": "Art. 1º Esta Lei estabelece normas gerais de licitação."},
        {"page": 2, "content": "Art. 2º Esta Lei aplica-se a alienação e concessão."}
    ]"#;

    fn config_for(path: Option<&Path>) -> CorpusConfig {
        CorpusConfig {
            core_path: path.map(Path::to_path_buf),
            ..CorpusConfig::default()
        }
    }

    #[test]
    fn pages_are_joined_and_segmented_by_article() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lei.json");
        fs::write(&path, LAW).unwrap();
        let units = load_reference_corpus(&path, &Segmenter::default()).unwrap();
        assert_eq!(units.len(), 2);
        assert!(units[0].starts_with("Art. 1º"));
        assert!(units[1].starts_with("Art. 2º"));
    }

    #[test]
    fn installs_core_entry_first() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lei.json");
        fs::write(&path, LAW).unwrap();

        let mut reg = CorpusRegistry::new(Arc::new(InMemoryStore::new()));
        reg.add_entry(tr_genius_core::models::CorpusEntry::user(
            "edital.pdf",
            vec!["Trecho do edital.".to_string()],
        ))
        .unwrap();
        assert!(install_reference_corpus(
            &mut reg,
            &config_for(Some(&path)),
            &Segmenter::default()
        ));
        assert!(reg.entries()[0].is_core());
        assert_eq!(reg.entries()[0].name(), "Lei 14.133/21 (Base de Conhecimento)");
    }

    #[test]
    fn missing_or_broken_corpus_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut reg = CorpusRegistry::new(Arc::new(InMemoryStore::new()));
        let missing = tmp.path().join("nope.json");
        assert!(!install_reference_corpus(
            &mut reg,
            &config_for(Some(&missing)),
            &Segmenter::default()
        ));

        let broken = tmp.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();
        assert!(!install_reference_corpus(
            &mut reg,
            &config_for(Some(&broken)),
            &Segmenter::default()
        ));

        assert!(!install_reference_corpus(
            &mut reg,
            &config_for(None),
            &Segmenter::default()
        ));
        assert!(reg.is_empty());
    }
}
