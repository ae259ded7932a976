//! `trg segment`, `trg corpus ...` and `trg context` handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use tr_genius_core::context::build_context_checked;
use tr_genius_core::corpus::CorpusRegistry;
use tr_genius_core::segment::Segmenter;
use tr_genius_core::store::KeyValueStore;

use crate::config::Config;
use crate::extract;
use crate::ingest::{self, IngestOptions};
use crate::reference;
use crate::store::FileStore;

/// Open the configured file store.
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store = FileStore::open(&config.storage.dir).with_context(|| {
        format!(
            "Failed to open storage dir: {}",
            config.storage.dir.display()
        )
    })?;
    Ok(Arc::new(store))
}

/// Load the persisted registry and (re)install the reference corpus.
pub fn open_registry(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<CorpusRegistry> {
    let mut registry = CorpusRegistry::load(store).context("Failed to load corpus registry")?;
    reference::install_reference_corpus(
        &mut registry,
        &config.corpus,
        &Segmenter::new(config.segmentation),
    );
    Ok(registry)
}

pub fn run_segment(config: &Config, path: &Path) -> Result<()> {
    let text = extract::extract_file(path)
        .with_context(|| format!("Failed to extract {}", path.display()))?;
    let (units, mode) = Segmenter::new(config.segmentation).segment_with_mode(&text);
    eprintln!("{} units ({:?})", units.len(), mode);
    for (i, unit) in units.iter().enumerate() {
        println!("[{}] {}", i + 1, unit);
    }
    Ok(())
}

pub fn run_add(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let store = open_store(config)?;
    let mut registry = open_registry(config, store)?;
    let options = IngestOptions {
        segmenter: Segmenter::new(config.segmentation),
        max_file_bytes: config.corpus.max_file_bytes,
    };

    let outcomes = ingest::ingest_paths(&mut registry, paths, &options, &config.corpus)?;
    if outcomes.is_empty() {
        bail!("No matching files found");
    }

    let mut ok = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(units) => {
                ok += 1;
                println!(
                    "ok     {} ({} units)",
                    ingest::entry_name(&outcome.path),
                    units
                );
            }
            Err(e) => println!("error  {}", e),
        }
    }
    println!("{} of {} files added", ok, outcomes.len());

    if ok == 0 {
        bail!("No file could be added");
    }
    Ok(())
}

pub fn run_list(config: &Config) -> Result<()> {
    let registry = open_registry(config, open_store(config)?)?;
    println!("{:<40} {:<6} {:<9} UNITS", "NAME", "KIND", "SELECTED");
    for entry in registry.entries() {
        println!(
            "{:<40} {:<6} {:<9} {}",
            entry.name(),
            if entry.is_core() { "core" } else { "user" },
            entry.is_selected(),
            entry.units().len()
        );
    }
    Ok(())
}

pub fn run_show(config: &Config, name: &str) -> Result<()> {
    let registry = open_registry(config, open_store(config)?)?;
    let Some(entry) = registry.get(name) else {
        bail!("Corpus entry not found: {}", name);
    };
    for (i, unit) in entry.units().iter().enumerate() {
        println!("[{}] {}", i + 1, unit);
    }
    Ok(())
}

pub fn run_toggle(config: &Config, name: &str) -> Result<()> {
    let mut registry = open_registry(config, open_store(config)?)?;
    let selected = registry.toggle_selected(name)?;
    println!(
        "{} {}",
        name,
        if selected { "selected" } else { "deselected" }
    );
    Ok(())
}

pub fn run_remove(config: &Config, name: &str) -> Result<()> {
    let mut registry = open_registry(config, open_store(config)?)?;
    registry.remove_entry(name)?;
    println!("removed {}", name);
    Ok(())
}

pub fn run_context(config: &Config) -> Result<()> {
    let registry = open_registry(config, open_store(config)?)?;
    let context = build_context_checked(registry.entries(), config.context.warn_chars);
    if !context.is_empty() {
        println!("{}", context);
    }
    Ok(())
}
