//! Ingestion pipeline for user-supplied support documents.
//!
//! `file → extract → segment → registry`. A batch keeps going past failing
//! files and reports the outcome of each one, so one unreadable PDF never
//! blocks the rest of an upload.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use tr_genius_core::corpus::CorpusRegistry;
use tr_genius_core::models::CorpusEntry;
use tr_genius_core::segment::Segmenter;
use tr_genius_core::CoreError;

use crate::config::CorpusConfig;
use crate::extract::{self, ExtractError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{file}: {source}")]
    Extraction {
        file: String,
        #[source]
        source: ExtractError,
    },

    #[error("{file}: no usable content after segmentation")]
    NoUsableContent { file: String },

    #[error("{file}: {size} bytes exceeds the {limit}-byte limit")]
    TooLarge { file: String, size: u64, limit: u64 },

    #[error(transparent)]
    Registry(#[from] CoreError),
}

/// Per-run ingestion settings.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub segmenter: Segmenter,
    pub max_file_bytes: u64,
}

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Number of units registered, or why the file was skipped.
    pub result: std::result::Result<usize, IngestError>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Registry name for a file: its file name without directories.
pub fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract, segment and register one file as a selected user entry.
///
/// The duplicate-name check runs before any extraction work.
pub fn ingest_file(
    registry: &mut CorpusRegistry,
    path: &Path,
    options: &IngestOptions,
) -> std::result::Result<usize, IngestError> {
    let name = entry_name(path);
    if registry.contains(&name) {
        return Err(CoreError::DuplicateName(name).into());
    }

    let size = std::fs::metadata(path)
        .map_err(|e| IngestError::Extraction {
            file: name.clone(),
            source: ExtractError::Io(e),
        })?
        .len();
    if size > options.max_file_bytes {
        return Err(IngestError::TooLarge {
            file: name,
            size,
            limit: options.max_file_bytes,
        });
    }

    let text = extract::extract_file(path).map_err(|source| IngestError::Extraction {
        file: name.clone(),
        source,
    })?;
    let (units, mode) = options.segmenter.segment_with_mode(&text);
    debug!(file = %name, ?mode, units = units.len(), "segmented file");
    if units.is_empty() {
        return Err(IngestError::NoUsableContent { file: name });
    }

    let count = units.len();
    registry.add_entry(CorpusEntry::user(name, units))?;
    Ok(count)
}

/// Ingest every file under `paths`.
///
/// Files named directly are taken as-is. Directories are walked and
/// filtered through the include/exclude globs, relative to the directory.
pub fn ingest_paths(
    registry: &mut CorpusRegistry,
    paths: &[PathBuf],
    options: &IngestOptions,
    corpus: &CorpusConfig,
) -> Result<Vec<FileOutcome>> {
    let files = collect_files(paths, corpus)?;
    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let result = ingest_file(registry, &path, options);
        match &result {
            Ok(units) => info!(file = %path.display(), units, "ingested file"),
            Err(e) => warn!(file = %path.display(), error = %e, "skipped file"),
        }
        outcomes.push(FileOutcome { path, result });
    }
    Ok(outcomes)
}

/// Expand `paths` into the list of files to ingest, in a stable order.
pub fn collect_files(paths: &[PathBuf], corpus: &CorpusConfig) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(&corpus.include_globs)?;
    let exclude_set = build_globset(&corpus.exclude_globs)?;

    let mut files = Vec::new();
    for root in paths {
        if !root.is_dir() {
            files.push(root.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if exclude_set.is_match(relative) || !include_set.is_match(relative) {
                continue;
            }
            found.push(path.to_path_buf());
        }
        // Sort for deterministic ordering
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
