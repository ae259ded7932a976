//! # TR Genius
//!
//! Support-document corpus, version history and word-level diffs for
//! public procurement documents: the ETP (Estudo Técnico Preliminar) and
//! the TR (Termo de Referência).
//!
//! The algorithms live in [`tr_genius_core`]; this crate adds the
//! filesystem around them and the `trg` binary.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ PDF/DOCX/TXT│──▶│  Segmenter  │──▶│   Registry   │──▶ context block
//! │  extract    │   │ art./parag. │   │ core + user  │
//! └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                            │
//! ┌─────────────┐   ┌─────────────┐   ┌──────▼───────┐
//! │ state.json  │──▶│  Snapshots  │──▶│  FileStore   │
//! └─────────────┘   └──────┬──────┘   └──────────────┘
//!                          ▼
//!                    word diff per section
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`store`] | File-backed key-value store |
//! | [`extract`] | PDF / DOCX / TXT text extraction |
//! | [`ingest`] | File ingestion into the corpus registry |
//! | [`reference`] | Core reference corpus loading |
//! | [`corpus_cmd`] | Corpus and context commands |
//! | [`doc_cmd`] | Document history commands |

pub mod config;
pub mod corpus_cmd;
pub mod doc_cmd;
pub mod extract;
pub mod ingest;
pub mod reference;
pub mod store;
