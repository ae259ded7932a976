//! # TR Genius Core
//!
//! The content layer behind TR Genius: turning extracted documents into
//! retrieval units, keeping the selectable corpus that grounds generation
//! requests, and tracking document history with a word-level diff.
//!
//! This crate performs no filesystem or network I/O. Persistence goes
//! through the [`store::KeyValueStore`] trait, which callers construct and
//! hand to the [`corpus::CorpusRegistry`] and [`history::SnapshotStore`].
//!
//! ```text
//! text ──▶ segment ──▶ CorpusRegistry ──▶ build_context ──▶ prompt
//!
//! save ──▶ SnapshotStore::record_if_changed ──▶ history ──▶ diff
//! ```

pub mod context;
pub mod corpus;
pub mod diff;
pub mod error;
pub mod history;
pub mod models;
pub mod segment;
pub mod store;

pub use error::{CoreError, Result};
