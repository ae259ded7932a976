//! Key-value persistence abstraction.
//!
//! The registry and the history store persist whole JSON blobs under a
//! handful of fixed keys. The [`KeyValueStore`] trait is the only thing
//! they know about storage, so the same code runs against a directory of
//! JSON files, an in-memory map in tests, or browser storage in a WASM host.
//!
//! Every persisted value is a versioned envelope (see [`Versioned`]).

pub mod memory;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Key under which the corpus registry is stored.
pub const CORPUS_KEY: &str = "corpus";

/// Current envelope version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Key under which a document's snapshot history is stored.
pub fn history_key(document_id: &str) -> String {
    format!("history.{document_id}")
}

/// Abstract blob storage.
///
/// Implementations must be `Send + Sync`; callers share one store between
/// the registry and the history store.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// On-disk envelope: `{ "version": 1, "data": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u32,
    pub data: T,
}

/// Serialize `data` in the current envelope.
pub fn encode<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string(&Versioned {
        version: SCHEMA_VERSION,
        data,
    })?)
}

/// Decode an enveloped value, handing unversioned payloads to `legacy`.
///
/// `legacy` receives the raw JSON when the value is not an object with a
/// `version` field, which is how values written before the envelope look.
pub fn decode<T, F>(key: &str, raw: &str, legacy: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce(serde_json::Value) -> Result<T>,
{
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let version = value.get("version").and_then(serde_json::Value::as_u64);
    match version {
        None => legacy(value),
        Some(v) if v == u64::from(SCHEMA_VERSION) => {
            let envelope: Versioned<T> =
                serde_json::from_value(value).map_err(|e| CoreError::Schema {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(envelope.data)
        }
        Some(v) => Err(CoreError::Schema {
            key: key.to_string(),
            reason: format!("unsupported version {v}"),
        }),
    }
}
