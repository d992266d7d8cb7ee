//! Document storage for data models.
//!
//! A [`ModelStore`] persists whole [`DataModel`] documents: every save
//! overwrites the stored document, and there are no multi-document
//! transactions. Two implementations are provided:
//!
//! - [`FileStore`]: one pretty-printed JSON file per model
//! - [`SqliteStore`]: a single SQLite database, with content fingerprints
//!   for optimistic compare-and-swap
//!
//! Concurrent writers must be serialized by the caller, either by holding a
//! lock per model id or via [`SqliteStore::save_if_unchanged`].

mod file;
mod hash;
mod sqlite;

pub use file::FileStore;
pub use hash::fingerprint;
pub use sqlite::SqliteStore;

use tracing::debug;

use crate::config::{StoreBackend, StoreSettings};
use crate::model::{DataModel, ModelSummary};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Invalid model id '{0}': use letters, digits, '-' or '_'")]
    InvalidId(String),

    /// The stored document changed since it was read.
    #[error("Model '{id}' was modified concurrently")]
    Conflict { id: String },

    #[error("Unsupported store version {found} (expected {expected})")]
    UnsupportedVersion { found: String, expected: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::SettingsError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for model documents.
pub trait ModelStore {
    /// Write the whole document, replacing any previous version.
    fn save(&self, model: &DataModel) -> StoreResult<()>;

    /// Read a document, or `None` if there is none with this id.
    fn load(&self, id: &str) -> StoreResult<Option<DataModel>>;

    /// Summaries, newest first (ties broken by id), optionally for one owner.
    fn list(&self, owner: Option<&str>) -> StoreResult<Vec<ModelSummary>>;

    /// Remove a document. Returns whether one existed.
    fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Like [`load`](ModelStore::load), but a missing document is an error.
    fn load_required(&self, id: &str) -> StoreResult<DataModel> {
        self.load(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

/// Open the store described by `settings`.
pub fn open_store(settings: &StoreSettings) -> StoreResult<Box<dyn ModelStore>> {
    let path = settings.resolved_path()?;
    debug!(backend = %settings.backend, path = %path.display(), "opening model store");
    Ok(match settings.backend {
        StoreBackend::File => Box::new(FileStore::open(path)?),
        StoreBackend::Sqlite => Box::new(SqliteStore::open(path)?),
    })
}

/// Reject ids that are empty or could escape a storage directory.
pub(crate) fn check_id(id: &str) -> StoreResult<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Newest first, then by id.
pub(crate) fn sort_summaries(summaries: &mut [ModelSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}
