//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Crawl job lifecycle records
//! - Source page -> link edges used for report attribution
//! - Probe results, stored at most once per (job, url)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::{FailureKind, JobStatus};
use crate::ScanError;

use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between the coordinator and concurrent probes
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file, or `:memory:`
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(ScanError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ScanError> {
    if path.as_os_str() == ":memory:" {
        return SqliteStorage::new_in_memory();
    }
    SqliteStorage::new(path)
}

/// Wraps a storage backend for sharing across tasks
pub fn share<S: Storage + Send + 'static>(storage: S) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks shared storage, mapping poisoning to a storage error
///
/// The guard must never be held across an `.await`.
pub fn lock(
    storage: &SharedStorage,
) -> StorageResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Represents a crawl job
#[derive(Debug, Clone, Serialize)]
pub struct CrawlJob {
    pub id: i64,
    pub root_url: String,
    pub requester: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: JobStatus,
    pub pages_visited: usize,
    pub config_hash: String,
}

impl CrawlJob {
    /// Returns true if traversal stopped before covering the whole site
    pub fn is_partial(&self) -> bool {
        self.status.is_partial()
    }
}

/// Represents the outcome of checking one link within a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub job_id: i64,
    /// Link text as it appeared in the page
    pub url_raw: String,
    /// Normalized form, unique per job
    pub url: String,
    pub status_code: Option<u16>,
    pub failure_kind: Option<FailureKind>,
    pub note: Option<String>,
    pub checked_at: String,
}

impl ProbeResult {
    /// Returns true for a 2xx response
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}
