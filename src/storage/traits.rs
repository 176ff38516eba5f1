//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::JobStatus;
use crate::storage::{CrawlJob, ProbeResult};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Jobs, edges and probe results are all scoped to a job id. Implementations
/// must enforce the one-probe-per-(job, url) rule themselves so that callers
/// racing on the same URL cannot create duplicates.
pub trait Storage {
    // ===== Job Management =====

    /// Creates a new crawl job in the `in_progress` state
    ///
    /// # Arguments
    ///
    /// * `root_url` - The normalized root URL
    /// * `requester` - Opaque attribution token
    /// * `config_hash` - Hash of the configuration the job runs with
    ///
    /// # Returns
    ///
    /// The ID of the newly created job
    fn create_job(&mut self, root_url: &str, requester: &str, config_hash: &str)
        -> StorageResult<i64>;

    /// Gets a job by ID
    fn get_job(&self, job_id: i64) -> StorageResult<CrawlJob>;

    /// Gets the most recently created job
    fn latest_job(&self) -> StorageResult<Option<CrawlJob>>;

    /// Moves a job into a terminal status and stamps its finish time
    fn finish_job(
        &mut self,
        job_id: i64,
        status: JobStatus,
        pages_visited: usize,
    ) -> StorageResult<()>;

    // ===== Edges =====

    /// Records one edge per entry of `urls`, all from `source_url`
    ///
    /// Duplicates are kept: a page that links to the same URL twice yields
    /// two edges.
    fn insert_edges(&mut self, job_id: i64, source_url: &str, urls: &[String])
        -> StorageResult<()>;

    /// Returns the distinct pages that linked to `url`, in discovery order
    fn sources_for(&self, job_id: i64, url: &str) -> StorageResult<Vec<String>>;

    /// Counts the edges recorded for a job
    fn count_edges(&self, job_id: i64) -> StorageResult<u64>;

    // ===== Probes =====

    /// Checks whether a probe result exists for (job, url)
    fn has_probe(&self, job_id: i64, url: &str) -> StorageResult<bool>;

    /// Stores a probe result unless one already exists for (job, url)
    ///
    /// # Returns
    ///
    /// `true` if the result was stored, `false` if it was already present
    fn insert_probe_if_absent(&mut self, probe: &ProbeResult) -> StorageResult<bool>;

    /// Gets the probe result for (job, url)
    fn get_probe(&self, job_id: i64, url: &str) -> StorageResult<Option<ProbeResult>>;

    /// Gets every probe result of a job, in insertion order
    fn probes_for_job(&self, job_id: i64) -> StorageResult<Vec<ProbeResult>>;

    /// Counts the probe results recorded for a job
    fn count_probes(&self, job_id: i64) -> StorageResult<u64>;
}
