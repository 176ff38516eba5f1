//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{FailureKind, JobStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CrawlJob, ProbeResult};
use crate::ScanError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const JOB_COLUMNS: &str =
    "id, root_url, requester, started_at, finished_at, status, pages_visited, config_hash";

const PROBE_COLUMNS: &str =
    "job_id, url_raw, url, status_code, failure_kind, note, checked_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScanError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScanError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    ///
    /// Used by tests and by runs that only print their report.
    pub fn new_in_memory() -> Result<Self, ScanError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlJob> {
    Ok(CrawlJob {
        id: row.get(0)?,
        root_url: row.get(1)?,
        requester: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        status: JobStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(JobStatus::InProgress),
        pages_visited: row.get::<_, i64>(6)?.max(0) as usize,
        config_hash: row.get(7)?,
    })
}

fn probe_from_row(row: &Row<'_>) -> rusqlite::Result<ProbeResult> {
    let failure_kind: Option<String> = row.get(4)?;
    Ok(ProbeResult {
        job_id: row.get(0)?,
        url_raw: row.get(1)?,
        url: row.get(2)?,
        status_code: row.get(3)?,
        failure_kind: failure_kind
            .as_deref()
            .map(|tag| FailureKind::from_tag(tag).unwrap_or(FailureKind::Other)),
        note: row.get(5)?,
        checked_at: row.get(6)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Job Management =====

    fn create_job(
        &mut self,
        root_url: &str,
        requester: &str,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO jobs (root_url, requester, started_at, status, config_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                root_url,
                requester,
                now,
                JobStatus::InProgress.to_db_string(),
                config_hash
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_job(&self, job_id: i64) -> StorageResult<CrawlJob> {
        let sql = format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS);
        self.conn
            .query_row(&sql, params![job_id], job_from_row)
            .optional()?
            .ok_or(StorageError::JobNotFound(job_id))
    }

    fn latest_job(&self) -> StorageResult<Option<CrawlJob>> {
        let sql = format!("SELECT {} FROM jobs ORDER BY id DESC LIMIT 1", JOB_COLUMNS);
        let job = self.conn.query_row(&sql, [], job_from_row).optional()?;
        Ok(job)
    }

    fn finish_job(
        &mut self,
        job_id: i64,
        status: JobStatus,
        pages_visited: usize,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE jobs SET status = ?1, finished_at = ?2, pages_visited = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, pages_visited as i64, job_id],
        )?;
        if updated == 0 {
            return Err(StorageError::JobNotFound(job_id));
        }
        Ok(())
    }

    // ===== Edges =====

    fn insert_edges(
        &mut self,
        job_id: i64,
        source_url: &str,
        urls: &[String],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO edges (job_id, source_url, url) VALUES (?1, ?2, ?3)")?;
            for url in urls {
                stmt.execute(params![job_id, source_url, url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn sources_for(&self, job_id: i64, url: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_url FROM edges WHERE job_id = ?1 AND url = ?2
             GROUP BY source_url ORDER BY MIN(id)",
        )?;
        let sources = stmt
            .query_map(params![job_id, url], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(sources)
    }

    fn count_edges(&self, job_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE job_id = ?1",
            params![job_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Probes =====

    fn has_probe(&self, job_id: i64, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM probes WHERE job_id = ?1 AND url = ?2",
                params![job_id, url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_probe_if_absent(&mut self, probe: &ProbeResult) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO probes
             (job_id, url_raw, url, status_code, failure_kind, note, checked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                probe.job_id,
                probe.url_raw,
                probe.url,
                probe.status_code,
                probe.failure_kind.map(|kind| kind.as_tag()),
                probe.note,
                probe.checked_at
            ],
        )?;
        Ok(inserted == 1)
    }

    fn get_probe(&self, job_id: i64, url: &str) -> StorageResult<Option<ProbeResult>> {
        let sql = format!(
            "SELECT {} FROM probes WHERE job_id = ?1 AND url = ?2",
            PROBE_COLUMNS
        );
        let probe = self
            .conn
            .query_row(&sql, params![job_id, url], probe_from_row)
            .optional()?;
        Ok(probe)
    }

    fn probes_for_job(&self, job_id: i64) -> StorageResult<Vec<ProbeResult>> {
        let sql = format!(
            "SELECT {} FROM probes WHERE job_id = ?1 ORDER BY id",
            PROBE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let probes = stmt
            .query_map(params![job_id], probe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(probes)
    }

    fn count_probes(&self, job_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM probes WHERE job_id = ?1",
            params![job_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failure_is_database_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SqliteStorage::new(dir.path()),
            Err(ScanError::Database(_))
        ));
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = SqliteStorage::new(&dir.path().join("linkscan.db")).unwrap();
        let job_id = storage.create_job("http://example.com", "tester", "").unwrap();
        assert_eq!(storage.get_job(job_id).unwrap().root_url, "http://example.com");
    }

    fn probe(job_id: i64, url: &str, status_code: Option<u16>) -> ProbeResult {
        ProbeResult {
            job_id,
            url_raw: url.to_string(),
            url: url.to_string(),
            status_code,
            failure_kind: None,
            note: None,
            checked_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_create_job() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let job_id = storage
            .create_job("http://example.com", "owner@example.com", "abc")
            .unwrap();
        let job = storage.get_job(job_id).unwrap();

        assert_eq!(job.root_url, "http://example.com");
        assert_eq!(job.requester, "owner@example.com");
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.finished_at, None);
        assert_eq!(job.config_hash, "abc");
    }

    #[test]
    fn test_get_missing_job() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_job(42),
            Err(StorageError::JobNotFound(42))
        ));
    }

    #[test]
    fn test_finish_job() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let job_id = storage.create_job("http://example.com", "me", "").unwrap();
        storage
            .finish_job(job_id, JobStatus::LimitExceeded, 7)
            .unwrap();

        let job = storage.get_job(job_id).unwrap();
        assert_eq!(job.status, JobStatus::LimitExceeded);
        assert_eq!(job.pages_visited, 7);
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn test_latest_job() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.latest_job().unwrap().is_none());

        storage.create_job("http://a.com", "me", "").unwrap();
        let second = storage.create_job("http://b.com", "me", "").unwrap();
        assert_eq!(storage.latest_job().unwrap().unwrap().id, second);
    }

    #[test]
    fn test_insert_probe_if_absent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let job_id = storage.create_job("http://example.com", "me", "").unwrap();

        assert!(storage
            .insert_probe_if_absent(&probe(job_id, "http://example.com/a", Some(200)))
            .unwrap());
        assert!(!storage
            .insert_probe_if_absent(&probe(job_id, "http://example.com/a", Some(500)))
            .unwrap());

        let stored = storage
            .get_probe(job_id, "http://example.com/a")
            .unwrap()
            .unwrap();
        assert_eq!(stored.status_code, Some(200));
        assert_eq!(storage.count_probes(job_id).unwrap(), 1);
    }

    #[test]
    fn test_same_url_in_two_jobs() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage.create_job("http://example.com", "me", "").unwrap();
        let second = storage.create_job("http://example.com", "me", "").unwrap();

        assert!(storage
            .insert_probe_if_absent(&probe(first, "http://example.com", Some(200)))
            .unwrap());
        assert!(storage
            .insert_probe_if_absent(&probe(second, "http://example.com", Some(200)))
            .unwrap());
        assert!(storage.has_probe(first, "http://example.com").unwrap());
        assert!(!storage.has_probe(first, "http://example.com/other").unwrap());
    }

    #[test]
    fn test_failure_kind_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let job_id = storage.create_job("http://example.com", "me", "").unwrap();

        let mut failed = probe(job_id, "http://down.example.com", None);
        failed.failure_kind = Some(FailureKind::Ssl);
        failed.note = Some(FailureKind::Ssl.description().to_string());
        storage.insert_probe_if_absent(&failed).unwrap();

        let stored = storage.probes_for_job(job_id).unwrap();
        assert_eq!(stored, vec![failed]);
    }

    #[test]
    fn test_sources_are_distinct_and_ordered() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let job_id = storage.create_job("http://example.com", "me", "").unwrap();
        let broken = "http://example.com/broken".to_string();

        storage
            .insert_edges(job_id, "http://example.com/b", &[broken.clone()])
            .unwrap();
        storage
            .insert_edges(
                job_id,
                "http://example.com/a",
                &[broken.clone(), broken.clone()],
            )
            .unwrap();
        storage
            .insert_edges(job_id, "http://example.com/b", &[broken.clone()])
            .unwrap();

        assert_eq!(
            storage.sources_for(job_id, &broken).unwrap(),
            vec!["http://example.com/b", "http://example.com/a"]
        );
        assert_eq!(storage.count_edges(job_id).unwrap(), 4);
        assert!(storage
            .sources_for(job_id, "http://example.com/none")
            .unwrap()
            .is_empty());
    }
}
