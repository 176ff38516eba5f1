//! Error report generation
//!
//! A report maps every probed URL that matches a predicate to the distinct
//! pages that linked to it.

use crate::output::severity::severity;
use crate::storage::{ProbeResult, Storage, StorageError};
use crate::{Result, ScanError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Failing links of one job and the pages that referenced them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub job_id: i64,

    /// Normalized URL -> distinct source pages, in discovery order
    pub entries: BTreeMap<String, Vec<String>>,
}

impl ErrorReport {
    /// Returns the number of reported URLs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the pages that linked to `url`, if it is reported
    pub fn sources(&self, url: &str) -> Option<&[String]> {
        self.entries.get(url).map(Vec::as_slice)
    }

    /// Serializes the report as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds the report of a job
///
/// Every probe result satisfying `predicate` becomes a key, including URLs
/// with no recorded edge (the root), which map to an empty list.
///
/// # Arguments
///
/// * `storage` - The storage backend holding the job
/// * `job_id` - The job to report on
/// * `predicate` - Selects the probe results to report
///
/// # Returns
///
/// * `Ok(ErrorReport)` - The report
/// * `Err(ScanError)` - The job does not exist or storage failed
pub fn get_report<P>(storage: &dyn Storage, job_id: i64, predicate: P) -> Result<ErrorReport>
where
    P: Fn(&ProbeResult) -> bool,
{
    storage.get_job(job_id).map_err(|e| match e {
        StorageError::JobNotFound(id) => ScanError::JobNotFound(id),
        other => other.into(),
    })?;

    let mut entries = BTreeMap::new();
    for probe in storage.probes_for_job(job_id)? {
        if predicate(&probe) {
            let sources = storage.sources_for(job_id, &probe.url)?;
            entries.insert(probe.url, sources);
        }
    }

    tracing::debug!("Report for job {}: {} entries", job_id, entries.len());

    Ok(ErrorReport { job_id, entries })
}

/// Predicate matching one HTTP status code
pub fn status_is(code: u16) -> impl Fn(&ProbeResult) -> bool {
    move |probe| probe.status_code == Some(code)
}

/// Predicate matching results at or above a severity level
pub fn severity_at_least(level: u8) -> impl Fn(&ProbeResult) -> bool {
    move |probe| severity(probe) >= level
}
