//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! per-job statistics from the storage layer.

use crate::output::severity::{severity, MAX_SEVERITY};
use crate::state::{FailureKind, JobStatus};
use crate::storage::Storage;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Crawl statistics for one job
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStatistics {
    pub job_id: i64,

    pub status: JobStatus,

    /// Size of the visited set when the job finished
    pub pages_visited: usize,

    /// Total number of probe results
    pub total_probes: u64,

    /// Total number of edges (one per discovered hyperlink)
    pub total_links: u64,

    /// Count of probe results by HTTP status code
    pub by_status: BTreeMap<u16, u64>,

    /// Count of probe results by failure kind
    pub by_failure: BTreeMap<FailureKind, u64>,

    /// Results recorded without a request (pseudo-links, skipped flat files)
    pub unchecked: u64,

    /// Count of probe results by severity, index = severity
    pub by_severity: Vec<u64>,
}

impl CrawlStatistics {
    /// Returns the number of results with severity > 0
    pub fn problem_count(&self) -> u64 {
        self.by_severity.iter().skip(1).sum()
    }
}

/// Loads statistics for a job from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `job_id` - The job to summarize
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(ScanError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage, job_id: i64) -> Result<CrawlStatistics> {
    let job = storage.get_job(job_id)?;
    let probes = storage.probes_for_job(job_id)?;
    let total_links = storage.count_edges(job_id)?;

    let mut by_status = BTreeMap::new();
    let mut by_failure = BTreeMap::new();
    let mut unchecked = 0;
    let mut by_severity = vec![0; MAX_SEVERITY as usize + 1];

    for probe in &probes {
        match (probe.status_code, probe.failure_kind) {
            (Some(code), _) => *by_status.entry(code).or_insert(0) += 1,
            (None, Some(kind)) => *by_failure.entry(kind).or_insert(0) += 1,
            (None, None) => unchecked += 1,
        }
        by_severity[severity(probe) as usize] += 1;
    }

    Ok(CrawlStatistics {
        job_id,
        status: job.status,
        pages_visited: job.pages_visited,
        total_probes: probes.len() as u64,
        total_links,
        by_status,
        by_failure,
        unchecked,
        by_severity,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics (job {}) ===\n", stats.job_id);

    println!("Overview:");
    println!("  Status: {}", stats.status);
    if stats.status.is_partial() {
        println!("  (traversal stopped early; results may be incomplete)");
    }
    println!("  Pages visited: {}", stats.pages_visited);
    println!("  Links found: {}", stats.total_links);
    println!("  Unique URLs probed: {}", stats.total_probes);
    println!();

    if !stats.by_status.is_empty() {
        println!("Responses by Status:");
        for (code, count) in &stats.by_status {
            println!("  {}: {}", code, count);
        }
        println!();
    }

    if !stats.by_failure.is_empty() {
        println!("Request Failures:");
        for (kind, count) in &stats.by_failure {
            println!("  {} ({}): {}", kind, kind.description(), count);
        }
        println!();
    }

    if stats.unchecked > 0 {
        println!("Not checked: {}\n", stats.unchecked);
    }

    println!("By Severity:");
    for (level, count) in stats.by_severity.iter().enumerate() {
        println!("  {}: {}", level, count);
    }
    println!();

    println!(
        "Problems: {} of {} probed URLs",
        stats.problem_count(),
        stats.total_probes
    );
}
