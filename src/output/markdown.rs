//! Markdown report generation
//!
//! This module renders a job, its statistics and its error report as a
//! human-readable markdown document.

use crate::output::report::ErrorReport;
use crate::output::severity::severity;
use crate::output::stats::CrawlStatistics;
use crate::output::OutputResult;
use crate::storage::{CrawlJob, ProbeResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report to disk
///
/// # Arguments
///
/// * `job` - The finished job
/// * `stats` - Statistics for the job
/// * `report` - The error report to list
/// * `probes` - Probe results of the job, used for the outcome columns
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn generate_markdown_report(
    job: &CrawlJob,
    stats: &CrawlStatistics,
    report: &ErrorReport,
    probes: &[ProbeResult],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(job, stats, report, probes);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a job report as markdown
pub fn format_markdown_report(
    job: &CrawlJob,
    stats: &CrawlStatistics,
    report: &ErrorReport,
    probes: &[ProbeResult],
) -> String {
    let mut md = String::new();

    md.push_str("# Linkscan Report\n\n");

    // Job metadata
    md.push_str("## Job Information\n\n");
    md.push_str(&format!("- **Job ID**: {}\n", job.id));
    md.push_str(&format!("- **Root URL**: {}\n", job.root_url));
    md.push_str(&format!("- **Requested by**: {}\n", job.requester));
    md.push_str(&format!("- **Started**: {}\n", job.started_at));
    if let Some(finished) = &job.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    md.push_str(&format!("- **Status**: {}\n", job.status));
    if !job.config_hash.is_empty() {
        md.push_str(&format!("- **Config Hash**: {}\n", job.config_hash));
    }
    md.push('\n');

    if job.is_partial() {
        md.push_str(
            "> Traversal stopped before every page was visited. \
             Links on unvisited pages are missing from this report.\n\n",
        );
    }

    // Overall statistics
    md.push_str("## Statistics\n\n");
    md.push_str(&format!("- **Pages Visited**: {}\n", stats.pages_visited));
    md.push_str(&format!("- **Links Found**: {}\n", stats.total_links));
    md.push_str(&format!("- **URLs Probed**: {}\n", stats.total_probes));
    md.push_str(&format!("- **Problems**: {}\n\n", stats.problem_count()));

    md.push_str("| Severity | Count |\n");
    md.push_str("|----------|-------|\n");
    for (level, count) in stats.by_severity.iter().enumerate() {
        md.push_str(&format!("| {} | {} |\n", level, count));
    }
    md.push('\n');

    // Reported links
    md.push_str(&format!("## Reported Links ({})\n\n", report.len()));

    if report.is_empty() {
        md.push_str("No links matched.\n");
        return md;
    }

    let by_url: HashMap<&str, &ProbeResult> =
        probes.iter().map(|probe| (probe.url.as_str(), probe)).collect();

    md.push_str("| URL | Outcome | Severity | Linked From |\n");
    md.push_str("|-----|---------|----------|-------------|\n");

    for (url, sources) in &report.entries {
        let probe = by_url.get(url.as_str());
        let outcome = probe.map(|p| describe_outcome(p)).unwrap_or_default();
        let level = probe.map(|p| severity(p).to_string()).unwrap_or_default();
        let linked_from = if sources.is_empty() {
            "(root)".to_string()
        } else {
            sources.join("<br>")
        };

        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(url),
            escape_cell(&outcome),
            level,
            escape_cell(&linked_from)
        ));
    }

    md
}

/// Short text for a probe outcome
fn describe_outcome(probe: &ProbeResult) -> String {
    match (probe.status_code, probe.failure_kind, &probe.note) {
        (Some(code), _, _) => format!("HTTP {}", code),
        (None, Some(kind), _) => kind.description().to_string(),
        (None, None, Some(note)) => note.clone(),
        (None, None, None) => String::new(),
    }
}

/// Escapes pipe characters so they don't break the table
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
