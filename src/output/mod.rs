//! Output module for generating reports and summaries
//!
//! This module handles:
//! - Building error reports (failing URL -> referring pages)
//! - Severity classification of probe results
//! - Per-job statistics
//! - Markdown and JSON export

mod markdown;
pub mod report;
pub mod severity;
pub mod stats;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use report::{get_report, severity_at_least, status_is, ErrorReport};
pub use severity::severity;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
