//! Linkscan: a recursive broken-link checker
//!
//! This crate crawls a website from a root URL, probes every link it finds
//! (internal and external), and reports failing links together with the pages
//! that referenced them.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Linkscan operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid root URL '{url}': {source}")]
    InvalidRoot { url: String, source: UrlError },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Crawl job not found: {0}")]
    JobNotFound(i64),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Linkscan operations
pub type Result<T> = std::result::Result<T, ScanError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{start_crawl, Coordinator};
pub use output::{get_report, severity, ErrorReport};
pub use state::{FailureKind, JobStatus};
pub use storage::{CrawlJob, ProbeResult};
pub use url::{is_internal, normalize, resolve_relative, strip_scheme};
