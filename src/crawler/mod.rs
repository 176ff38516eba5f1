//! Crawler module for page fetching, link probing and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and flat-file detection
//! - HTML parsing and link extraction
//! - Link probing with failure classification
//! - The depth-first frontier and overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod prober;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, fetch_links, fetch_page, is_flat_file, FetchResult, PageLinks,
    PAGE_EXTENSIONS,
};
pub use frontier::{Frontier, NextPage, QueuedPage};
pub use parser::{decode_unicode_escapes, extract_hrefs};
pub use prober::{classify_error, classify_url_error, Prober, FLAT_FILE_NOTE, PSEUDO_LINK_NOTE};

use crate::config::Config;
use crate::storage::{CrawlJob, SharedStorage};
use crate::Result;

/// Runs a complete crawl and returns the finished job
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the root URL and create the job record
/// 2. Probe the root
/// 3. Visit internal pages depth-first, probing every discovered link
/// 4. Stop when the site is exhausted or the page limit is reached
///
/// The returned job's `id` is the handle for [`crate::output::get_report`].
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `storage` - Where results are recorded
/// * `root_url` - The starting page
/// * `requester` - Opaque attribution stored on the job
///
/// # Returns
///
/// * `Ok(CrawlJob)` - Crawl finished (completed or limit exceeded)
/// * `Err(ScanError)` - Invalid root URL or storage failure
pub async fn start_crawl(
    config: Config,
    storage: SharedStorage,
    root_url: &str,
    requester: &str,
) -> Result<CrawlJob> {
    Coordinator::new(config, storage, root_url, requester, "")?
        .run()
        .await
}
