//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! a crawl job, including:
//! - Creating the job record and probing the root
//! - Driving the depth-first frontier
//! - Recording an edge for every discovered link
//! - Fanning out probes for the links of each page
//! - Stopping on page limit or cancellation and finalizing the job

use crate::config::{validate, Config};
use crate::crawler::fetcher::{build_http_client, fetch_links, is_flat_file};
use crate::crawler::frontier::{Frontier, NextPage, QueuedPage};
use crate::crawler::prober::Prober;
use crate::state::JobStatus;
use crate::storage::{self, CrawlJob, SharedStorage};
use crate::url::{
    ensure_scheme, is_internal, is_pseudo_link, is_under, normalize, request_target,
    resolve_relative,
};
use crate::{Result, ScanError};
use futures::future;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// A hyperlink found on a page, in its three forms
#[derive(Debug, Clone)]
struct DiscoveredLink {
    raw: String,
    resolved: String,
    key: String,
}

/// Main crawler coordinator structure
///
/// One coordinator drives exactly one job; all traversal state lives here and
/// is dropped with it.
pub struct Coordinator {
    config: Config,
    storage: SharedStorage,
    fetch_client: Client,
    prober: Prober,
    frontier: Frontier,
    job: CrawlJob,
    root_raw: String,
    root_url: String,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator and its job record
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - Where the job, edges and probe results are recorded
    /// * `root_url` - Starting page; a missing scheme defaults to `http://`
    /// * `requester` - Opaque attribution stored on the job
    /// * `config_hash` - Hash of the configuration, stored on the job
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Job created, ready to run
    /// * `Err(ScanError::Config)` - The configuration is out of range
    /// * `Err(ScanError::InvalidRoot)` - The root cannot be requested over HTTP(S)
    pub fn new(
        config: Config,
        storage: SharedStorage,
        root_url: &str,
        requester: &str,
        config_hash: &str,
    ) -> Result<Self> {
        validate(&config)?;

        let root_raw = root_url.trim().to_string();
        let root_target =
            request_target(&ensure_scheme(&root_raw)).map_err(|source| ScanError::InvalidRoot {
                url: root_raw.clone(),
                source,
            })?;
        let root_url = root_target.to_string();
        let root_key = normalize(&root_url);

        let fetch_client =
            build_http_client(&config, config.crawler.accept_invalid_certs_on_fetch)?;
        let probe_client = build_http_client(&config, false)?;

        let job = {
            let mut guard = storage::lock(&storage)?;
            let job_id = guard.create_job(&root_key, requester, config_hash)?;
            guard.get_job(job_id)?
        };

        let prober = Prober::new(
            probe_client,
            storage.clone(),
            job.id,
            config.crawler.probe_flat_files,
        );
        let frontier = Frontier::new(config.crawler.page_limit);

        Ok(Self {
            config,
            storage,
            fetch_client,
            prober,
            frontier,
            job,
            root_raw,
            root_url,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the cancellation token, e.g. with one tied to Ctrl-C
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle that aborts the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the job as created (status `in_progress`)
    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    /// Runs the crawl to completion
    ///
    /// The root is probed first, then internal pages are visited depth-first.
    /// The job ends `Completed` when no unvisited page is left,
    /// `LimitExceeded` when the page limit stops traversal, and `Cancelled`
    /// when the token fires. Probes already in flight finish and are recorded.
    ///
    /// # Returns
    ///
    /// The finalized job record
    pub async fn run(mut self) -> Result<CrawlJob> {
        let job_id = self.job.id;
        tracing::info!("Starting crawl job {} for {}", job_id, self.job.root_url);
        let start_time = Instant::now();

        if !self.cancel.is_cancelled() {
            self.prober.probe(&self.root_raw, &self.root_url).await?;
        }

        self.frontier
            .push(QueuedPage::new(self.root_url.clone(), self.job.root_url.clone()));

        let status = loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Crawl job {} cancelled", job_id);
                break JobStatus::Cancelled;
            }

            match self.frontier.next_page() {
                NextPage::Page(page) => {
                    self.process_page(&page).await?;

                    let visited = self.frontier.visited_count();
                    if visited % 10 == 0 {
                        let rate = visited as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages visited, {} pending, {:.2} pages/sec",
                            visited,
                            self.frontier.pending(),
                            rate
                        );
                    }
                }
                NextPage::LimitReached => {
                    tracing::warn!(
                        "Page limit of {} reached, stopping crawl job {}",
                        self.config.crawler.page_limit,
                        job_id
                    );
                    self.frontier.clear();
                    break JobStatus::LimitExceeded;
                }
                NextPage::Exhausted => break JobStatus::Completed,
            }
        };

        let pages_visited = self.frontier.visited_count();
        let job = {
            let mut guard = storage::lock(&self.storage)?;
            guard.finish_job(job_id, status, pages_visited)?;
            guard.get_job(job_id)?
        };

        tracing::info!(
            "Crawl job {} {}: {} pages visited in {:?}",
            job_id,
            status,
            pages_visited,
            start_time.elapsed()
        );

        Ok(job)
    }

    /// Processes a single internal page
    ///
    /// This method:
    /// 1. Fetches the page and extracts its links
    /// 2. Resolves each link against the page's final URL and normalizes it
    /// 3. Records an edge per link
    /// 4. Probes every link
    /// 5. Queues the links that stay inside the root
    async fn process_page(&mut self, page: &QueuedPage) -> Result<()> {
        tracing::debug!("Processing page {}", page.url);

        let links = tokio::select! {
            links = fetch_links(&self.fetch_client, &page.url) => links,
            _ = self.cancel.cancelled() => return Ok(()),
        };

        if links.hrefs.is_empty() {
            return Ok(());
        }

        // Relative links resolve against where the page ended up after redirects
        let base_url = links.base_url;
        let discovered: Vec<DiscoveredLink> = links
            .hrefs
            .into_iter()
            .map(|raw| {
                let resolved = resolve_relative(&raw, &base_url, false);
                let key = normalize(&resolved);
                DiscoveredLink { raw, resolved, key }
            })
            .collect();

        let targets: Vec<String> = discovered.iter().map(|link| link.key.clone()).collect();
        storage::lock(&self.storage)?.insert_edges(self.job.id, &page.key, &targets)?;

        self.probe_all(&discovered).await?;

        if self.cancel.is_cancelled() {
            return Ok(());
        }

        let children: Vec<QueuedPage> = discovered
            .iter()
            .filter(|link| self.is_followable(link))
            .map(|link| QueuedPage::new(link.resolved.clone(), link.key.clone()))
            .collect();

        tracing::debug!(
            "Page {}: {} links, {} to follow",
            page.key,
            discovered.len(),
            children.len()
        );

        self.frontier.push_children(children);
        Ok(())
    }

    /// Probes all links of one page with bounded concurrency
    ///
    /// No new probe starts once the job is cancelled.
    async fn probe_all(&self, links: &[DiscoveredLink]) -> Result<()> {
        let prober = &self.prober;
        let cancel = &self.cancel;

        let results: Vec<_> = stream::iter(links)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|link| prober.probe(&link.raw, &link.resolved))
            .buffer_unordered(self.config.crawler.max_concurrent_probes)
            .collect()
            .await;

        for result in results {
            result?;
        }
        Ok(())
    }

    /// Checks if a link should have its own links enumerated
    ///
    /// Followed links are internal, lie under the root's path, and are
    /// neither pseudo-links nor flat files. Everything else is probed only.
    fn is_followable(&self, link: &DiscoveredLink) -> bool {
        !is_pseudo_link(&link.resolved)
            && is_internal(&link.raw, &self.job.root_url)
            && is_under(&link.key, &self.job.root_url)
            && !is_flat_file(&link.resolved)
            && !self.frontier.is_visited(&link.key)
    }
}
