//! Link prober
//!
//! Checks one link per call and stores the outcome at most once per job.
//! Request failures never escape as errors: they are classified into a
//! [`FailureKind`] and stored like any other outcome.

use crate::crawler::fetcher::is_flat_file;
use crate::state::FailureKind;
use crate::storage::{self, ProbeResult, SharedStorage};
use crate::url::{is_pseudo_link, normalize, request_target};
use crate::{Result, UrlError};
use chrono::Utc;
use reqwest::Client;
use std::collections::HashSet;
use std::error::Error as StdError;
use tokio::sync::Mutex;

/// Note stored for `javascript:` and `mailto:` links
pub const PSEUDO_LINK_NOTE: &str = "Pseudo-link not checked";

/// Note stored for flat files when flat-file probing is disabled
pub const FLAT_FILE_NOTE: &str = "Flat file not checked";

/// Outcome of a single check, before it is attached to a job
#[derive(Debug, Clone, PartialEq, Eq)]
struct Outcome {
    status_code: Option<u16>,
    failure_kind: Option<FailureKind>,
    note: Option<String>,
}

impl Outcome {
    fn status(code: u16, reason: Option<&str>) -> Self {
        Self {
            status_code: Some(code),
            failure_kind: None,
            note: reason.map(str::to_string),
        }
    }

    fn failure(kind: FailureKind) -> Self {
        Self {
            status_code: None,
            failure_kind: Some(kind),
            note: Some(kind.description().to_string()),
        }
    }

    fn unchecked(note: &str) -> Self {
        Self {
            status_code: None,
            failure_kind: None,
            note: Some(note.to_string()),
        }
    }
}

/// Probes links for one crawl job
pub struct Prober {
    client: Client,
    storage: SharedStorage,
    job_id: i64,
    probe_flat_files: bool,
    claimed: Mutex<HashSet<String>>,
}

impl Prober {
    /// Creates a prober bound to a job
    ///
    /// `client` should verify certificates so TLS problems surface as
    /// [`FailureKind::Ssl`].
    pub fn new(client: Client, storage: SharedStorage, job_id: i64, probe_flat_files: bool) -> Self {
        Self {
            client,
            storage,
            job_id,
            probe_flat_files,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the job this prober records into
    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    /// Checks a link and records the result
    ///
    /// `raw_link` is the link text as discovered and `resolved` its absolute
    /// form. The normalized form of `resolved` identifies the link within the
    /// job.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(result))` - The link was checked and the result stored
    /// * `Ok(None)` - The link was already probed (or is being probed) in this job
    /// * `Err(ScanError)` - Storage failed
    pub async fn probe(&self, raw_link: &str, resolved: &str) -> Result<Option<ProbeResult>> {
        let key = normalize(resolved);

        if !self.claimed.lock().await.insert(key.clone()) {
            return Ok(None);
        }

        if storage::lock(&self.storage)?.has_probe(self.job_id, &key)? {
            return Ok(None);
        }

        let outcome = self.check(resolved).await;

        let result = ProbeResult {
            job_id: self.job_id,
            url_raw: raw_link.to_string(),
            url: key,
            status_code: outcome.status_code,
            failure_kind: outcome.failure_kind,
            note: outcome.note,
            checked_at: Utc::now().to_rfc3339(),
        };

        let inserted = storage::lock(&self.storage)?.insert_probe_if_absent(&result)?;
        if !inserted {
            return Ok(None);
        }

        match (result.status_code, result.failure_kind) {
            (Some(code), _) => tracing::debug!("Probed {} -> HTTP {}", result.url, code),
            (None, Some(kind)) => tracing::debug!("Probed {} -> {}", result.url, kind),
            (None, None) => tracing::debug!("Recorded {} without a request", result.url),
        }

        Ok(Some(result))
    }

    async fn check(&self, resolved: &str) -> Outcome {
        if is_pseudo_link(resolved) {
            return Outcome::unchecked(PSEUDO_LINK_NOTE);
        }

        if !self.probe_flat_files && is_flat_file(resolved) {
            return Outcome::unchecked(FLAT_FILE_NOTE);
        }

        let target = match request_target(resolved) {
            Ok(target) => target,
            Err(e) => return Outcome::failure(classify_url_error(&e)),
        };

        // Only the status line is needed; dropping the response closes the
        // body stream without reading it.
        match self.client.get(target).send().await {
            Ok(response) => {
                let status = response.status();
                Outcome::status(status.as_u16(), status.canonical_reason())
            }
            Err(e) => Outcome::failure(classify_error(&e)),
        }
    }
}

/// Maps a link that could not become a request target onto a failure kind
pub fn classify_url_error(error: &UrlError) -> FailureKind {
    match error {
        UrlError::InvalidScheme(_) => FailureKind::InvalidScheme,
        UrlError::Parse(_) | UrlError::MissingHost => FailureKind::InvalidUrl,
    }
}

/// Maps an HTTP client error onto a failure kind
pub fn classify_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_builder() {
        FailureKind::InvalidUrl
    } else if mentions_tls(error) {
        FailureKind::Ssl
    } else if error.is_connect() {
        FailureKind::Connection
    } else {
        FailureKind::Other
    }
}

/// Walks the error chain looking for a TLS or certificate failure
///
/// The top-level message embeds the URL, so only the sources are inspected.
fn mentions_tls(error: &reqwest::Error) -> bool {
    let mut current: Option<&dyn StdError> = error.source();
    while let Some(err) = current {
        let message = err.to_string().to_ascii_lowercase();
        if message.contains("certificate")
            || message.contains("tls")
            || message.contains("ssl")
            || message.contains("handshake")
        {
            return true;
        }
        current = err.source();
    }
    false
}
