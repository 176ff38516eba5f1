//! HTTP fetcher implementation
//!
//! This module handles page fetches for link extraction, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Skipping flat files so binaries are never downloaded
//! - Content-Type checks before the body is read
//! - Turning every failure into an empty link list

use crate::config::Config;
use crate::crawler::parser::extract_hrefs;
use crate::url::request_target;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Extensions treated as pages that may contain links
pub const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "aspx", "php", "pdf", "md", "yml"];

/// Maximum redirect hops followed by fetches and probes
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Fetched an HTML page
    Html {
        /// Final URL after redirects
        final_url: String,
        /// Page body content
        body: String,
    },

    /// The URL is a flat file and was not requested
    FlatFile,

    /// Page is not HTML (Content-Type mismatch); the body was not read
    NotHtml {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// The request could not be made or completed
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `accept_invalid_certs` - Whether TLS certificate errors are ignored
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use linkscan::config::Config;
/// use linkscan::crawler::build_http_client;
///
/// let config = Config::default();
/// let strict = build_http_client(&config, false).unwrap();
/// let lenient = build_http_client(&config, true).unwrap();
/// ```
pub fn build_http_client(
    config: &Config,
    accept_invalid_certs: bool,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.crawler.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.value.as_str())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Checks whether a URL points at a non-page resource
///
/// The extension of the last path segment decides: no extension means a page,
/// an extension from [`PAGE_EXTENSIONS`] means a page, anything else is a
/// flat file. Query strings and fragments are ignored.
///
/// # Examples
///
/// ```
/// use linkscan::crawler::is_flat_file;
///
/// assert!(is_flat_file("https://example.com/files/archive.zip"));
/// assert!(is_flat_file("https://example.com/logo.PNG?v=2"));
/// assert!(!is_flat_file("https://example.com/index.html#top"));
/// assert!(!is_flat_file("https://example.com/about"));
/// assert!(!is_flat_file("https://example.com"));
/// ```
pub fn is_flat_file(url: &str) -> bool {
    let path = match Url::parse(url.trim()) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() => {
            let extension = extension.to_ascii_lowercase();
            !PAGE_EXTENSIONS.contains(&extension.as_str())
        }
        _ => false,
    }
}

/// Fetches a page body if it is HTML
///
/// Flat files are never requested. For other URLs the Content-Type header is
/// checked before the body is read; a missing header is treated as HTML.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The absolute URL of the page
pub async fn fetch_page(client: &Client, url: &str) -> FetchResult {
    if is_flat_file(url) {
        return FetchResult::FlatFile;
    }

    let target = match request_target(url) {
        Ok(target) => target,
        Err(e) => {
            return FetchResult::NetworkError {
                error: e.to_string(),
            }
        }
    };

    let response = match client.get(target).send().await {
        Ok(response) => response,
        Err(e) => {
            return FetchResult::NetworkError {
                error: e.to_string(),
            }
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !content_type.is_empty() && !content_type.contains("html") {
        return FetchResult::NotHtml { content_type };
    }

    let final_url = response.url().to_string();
    match response.text().await {
        Ok(body) => FetchResult::Html { final_url, body },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
        },
    }
}

/// Links found on one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    /// URL relative links resolve against: the final URL after redirects,
    /// or the requested URL when nothing was fetched
    pub base_url: String,
    /// Every `href` in document order, verbatim
    pub hrefs: Vec<String>,
}

impl PageLinks {
    fn empty(url: &str) -> Self {
        Self {
            base_url: url.to_string(),
            hrefs: Vec::new(),
        }
    }
}

/// Fetches a page and returns every `href` found in its anchors
///
/// Never fails: an unreachable page, a non-HTML response or an error status
/// all yield an empty list, so one bad page cannot abort a crawl.
pub async fn fetch_links(client: &Client, url: &str) -> PageLinks {
    match fetch_page(client, url).await {
        FetchResult::Html { final_url, body } => {
            if final_url != url {
                tracing::debug!("{} redirected to {}", url, final_url);
            }
            PageLinks {
                hrefs: extract_hrefs(&body),
                base_url: final_url,
            }
        }
        FetchResult::FlatFile => {
            tracing::debug!("Skipping flat file {}", url);
            PageLinks::empty(url)
        }
        FetchResult::NotHtml { content_type } => {
            tracing::debug!("Skipping {}: content type {}", url, content_type);
            PageLinks::empty(url)
        }
        FetchResult::HttpError { status_code } => {
            tracing::warn!("Fetching {} returned HTTP {}", url, status_code);
            PageLinks::empty(url)
        }
        FetchResult::NetworkError { error } => {
            tracing::warn!("Failed to fetch {}: {}", url, error);
            PageLinks::empty(url)
        }
    }
}
