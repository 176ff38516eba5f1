//! URL handling module for Linkscan
//!
//! This module provides link normalization, internal/external classification,
//! relative-link resolution, and the conversion of links into request targets.

mod classify;
mod normalize;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use classify::{is_internal, is_under, points_to_self, resolve_relative};
pub use normalize::{
    ensure_scheme, ensure_scheme_with, hostname, is_pseudo_link, normalize, remove_trailing_slash,
    strip_scheme,
};

/// Converts a resolved link into a URL that can be requested over HTTP
///
/// The fragment is dropped since it is never sent to the server. Links that
/// cannot be parsed, have no host, or use a scheme other than HTTP(S) are
/// rejected.
///
/// # Examples
///
/// ```
/// use linkscan::url::request_target;
///
/// let url = request_target("https://example.com/page#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
///
/// assert!(request_target("ftp://example.com/file").is_err());
/// assert!(request_target("http://").is_err());
/// ```
pub fn request_target(link: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(link.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}
