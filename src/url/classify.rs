use crate::url::normalize::{
    ensure_scheme, has_scheme, hostname, is_pseudo_link, looks_like_host_or_file, strip_scheme,
};
use url::Url;

/// Checks if a link belongs to the site rooted at `reference_url`
///
/// A link is internal when any of the following holds:
/// - it is root-relative, an anchor, or dot-relative (`/`, `#`, `.`)
/// - it is a `javascript:` / `mailto:` pseudo-link
/// - its scheme-stripped host+path starts with the reference's host+path,
///   on a path boundary
/// - it has no scheme and no `.` at all (an extensionless relative path)
///
/// Scheme-relative links (`//host/...`) are compared by host+path like
/// absolute links.
///
/// # Examples
///
/// ```
/// use linkscan::url::is_internal;
///
/// assert!(is_internal("/about", "https://example.com"));
/// assert!(is_internal("https://example.com/blog/post", "https://example.com/blog"));
/// assert!(!is_internal("//cdn.other.com/lib.js", "https://example.com"));
/// assert!(!is_internal("https://example.community", "https://example.com"));
/// ```
pub fn is_internal(link: &str, reference_url: &str) -> bool {
    let link = link.trim();

    if is_pseudo_link(link) {
        return true;
    }

    if let Some(rest) = link.strip_prefix("//") {
        return is_under(&format!("http://{}", rest), reference_url);
    }

    if link.starts_with('/') || link.starts_with('#') || link.starts_with('.') {
        return true;
    }

    if is_under(link, reference_url) {
        return true;
    }

    !has_scheme(link) && !link.contains('.')
}

/// Checks if `link` lies at or below `reference_url`, ignoring the scheme
///
/// The match is on a path boundary: `example.com/blog` is under
/// `example.com` but `example.community` is not.
pub fn is_under(link: &str, reference_url: &str) -> bool {
    let base = strip_scheme(reference_url);
    let candidate = strip_scheme(link);

    match candidate.strip_prefix(base.as_str()) {
        Some(rest) => {
            rest.is_empty() || base.ends_with('/') || rest.starts_with(['/', '?', '#'])
        }
        None => false,
    }
}

/// Resolves a link against the page it was found on
///
/// - Pseudo-links and links that already carry a scheme are returned as-is.
/// - Bare anchors collapse to `reference_url`, or are appended to it when
///   `keep_anchor` is set.
/// - Scheme-less links that look like hostnames get `http://` prepended.
/// - Everything else is joined with RFC 3986 semantics (`/x`, `./x`, `../x`,
///   `//host/x`, `x`).
///
/// # Examples
///
/// ```
/// use linkscan::url::resolve_relative;
///
/// assert_eq!(
///     resolve_relative("/about", "https://example.com", false),
///     "https://example.com/about"
/// );
/// assert_eq!(
///     resolve_relative("../sibling", "https://example.com/section", false),
///     "https://example.com/sibling"
/// );
/// assert_eq!(
///     resolve_relative("#top", "https://example.com", true),
///     "https://example.com#top"
/// );
/// ```
pub fn resolve_relative(link: &str, reference_url: &str, keep_anchor: bool) -> String {
    let link = link.trim();

    if is_pseudo_link(link) || has_scheme(link) {
        return link.to_string();
    }

    let reference = reference_url
        .split_once('#')
        .map_or(reference_url, |(head, _)| head);

    if link.is_empty() {
        return reference.to_string();
    }

    if link.starts_with('#') {
        return if keep_anchor {
            format!("{}{}", reference, link)
        } else {
            reference.to_string()
        };
    }

    if !link.starts_with('/') && !link.starts_with('.') && looks_like_host_or_file(link) {
        return ensure_scheme(link);
    }

    match Url::parse(reference).and_then(|base| base.join(link)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) if link.starts_with("//") => ensure_scheme(link),
        Err(_) if link.starts_with('/') => format!("{}{}", hostname(reference), link),
        Err(_) => link.to_string(),
    }
}

/// Returns true if `link` refers to the same page as `url_self`
pub fn points_to_self(link: &str, url_self: &str) -> bool {
    link == "/" || strip_scheme(link) == strip_scheme(url_self)
}
