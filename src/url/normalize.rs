/// Link prefixes that are never fetched or resolved
const PSEUDO_SCHEMES: &[&str] = &["javascript:", "mailto:"];

/// Normalizes a raw hyperlink into Linkscan's comparable form
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. `javascript:` / `mailto:` pseudo-links are returned as-is
/// 3. Scheme-relative links (`//host/path`) get `http:` prepended
/// 4. Root-relative (`/...`), anchor (`#...`) and dot-relative (`./`, `../`)
///    forms only lose their trailing slash; anchors and queries are kept
/// 5. Strings without a scheme whose first or last segment contains a `.`
///    are assumed to be bare hostnames and get `http://` prepended
/// 6. Absolute URLs lose their fragment and query string, `https://` is
///    downgraded to `http://`, and the trailing slash is removed
///
/// The result is stable: `normalize(&normalize(x)) == normalize(x)`.
///
/// # Examples
///
/// ```
/// use linkscan::url::normalize;
///
/// assert_eq!(normalize("https://example.com/page/ "), "http://example.com/page");
/// assert_eq!(normalize("//cdn.example.com/lib/"), "http://cdn.example.com/lib");
/// assert_eq!(normalize("/section/#anchor"), "/section/#anchor");
/// assert_eq!(normalize("mailto:someone@example.com"), "mailto:someone@example.com");
/// ```
pub fn normalize(raw: &str) -> String {
    // Dropping a trailing slash can expose whitespace, so repeat until stable
    let mut current = normalize_once(raw);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(raw: &str) -> String {
    let link = raw.trim();

    if is_pseudo_link(link) {
        return link.to_string();
    }

    if let Some(rest) = link.strip_prefix("//") {
        return normalize_absolute(&format!("http://{}", rest));
    }

    if link.starts_with('/') || link.starts_with('#') || link.starts_with('.') {
        return remove_trailing_slash(link).to_string();
    }

    if has_scheme(link) {
        return normalize_absolute(link);
    }

    if looks_like_host_or_file(link) {
        return normalize_absolute(&format!("http://{}", link));
    }

    // Extensionless relative path such as `about/`
    remove_trailing_slash(link).to_string()
}

/// Strips the fragment and query, downgrades the scheme and drops trailing slashes
fn normalize_absolute(url: &str) -> String {
    let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
    let without_query = without_fragment
        .split_once('?')
        .map_or(without_fragment, |(head, _)| head);

    let downgraded = match without_query.get(..8) {
        Some(prefix) if prefix.eq_ignore_ascii_case("https://") => {
            format!("http://{}", &without_query[8..])
        }
        _ => without_query.to_string(),
    };

    remove_trailing_slash(&downgraded).to_string()
}

/// Removes trailing slashes, keeping a lone `/` and a bare `scheme://`
///
/// # Examples
///
/// ```
/// use linkscan::url::remove_trailing_slash;
///
/// assert_eq!(remove_trailing_slash("www.example.com/"), "www.example.com");
/// assert_eq!(remove_trailing_slash("/"), "/");
/// ```
pub fn remove_trailing_slash(url: &str) -> &str {
    if url.ends_with("://") {
        return url;
    }

    let trimmed = url.trim_end_matches('/');
    if trimmed.is_empty() {
        return if url.is_empty() { url } else { "/" };
    }

    // `http:///` must not collapse into `http:`
    if trimmed.ends_with(':') && url.len() >= trimmed.len() + 2 {
        return &url[..trimmed.len() + 2];
    }

    trimmed
}

/// Removes the scheme and trailing slash, leaving host and path
///
/// Used as a comparison key that ignores the http/https distinction.
///
/// # Examples
///
/// ```
/// use linkscan::url::strip_scheme;
///
/// assert_eq!(strip_scheme("https://example.com/"), "example.com");
/// assert_eq!(strip_scheme("example.com/blog"), "example.com/blog");
/// ```
pub fn strip_scheme(url: &str) -> String {
    let starts_with_http = url
        .get(..4)
        .map(|prefix| prefix.eq_ignore_ascii_case("http"))
        .unwrap_or(false);

    let root = match url.split_once("//") {
        Some((_, rest)) if starts_with_http => rest,
        _ => url,
    };

    remove_trailing_slash(root).to_string()
}

/// Returns the `scheme://host` prefix of an absolute URL
pub fn hostname(url: &str) -> String {
    let root = url.splitn(4, '/').take(3).collect::<Vec<_>>().join("/");
    remove_trailing_slash(&root).to_string()
}

/// Prepends `http://` (or `http:` for scheme-relative links) when no scheme is present
///
/// Existing schemes of any kind are left alone.
pub fn ensure_scheme(url: &str) -> String {
    ensure_scheme_with(url, "http")
}

/// Like [`ensure_scheme`], with an explicit default scheme
pub fn ensure_scheme_with(url: &str, scheme: &str) -> String {
    if has_scheme(url) {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("{}://{}", scheme, rest)
    } else {
        format!("{}://{}", scheme, url)
    }
}

/// Returns true for `javascript:` and `mailto:` links
pub fn is_pseudo_link(link: &str) -> bool {
    let link = link.trim_start();
    PSEUDO_SCHEMES.iter().any(|scheme| {
        link.get(..scheme.len())
            .map(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .unwrap_or(false)
    })
}

/// Returns true if the string starts with `scheme://`
pub(crate) fn has_scheme(link: &str) -> bool {
    match link.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().map_or(false, |c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Heuristic for scheme-less links that are really hostnames (or files)
pub(crate) fn looks_like_host_or_file(link: &str) -> bool {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    let first = path.split('/').next().unwrap_or("");
    let last = path.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or("");
    first.contains('.') || last.contains('.')
}
