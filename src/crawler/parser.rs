//! HTML parser for extracting links
//!
//! Every `<a href>` value is returned verbatim: no resolution, no filtering
//! and no normalization. HTML character references are decoded by the HTML
//! parser; JavaScript-style `\uXXXX` escapes, which some generators leave in
//! attribute values, are decoded here.

use scraper::{Html, Selector};

/// Extracts the `href` of every anchor element, in document order
///
/// # Example
///
/// ```
/// use linkscan::crawler::extract_hrefs;
///
/// let html = r#"<a href="/page">Page</a><a href="mailto:a@b.c">Mail</a><a>None</a>"#;
/// assert_eq!(extract_hrefs(html), vec!["/page", "mailto:a@b.c"]);
/// ```
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(decode_unicode_escapes)
        .collect()
}

/// Decodes `\uXXXX` escape sequences; malformed sequences are kept as-is
pub fn decode_unicode_escapes(value: &str) -> String {
    if !value.contains("\\u") {
        return value.to_string();
    }

    let mut decoded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find("\\u") {
        decoded.push_str(&rest[..pos]);
        let escape = &rest[pos..];

        let parsed = escape
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match parsed {
            Some(c) => {
                decoded.push(c);
                rest = &escape[6..];
            }
            None => {
                decoded.push_str("\\u");
                rest = &escape[2..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}
