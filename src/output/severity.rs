//! Severity classification of probe results
//!
//! | Severity | Meaning | Outcomes |
//! |----------|---------|----------|
//! | 0 | Benign | 2xx, unchecked links, `javascript:void(0)` |
//! | 1 | Informational | other non-2xx statuses, invalid scheme, other failures |
//! | 2 | Moderate | 401, 403, SSL errors, timeouts |
//! | 3 | Severe | 400, 404, 410, connection errors, invalid URLs |

use crate::state::FailureKind;
use crate::storage::ProbeResult;

/// Highest severity value
pub const MAX_SEVERITY: u8 = 3;

/// Classifies a probe result on the 0-3 scale
///
/// `javascript:void(0)` placeholders are always 0 regardless of outcome.
pub fn severity(probe: &ProbeResult) -> u8 {
    if is_void_placeholder(&probe.url_raw) || is_void_placeholder(&probe.url) {
        return 0;
    }

    if let Some(kind) = probe.failure_kind {
        return failure_severity(kind);
    }

    match probe.status_code {
        Some(400 | 404 | 410) => 3,
        Some(401 | 403) => 2,
        Some(code) if (200..300).contains(&code) => 0,
        Some(_) => 1,
        None => 0,
    }
}

/// Severity of a request-layer failure
pub fn failure_severity(kind: FailureKind) -> u8 {
    match kind {
        FailureKind::Connection | FailureKind::InvalidUrl => 3,
        FailureKind::Ssl | FailureKind::Timeout => 2,
        FailureKind::InvalidScheme | FailureKind::Other => 1,
    }
}

/// Returns true for `javascript:void(0)` and its spacing/case variants
pub fn is_void_placeholder(link: &str) -> bool {
    let compact: String = link
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:void(0)")
}
