/// Failure taxonomy for link probes
///
/// Every request-layer failure is mapped onto one of these kinds; the mapping
/// from HTTP client errors lives in the prober.
use serde::Serialize;
use std::fmt;

/// Why a probe did not produce an HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FailureKind {
    /// Connection refused, reset, or DNS resolution failure
    #[serde(rename = "ConnectionError")]
    Connection,

    /// TLS handshake or certificate validation failure
    #[serde(rename = "SSLError")]
    Ssl,

    /// Connect or read timeout
    #[serde(rename = "Timeout")]
    Timeout,

    /// The link could not be parsed as a URL
    #[serde(rename = "InvalidURL")]
    InvalidUrl,

    /// The link uses a scheme that cannot be requested over HTTP
    #[serde(rename = "InvalidSchema")]
    InvalidScheme,

    /// Anything else (redirect loops, protocol errors, ...)
    #[serde(rename = "Other")]
    Other,
}

impl FailureKind {
    /// Converts the kind to its tag as stored in the database
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Connection => "ConnectionError",
            Self::Ssl => "SSLError",
            Self::Timeout => "Timeout",
            Self::InvalidUrl => "InvalidURL",
            Self::InvalidScheme => "InvalidSchema",
            Self::Other => "Other",
        }
    }

    /// Parses a kind from its database tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ConnectionError" => Some(Self::Connection),
            "SSLError" => Some(Self::Ssl),
            "Timeout" => Some(Self::Timeout),
            "InvalidURL" => Some(Self::InvalidUrl),
            "InvalidSchema" => Some(Self::InvalidScheme),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Human-readable explanation for reports
    pub fn description(&self) -> &'static str {
        match self {
            Self::Connection => "A connection error occurred.",
            Self::Ssl => "Invalid SSL certificate.",
            Self::Timeout => "Host server timeout.",
            Self::InvalidUrl => "Invalid URL.",
            Self::InvalidScheme => "Could not read schema.",
            Self::Other => "The request failed.",
        }
    }

    /// Returns all failure kinds
    pub fn all_kinds() -> Vec<Self> {
        vec![
            Self::Connection,
            Self::Ssl,
            Self::Timeout,
            Self::InvalidUrl,
            Self::InvalidScheme,
            Self::Other,
        ]
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}
