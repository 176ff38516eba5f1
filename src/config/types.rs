use serde::Deserialize;

/// Browser User-Agent sent with every request; many sites reject bot agents
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_5) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/50.0.2661.102 Safari/537.36";

/// Main configuration structure for Linkscan
///
/// Every section is optional; missing sections and keys take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of internal pages whose links are enumerated
    #[serde(rename = "page-limit")]
    pub page_limit: usize,

    /// Timeout applied to every page fetch and link probe (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Number of probes allowed in flight for one page
    #[serde(rename = "max-concurrent-probes")]
    pub max_concurrent_probes: usize,

    /// Whether flat files (PDFs, images, archives...) get a network probe
    #[serde(rename = "probe-flat-files")]
    pub probe_flat_files: bool,

    /// Whether link extraction tolerates invalid TLS certificates
    ///
    /// Probes always verify certificates.
    #[serde(rename = "accept-invalid-certs-on-fetch")]
    pub accept_invalid_certs_on_fetch: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_limit: 2000,
            timeout_secs: 5,
            max_concurrent_probes: 16,
            probe_flat_files: true,
            accept_invalid_certs_on_fetch: true,
        }
    }
}

/// User agent configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file (`:memory:` keeps nothing on disk)
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown report file
    #[serde(rename = "report-path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./linkscan.db".to_string(),
            report_path: "./linkscan-report.md".to_string(),
        }
    }
}

/// Default scan target, overridable from the command line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanConfig {
    #[serde(rename = "root-url")]
    pub root_url: Option<String>,

    pub requester: Option<String>,
}
