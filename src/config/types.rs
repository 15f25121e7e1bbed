use serde::Deserialize;

/// Lowest and highest recursion depth the crawler accepts
pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 4;

/// Main configuration structure for ATC Spider
///
/// Every section has defaults matching the public WHO index, so an empty
/// file (or no file at all) yields a working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub retry: RetryConfig,
    #[serde(rename = "close-spider")]
    pub close_spider: CloseSpiderConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum depth to follow section-header links from the index page
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of requests in flight at once
    #[serde(rename = "concurrent-requests")]
    pub concurrent_requests: u32,

    /// Delay between consecutive request starts (milliseconds)
    #[serde(rename = "download-delay-ms")]
    pub download_delay_ms: u64,

    /// Jitter the download delay between 0.5x and 1.5x
    #[serde(rename = "randomize-download-delay")]
    pub randomize_download_delay: bool,

    /// Per-request timeout (seconds)
    #[serde(rename = "download-timeout-secs")]
    pub download_timeout_secs: u64,

    /// Skip requests disallowed by the site's robots.txt
    #[serde(rename = "obey-robots")]
    pub obey_robots: bool,

    /// Show a progress spinner while crawling
    #[serde(rename = "progress-logging")]
    pub progress_logging: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            concurrent_requests: 32,
            download_delay_ms: 100,
            randomize_download_delay: true,
            download_timeout_secs: 180,
            obey_robots: true,
            progress_logging: false,
        }
    }
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Index page; child URLs are built by appending to it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Domain patterns requests may go to (e.g. "www.whocc.no" or "*.whocc.no")
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.whocc.no/atc_ddd_index/".to_string(),
            allowed_domains: vec!["www.whocc.no".to_string()],
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Value of the User-Agent header and the robots.txt agent name
    pub name: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "ATC_Bot".to_string(),
        }
    }
}

/// Per-request retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub enabled: bool,

    /// Retries after the first attempt
    pub times: u32,

    /// Response statuses that count as transient
    #[serde(rename = "http-codes")]
    pub http_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            times: 2,
            http_codes: vec![500, 502, 503, 504, 522, 524, 400, 408, 429],
        }
    }
}

impl RetryConfig {
    /// Total attempts a single request gets, including the first one
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.times + 1
        } else {
            1
        }
    }

    pub fn is_retry_status(&self, status: u16) -> bool {
        self.http_codes.contains(&status)
    }
}

/// Crawl-wide termination limits. A value of 0 disables the limit.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloseSpiderConfig {
    /// Total crawl time ceiling (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum time without a new record (seconds)
    #[serde(rename = "timeout-no-item-secs")]
    pub timeout_no_item_secs: u64,

    /// Failed requests/pages tolerated before closing
    #[serde(rename = "error-count")]
    pub error_count: u32,
}

impl Default for CloseSpiderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3 * 60 * 60,
            timeout_no_item_secs: 30 * 60,
            error_count: 5,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; each run writes into a UTC-timestamped subdirectory
    pub directory: String,

    /// Feed file name inside the run directory
    #[serde(rename = "file-name")]
    pub file_name: String,

    /// Separator for fields holding more than one value
    #[serde(rename = "join-multivalued")]
    pub join_multivalued: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./output".to_string(),
            file_name: "atc.csv".to_string(),
            join_multivalued: "; ".to_string(),
        }
    }
}
