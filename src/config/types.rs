use serde::Deserialize;
use std::time::Duration;

/// Default listing endpoint of the magic market
pub const DEFAULT_ENDPOINT: &str = "https://mall.bilibili.com/mall-magic-c/internet/c2c/v2/list";

/// Default page that renders a single listed item
pub const DEFAULT_DETAIL_BASE_URL: &str = "https://mall.bilibili.com/neul-next/index.html";

/// Default snapshot file, relative to the working directory
pub const DEFAULT_SNAPSHOT_PATH: &str = "market_scan_results.json";

/// Main configuration structure for the scanner
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote listing API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listing endpoint that accepts `{"nextId": ...}` POST bodies
    pub endpoint: String,

    /// Base of the item detail URL written into snapshots
    #[serde(rename = "detail-base-url")]
    pub detail_base_url: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// TCP/TLS connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            detail_base_url: DEFAULT_DETAIL_BASE_URL.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Pacing of the scan loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Pause between two successful page requests (seconds)
    #[serde(rename = "inter-page-delay-secs")]
    pub inter_page_delay_secs: u64,

    /// Pause before retrying after a transport failure (seconds)
    #[serde(rename = "transient-retry-delay-secs")]
    pub transient_retry_delay_secs: u64,

    /// Cooldown after the server signals rate limiting with HTTP 412 (seconds)
    #[serde(rename = "rate-limit-cooldown-secs")]
    pub rate_limit_cooldown_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            inter_page_delay_secs: 5,
            transient_retry_delay_secs: 3,
            rate_limit_cooldown_secs: 300,
        }
    }
}

impl ScanConfig {
    pub fn inter_page_delay(&self) -> Duration {
        Duration::from_secs(self.inter_page_delay_secs)
    }

    pub fn transient_retry_delay(&self) -> Duration {
        Duration::from_secs(self.transient_retry_delay_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON snapshot that is rewritten after every new match
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
        }
    }
}
