use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Crawlkeeper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// HTTP surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the crawl endpoint listens on
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also used as the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Full `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Robots.txt and request timing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessConfig {
    /// How long a fetched robots.txt stays cached (seconds)
    #[serde(rename = "robots-cache-ttl-secs", default = "default_robots_ttl")]
    pub robots_cache_ttl_secs: u64,

    /// Total timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl PolitenessConfig {
    pub fn robots_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.robots_cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            robots_cache_ttl_secs: default_robots_ttl(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Page metadata and content blob locations
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database holding page records
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Directory of the content-addressed blob store
    #[serde(rename = "blob-dir", default = "default_blob_dir")]
    pub blob_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            blob_dir: default_blob_dir(),
        }
    }
}

/// Message broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Kafka bootstrap servers (comma separated host:port list)
    #[serde(rename = "bootstrap-servers", default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    /// Topic receiving every discovered link, spread across partitions
    #[serde(rename = "urls-topic", default = "default_urls_topic")]
    pub urls_topic: String,

    /// Topic receiving the per-page `[url, links]` summary
    #[serde(rename = "summary-topic", default = "default_summary_topic")]
    pub summary_topic: String,

    /// Upper bound on the encoded size of one link batch (bytes)
    #[serde(rename = "max-batch-bytes", default = "default_max_batch_bytes")]
    pub max_batch_bytes: usize,

    /// Delivery timeout for a single send (milliseconds)
    #[serde(rename = "send-timeout-ms", default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// How many times the startup connection is attempted
    #[serde(rename = "connect-attempts", default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Fixed delay between startup connection attempts (seconds)
    #[serde(
        rename = "connect-retry-delay-secs",
        default = "default_connect_retry_delay"
    )]
    pub connect_retry_delay_secs: u64,
}

impl BrokerConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_delay_secs)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: default_bootstrap_servers(),
            urls_topic: default_urls_topic(),
            summary_topic: default_summary_topic(),
            max_batch_bytes: default_max_batch_bytes(),
            send_timeout_ms: default_send_timeout_ms(),
            connect_attempts: default_connect_attempts(),
            connect_retry_delay_secs: default_connect_retry_delay(),
        }
    }
}

/// Page processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Encodings tried in order when the response declares no usable charset
    #[serde(rename = "fallback-encodings", default = "default_fallback_encodings")]
    pub fallback_encodings: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fallback_encodings: default_fallback_encodings(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_robots_ttl() -> u64 {
    24 * 60 * 60
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_database_path() -> String {
    "./crawlkeeper.db".to_string()
}

fn default_blob_dir() -> String {
    "./blobs".to_string()
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

fn default_urls_topic() -> String {
    "urls".to_string()
}

fn default_summary_topic() -> String {
    "ranker".to_string()
}

fn default_max_batch_bytes() -> usize {
    16 * 1024
}

fn default_send_timeout_ms() -> u64 {
    30_000
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_retry_delay() -> u64 {
    5
}

fn default_fallback_encodings() -> Vec<String> {
    vec!["utf-8".to_string(), "windows-1251".to_string()]
}
