//! Crawlkeeper: the crawl core of a web-search ingestion pipeline
//!
//! Given a URL, this crate decides whether fetching is permitted (content-type and
//! robots.txt), deduplicates and persists page content in a content-addressed store,
//! and fans the discovered links and a page summary out to a message broker.

pub mod config;
pub mod crawler;
pub mod politeness;
pub mod publish;
pub mod server;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Publish error: {0}")]
    Publish(#[from] publish::PublishError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, CrawlOutcome};
pub use politeness::{DomainLockRegistry, PolitenessGate};
pub use publish::PartitionPublisher;
pub use storage::ContentStore;
