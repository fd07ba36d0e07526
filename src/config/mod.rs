//! Configuration module for Crawlkeeper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section except `[user-agent]` has defaults. A few deployment settings can be
//! overridden from the environment (see [`ENV_OVERRIDES`]).
//!
//! # Example
//!
//! ```no_run
//! use crawlkeeper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawlkeeper.toml")).unwrap();
//! println!("Listening on {}", config.server.bind_address);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrokerConfig, Config, CrawlerConfig, PolitenessConfig, ServerConfig, StorageConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
    ENV_OVERRIDES,
};
pub use validation::validate;
