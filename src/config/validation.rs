use crate::config::types::{
    BrokerConfig, Config, CrawlerConfig, PolitenessConfig, ServerConfig, StorageConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_politeness_config(&config.politeness)?;
    validate_storage_config(&config.storage)?;
    validate_broker_config(&config.broker)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "bind_address '{}' is not a socket address: {}",
            config.bind_address, e
        ))
    })?;
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    require_positive("robots_cache_ttl_secs", config.robots_cache_ttl_secs)?;
    require_positive("request_timeout_secs", config.request_timeout_secs)?;
    require_positive("connect_timeout_secs", config.connect_timeout_secs)?;
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.blob_dir.is_empty() {
        return Err(ConfigError::Validation(
            "blob_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_broker_config(config: &BrokerConfig) -> Result<(), ConfigError> {
    if config.bootstrap_servers.trim().is_empty() {
        return Err(ConfigError::Validation(
            "bootstrap_servers cannot be empty".to_string(),
        ));
    }

    if config.urls_topic.is_empty() || config.summary_topic.is_empty() {
        return Err(ConfigError::Validation(
            "urls_topic and summary_topic cannot be empty".to_string(),
        ));
    }

    require_positive("max_batch_bytes", config.max_batch_bytes as u64)?;
    require_positive("send_timeout_ms", config.send_timeout_ms)?;
    require_positive("connect_attempts", u64::from(config.connect_attempts))?;

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.fallback_encodings.is_empty() {
        return Err(ConfigError::Validation(
            "fallback_encodings must list at least one encoding".to_string(),
        ));
    }

    for label in &config.fallback_encodings {
        if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
            return Err(ConfigError::Validation(format!(
                "Unknown fallback encoding '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn require_positive(name: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
