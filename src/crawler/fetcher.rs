//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - HEAD requests to check Content-Type
//! - GET requests returning the raw body bytes (decoding happens in `encoding`)
//! - Error classification

use crate::config::{PolitenessConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use thiserror::Error;

/// Network failures while talking to a crawled host
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },
}

impl FetchError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Http {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Response of a HEAD or GET request
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Raw body bytes (empty for HEAD)
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Returns true if the Content-Type header announces HTML
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("text/html"))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetch capability consumed by the politeness gate and the orchestrator
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Sends a HEAD request; only status and headers are meaningful
    async fn head(&self, url: &str) -> Result<FetchResponse, FetchError>;

    /// Sends a GET request and reads the whole body
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `politeness` - Timeouts applied to every request
///
/// # Example
///
/// ```no_run
/// use crawlkeeper::config::{PolitenessConfig, UserAgentConfig};
/// use crawlkeeper::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "Crawlkeeper".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &PolitenessConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    politeness: &PolitenessConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(politeness.request_timeout())
        .connect_timeout(politeness.connect_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(
        user_agent: &UserAgentConfig,
        politeness: &PolitenessConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, politeness)?))
    }
}

fn content_type_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn head(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(FetchResponse {
            url: response.url().to_string(),
            status: response.status().as_u16(),
            content_type: content_type_of(&response),
            body: Vec::new(),
        })
    }

    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = content_type_of(&response);
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(FetchResponse {
            url: final_url,
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
