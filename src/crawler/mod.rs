//! Crawler module for web page fetching and processing
//!
//! This module contains the per-URL crawl pipeline, including:
//! - HTTP fetching behind the [`Fetcher`] trait
//! - Charset negotiation with ordered fallbacks
//! - HTML parsing for the title and anchor hrefs
//! - Orchestration of gate, store and publisher

mod coordinator;
mod encoding;
mod fetcher;
mod parser;

pub use coordinator::{CrawlOrchestrator, CrawlOutcome};
pub use encoding::{
    charset_from_content_type, decode_body, decode_strict, resolve_encodings, Decoded,
};
pub use fetcher::{build_http_client, FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use parser::{parse_html, ParsedPage};
