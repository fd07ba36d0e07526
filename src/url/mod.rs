//! URL handling module for Crawlkeeper
//!
//! This module provides robots.txt location derivation and the normalization applied
//! to links discovered on a crawled page.

mod normalize;

pub use normalize::{normalize_link, normalize_links};

use ::url::Url;

/// Returns true if the URL uses a scheme the crawler is willing to fetch
pub fn is_crawlable_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Derives the robots.txt location governing a URL
///
/// The result is `scheme://host[:port]/robots.txt`; path, query, fragment and
/// credentials of the input are dropped. It is also the key for the robots cache
/// and the per-domain lock.
///
/// # Examples
///
/// ```
/// use crawlkeeper::url::robots_txt_url;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/page?q=1#top").unwrap();
/// assert_eq!(robots_txt_url(&url).as_deref(), Some("https://example.com/robots.txt"));
/// ```
pub fn robots_txt_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let robots = match url.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
        None => format!("{}://{}/robots.txt", url.scheme(), host),
    };
    Some(robots)
}
