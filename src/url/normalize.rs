use ::url::Url;
use std::collections::BTreeSet;

/// Normalizes a single discovered link against the page it was found on
///
/// # Normalization Steps
///
/// 1. Trim whitespace; drop empty and fragment-only hrefs
/// 2. Drop `javascript:`, `mailto:`, `tel:` and `data:` links
/// 3. Resolve relative links against `base`
/// 4. Keep only HTTP and HTTPS results
/// 5. Remove the fragment
///
/// # Examples
///
/// ```
/// use crawlkeeper::url::normalize_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/intro").unwrap();
/// let link = normalize_link(&base, "../faq#top").unwrap();
/// assert_eq!(link.as_str(), "https://example.com/faq");
/// ```
pub fn normalize_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}

/// Normalizes every href and deduplicates the result
///
/// The returned list is sorted, so identical pages always yield identical link lists.
pub fn normalize_links<'a, I>(base: &Url, hrefs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    hrefs
        .into_iter()
        .filter_map(|href| normalize_link(base, href))
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
