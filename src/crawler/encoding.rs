//! Charset negotiation for fetched bodies
//!
//! Decoding is strict: a byte sequence that is malformed in an encoding does not
//! decode in it. The order tried is byte-order mark, then the charset declared in
//! the Content-Type header, then the configured fallbacks.

use encoding_rs::Encoding;

/// A successfully decoded body
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Extracts the `charset=` parameter from a Content-Type header value
///
/// ```
/// use crawlkeeper::crawler::charset_from_content_type;
///
/// assert_eq!(charset_from_content_type("text/html; charset=\"UTF-8\""), Some("UTF-8"));
/// assert_eq!(charset_from_content_type("text/html"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then_some(value)
    })
}

/// Resolves encoding labels, skipping (and logging) unknown ones
pub fn resolve_encodings<S: AsRef<str>>(labels: &[S]) -> Vec<&'static Encoding> {
    labels
        .iter()
        .filter_map(|label| {
            let label = label.as_ref();
            let encoding = Encoding::for_label(label.as_bytes());
            if encoding.is_none() {
                tracing::warn!("Ignoring unknown encoding label '{}'", label);
            }
            encoding
        })
        .collect()
}

/// Decodes `bytes` in exactly `encoding`, failing on any malformed sequence
pub fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Decodes a response body using the negotiated charset
///
/// Returns `None` if no candidate encoding decodes the body; the caller skips the page.
pub fn decode_body(
    bytes: &[u8],
    content_type: Option<&str>,
    fallbacks: &[&'static Encoding],
) -> Option<Decoded> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        if let Some(text) = decode_strict(&bytes[bom_len..], encoding) {
            return Some(Decoded { text, encoding });
        }
    }

    let declared = content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    declared
        .into_iter()
        .chain(fallbacks.iter().copied())
        .find_map(|encoding| {
            decode_strict(bytes, encoding).map(|text| Decoded { text, encoding })
        })
}
