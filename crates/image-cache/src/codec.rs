//! Cache keys, data URIs and the built-in placeholder

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const DEFAULT_KEY_PREFIX: &str = "img_cache_";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Placeholder graphic shown when neither the source nor the fallback loads
pub const PLACEHOLDER_SVG: &str = concat!(
    r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="40" viewBox="0 0 24 24" "##,
    r##"fill="none" stroke="#9ca3af" stroke-width="1.5">"##,
    r##"<rect x="3" y="3" width="18" height="18" rx="2"/>"##,
    r##"<circle cx="8.5" cy="8.5" r="1.5"/>"##,
    r##"<path d="M21 15l-5-5L5 21"/>"##,
    r##"</svg>"##
);

/// Store key for `url`: the prefix followed by the base64 of the URL.
///
/// The encoding is reversible, so distinct URLs never share a key.
pub fn cache_key(prefix: &str, url: &str) -> String {
    format!("{}{}", prefix, STANDARD.encode(url.as_bytes()))
}

/// Encode bytes as `data:<content_type>;base64,<payload>`
pub fn encode_data_uri(content_type: &str, bytes: &[u8]) -> String {
    let content_type = content_type.trim();
    let content_type = if content_type.is_empty() {
        FALLBACK_CONTENT_TYPE
    } else {
        content_type
    };
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

/// Split a base64 data URI back into its content type and bytes
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let content_type = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((content_type.to_string(), bytes))
}

/// The placeholder graphic as a data URI
pub fn placeholder_data_uri() -> String {
    encode_data_uri("image/svg+xml", PLACEHOLDER_SVG.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_generation() {
        let key1 = cache_key(DEFAULT_KEY_PREFIX, "https://a.com/x.png");
        let key2 = cache_key(DEFAULT_KEY_PREFIX, "https://a.com/x.png");
        let key3 = cache_key(DEFAULT_KEY_PREFIX, "https://a.com/y.png");

        assert_eq!(key1, "img_cache_aHR0cHM6Ly9hLmNvbS94LnBuZw==");
        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_cache_key_custom_prefix() {
        assert_eq!(cache_key("thumbs:", "hello"), "thumbs:aGVsbG8=");
    }

    #[test]
    fn test_encode_data_uri() {
        let uri = encode_data_uri("image/png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_encode_data_uri_without_content_type() {
        let uri = encode_data_uri("  ", b"hello");
        assert_eq!(uri, "data:application/octet-stream;base64,aGVsbG8=");
    }

    #[test]
    fn test_decode_data_uri() {
        let (content_type, bytes) = decode_data_uri("data:image/png;base64,iVBORw==").unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

        assert!(decode_data_uri("https://a.com/x.png").is_none());
        assert!(decode_data_uri("data:text/plain,hello").is_none());
        assert!(decode_data_uri("data:image/png;base64,***").is_none());
    }

    #[test]
    fn test_placeholder_is_svg() {
        let uri = placeholder_data_uri();
        assert!(uri.starts_with("data:image/svg+xml;base64,"));

        let (_, bytes) = decode_data_uri(&uri).unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }
}
