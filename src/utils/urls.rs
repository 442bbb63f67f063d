use axum::http::{HeaderMap, header};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Mount point of the static file service.
pub const PUBLIC_PREFIX: &str = "/imagenes";

/// Characters escaped when a stored filename becomes a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// `scheme://host` for links handed back to the client. A configured base URL
/// wins; otherwise the request's `Host` header is used, with
/// `X-Forwarded-Proto` picking the scheme behind a proxy.
pub fn base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base) = configured {
        return base.trim_end_matches('/').to_string();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");

    format!("{}://{}", scheme, host)
}

/// Absolute URL under which `filename` is served.
pub fn public_url(base: &str, filename: &str) -> String {
    format!(
        "{}{}/{}",
        base,
        PUBLIC_PREFIX,
        utf8_percent_encode(filename, PATH_SEGMENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_base_url_from_host() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3001"));
        assert_eq!(base_url(None, &headers), "http://localhost:3001");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        assert_eq!(base_url(None, &headers), "https://localhost:3001");
    }

    #[test]
    fn test_base_url_prefers_configured() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:3001"));
        assert_eq!(
            base_url(Some("https://files.example.com/"), &headers),
            "https://files.example.com"
        );
    }

    #[test]
    fn test_public_url_encodes_segment() {
        assert_eq!(
            public_url("http://h", "Invoice_2024.pdf"),
            "http://h/imagenes/Invoice_2024.pdf"
        );
        assert_eq!(
            public_url("http://h", "1-2-my photo#1.png"),
            "http://h/imagenes/1-2-my%20photo%231.png"
        );
    }
}
