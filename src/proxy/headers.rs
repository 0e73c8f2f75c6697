//! Upstream response header filtering.
//!
//! # Responsibilities
//! - Forward upstream headers verbatim, minus the stripped set
//! - Strip identity/session leaks (`Server*`, `Set-Cookie*` prefixes)
//! - Strip connection-level headers that do not survive re-framing
//! - Inject exactly one `Access-Control-Allow-Origin` header

use axum::http::{header, HeaderMap, HeaderValue};

/// Canonical (lower-case) name prefixes never forwarded to the client.
/// Covers `server`, `set-cookie` and variants like `set-cookie2`.
const STRIPPED_PREFIXES: [&str; 2] = ["server", "set-cookie"];

/// Connection-level headers. The proxy re-frames the body, so forwarding
/// these would describe a connection that no longer exists.
const CONNECTION_HEADERS: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Build the client-facing header set from an upstream response.
pub fn forward_headers(upstream: &HeaderMap, cors_origin: &HeaderValue) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(upstream.len() + 1);
    for (name, value) in upstream {
        let name_str = name.as_str();
        if STRIPPED_PREFIXES
            .iter()
            .any(|prefix| name_str.starts_with(prefix))
        {
            continue;
        }
        if CONNECTION_HEADERS.contains(&name_str) {
            continue;
        }
        // append, not insert: multi-valued headers keep every value
        forwarded.append(name.clone(), value.clone());
    }
    // insert, not append: exactly one origin header, ours
    forwarded.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, cors_origin.clone());
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderName;

    fn upstream_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("audio/mpeg"));
        headers.insert("content-length", HeaderValue::from_static("1024"));
        headers.insert("server", HeaderValue::from_static("nginx/1.18"));
        headers.insert("set-cookie", HeaderValue::from_static("session=abc"));
        headers.insert(
            HeaderName::from_static("set-cookie2"),
            HeaderValue::from_static("legacy=1"),
        );
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.append("via", HeaderValue::from_static("1.1 cache-a"));
        headers.append("via", HeaderValue::from_static("1.1 cache-b"));
        headers
    }

    #[test]
    fn strips_server_and_cookie_prefixes() {
        let origin = HeaderValue::from_static("http://lab.example.org");
        let forwarded = forward_headers(&upstream_headers(), &origin);
        assert!(forwarded.get("server").is_none());
        assert!(forwarded.get("set-cookie").is_none());
        assert!(forwarded.get("set-cookie2").is_none());
    }

    #[test]
    fn strips_connection_level_headers() {
        let origin = HeaderValue::from_static("http://lab.example.org");
        let forwarded = forward_headers(&upstream_headers(), &origin);
        assert!(forwarded.get("transfer-encoding").is_none());
    }

    #[test]
    fn forwards_the_rest_verbatim_including_duplicates() {
        let origin = HeaderValue::from_static("http://lab.example.org");
        let forwarded = forward_headers(&upstream_headers(), &origin);
        assert_eq!(forwarded.get("content-type").unwrap(), "audio/mpeg");
        assert_eq!(forwarded.get("content-length").unwrap(), "1024");
        assert_eq!(forwarded.get_all("via").iter().count(), 2);
    }

    #[test]
    fn injects_cors_origin_exactly_once() {
        let origin = HeaderValue::from_static("http://lab.example.org");
        let mut upstream = upstream_headers();
        // An upstream origin header must not survive alongside ours.
        upstream.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        let forwarded = forward_headers(&upstream, &origin);
        let values: Vec<_> = forwarded
            .get_all(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .iter()
            .collect();
        assert_eq!(values, vec!["http://lab.example.org"]);
    }
}
