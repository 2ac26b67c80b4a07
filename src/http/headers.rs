//! Header copying between the client and upstream legs.
//!
//! # Responsibilities
//! - Copy header multimaps without collapsing repeated keys
//! - Strip hop-by-hop headers, including those listed in `Connection`
//! - Always drop `Transfer-Encoding`; each leg frames its own body

use axum::http::header::{self, HeaderMap, HeaderName};

/// Headers meaningful only for a single transport leg (RFC 9110 §7.6.1).
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Header names declared hop-by-hop through the `Connection` header.
fn connection_tokens(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Copy `src` into a new map, skipping `excluded` names and, when
/// `strip_hop_by_hop` is set, every hop-by-hop header.
///
/// Every value of a repeated header is kept, in order.
pub fn copy_headers(src: &HeaderMap, excluded: &[HeaderName], strip_hop_by_hop: bool) -> HeaderMap {
    let listed = if strip_hop_by_hop {
        connection_tokens(src)
    } else {
        Vec::new()
    };

    let mut out = HeaderMap::with_capacity(src.len());
    for (name, value) in src.iter() {
        if *name == header::TRANSFER_ENCODING || excluded.contains(name) {
            continue;
        }
        if strip_hop_by_hop && (is_hop_by_hop(name) || listed.contains(name)) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_hop_by_hop_headers() {
        assert!(is_hop_by_hop(&header::CONNECTION));
        assert!(is_hop_by_hop(&HeaderName::from_static("keep-alive")));
        assert!(is_hop_by_hop(&header::TRANSFER_ENCODING));
        assert!(is_hop_by_hop(&header::UPGRADE));
        assert!(is_hop_by_hop(&header::PROXY_AUTHORIZATION));

        assert!(!is_hop_by_hop(&header::CONTENT_TYPE));
        assert!(!is_hop_by_hop(&header::AUTHORIZATION));
        assert!(!is_hop_by_hop(&header::HOST));
        assert!(!is_hop_by_hop(&header::CONTENT_LENGTH));
    }

    #[test]
    fn test_copy_preserves_duplicates() {
        let mut src = HeaderMap::new();
        src.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        src.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
        src.append(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let out = copy_headers(&src, &[], true);
        let cookies: Vec<_> = out.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_copy_excludes_host_keeps_authorization() {
        let mut src = HeaderMap::new();
        src.insert(header::HOST, HeaderValue::from_static("mirantis.azurecr.io"));
        let auth = HeaderValue::from_bytes(b"Bearer eyJhbGciOi.\xfe.sig").unwrap();
        src.insert(header::AUTHORIZATION, auth.clone());

        let out = copy_headers(&src, &[header::HOST], true);
        assert!(out.get(header::HOST).is_none());
        assert_eq!(out.get(header::AUTHORIZATION).unwrap().as_bytes(), auth.as_bytes());
    }

    #[test]
    fn test_connection_listed_headers_stripped() {
        let mut src = HeaderMap::new();
        src.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, X-Trace-Hop"));
        src.insert("x-trace-hop", HeaderValue::from_static("1"));
        src.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        src.insert("x-kept", HeaderValue::from_static("yes"));

        let out = copy_headers(&src, &[], true);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("x-kept").unwrap(), "yes");
    }

    #[test]
    fn test_no_strip_keeps_hop_by_hop_but_not_framing() {
        let mut src = HeaderMap::new();
        src.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        src.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        src.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));

        let out = copy_headers(&src, &[], false);
        assert!(out.contains_key(header::CONNECTION));
        assert!(!out.contains_key(header::TRANSFER_ENCODING));
        assert_eq!(out.get(header::CONTENT_LENGTH).unwrap(), "10");
    }
}
