//! Host authority matching.
//!
//! # Responsibilities
//! - Parse the inbound Host header into host + optional port
//! - Derive the lookup key of a configured upstream base URL
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Keys are `host` or `host:port`; default ports never appear in keys
//! - No wildcard or suffix matching

use axum::http::uri::Authority;
use url::Url;

/// A parsed `Host` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostHeader {
    host: String,
    port: Option<u16>,
}

impl HostHeader {
    /// Parse a raw Host header value.
    /// Returns `None` for empty values and values that are not a bare authority.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.contains('@') {
            return None;
        }

        let authority: Authority = raw.parse().ok()?;
        if authority.host().is_empty() {
            return None;
        }
        // `Authority` accepts a non-numeric port; a Host header must not.
        if authority.as_str().len() > authority.host().len() && authority.port_u16().is_none() {
            return None;
        }

        Some(Self {
            host: authority.host().to_ascii_lowercase(),
            port: authority.port_u16(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Exact lookup key, including the port when one was sent.
    pub fn key(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }
}

/// Lookup key for an upstream URL: the authority with the scheme removed.
///
/// `url` already drops a port equal to the scheme default, so
/// `https://example.com:443` and `https://example.com` share a key.
pub fn authority_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_header_parse() {
        let host = HostHeader::parse("Mirantis.AzureCR.io").unwrap();
        assert_eq!(host.host(), "mirantis.azurecr.io");
        assert_eq!(host.port(), None);
        assert_eq!(host.key(), "mirantis.azurecr.io");

        let host = HostHeader::parse("localhost:5000").unwrap();
        assert_eq!(host.host(), "localhost");
        assert_eq!(host.port(), Some(5000));
        assert_eq!(host.key(), "localhost:5000");

        let host = HostHeader::parse("[::1]:8080").unwrap();
        assert_eq!(host.key(), "[::1]:8080");
    }

    #[test]
    fn test_host_header_rejects_garbage() {
        assert_eq!(HostHeader::parse(""), None);
        assert_eq!(HostHeader::parse("   "), None);
        assert_eq!(HostHeader::parse("user@example.com"), None);
        assert_eq!(HostHeader::parse("example.com/path"), None);
        assert_eq!(HostHeader::parse("example.com:notaport"), None);
    }

    #[test]
    fn test_authority_key() {
        let url = Url::parse("https://Mirantis.azurecr.io").unwrap();
        assert_eq!(authority_key(&url).as_deref(), Some("mirantis.azurecr.io"));

        let url = Url::parse("https://mirantis.azurecr.io:443").unwrap();
        assert_eq!(authority_key(&url).as_deref(), Some("mirantis.azurecr.io"));

        let url = Url::parse("http://127.0.0.1:8080").unwrap();
        assert_eq!(authority_key(&url).as_deref(), Some("127.0.0.1:8080"));
    }
}
