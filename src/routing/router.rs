//! Registry lookup by Host header.
//!
//! # Responsibilities
//! - Store the configured upstream registries
//! - Resolve a Host header to exactly one upstream
//! - Reject ambiguous configuration before any traffic is served
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) host lookup via HashMap
//! - Explicit NoMatch rather than silent default

use std::collections::HashMap;

use url::Url;

use crate::config::RegistryEntry;
use crate::routing::matcher::{authority_key, HostHeader};

/// Why a request could not be routed. Always answered with 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("Host header missing")]
    MissingHost,

    #[error("Registry for host {0} not supported")]
    UnknownHost(String),
}

/// Problems found while building the table from configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("registry id must not be empty (base_url {0:?})")]
    EmptyId(String),

    #[error("registry id {0:?} is declared more than once")]
    DuplicateId(String),

    #[error("registry {id:?}: invalid base_url {base_url:?}: {reason}")]
    InvalidBaseUrl {
        id: String,
        base_url: String,
        reason: String,
    },

    #[error("registries {first:?} and {second:?} both answer to host {authority:?}")]
    AmbiguousHost {
        authority: String,
        first: String,
        second: String,
    },
}

/// A resolved upstream registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    id: String,
    base_url: String,
    authority: String,
}

impl Upstream {
    fn from_entry(entry: &RegistryEntry) -> Result<Self, TableError> {
        let invalid = |reason: &str| TableError::InvalidBaseUrl {
            id: entry.id.clone(),
            base_url: entry.base_url.clone(),
            reason: reason.to_string(),
        };

        let url = Url::parse(entry.base_url.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials are not allowed"));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("must not carry a path, query or fragment"));
        }
        let authority = authority_key(&url).ok_or_else(|| invalid("missing host"))?;

        Ok(Self {
            id: entry.id.clone(),
            base_url: url.origin().ascii_serialization(),
            authority,
        })
    }

    /// Registry identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Scheme and authority, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Host header value this upstream answers to.
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// Immutable mapping from registry id and Host authority to upstream.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    upstreams: Vec<Upstream>,
    by_id: HashMap<String, usize>,
    by_authority: HashMap<String, usize>,
}

impl RoutingTable {
    /// Build the table, reporting every conflicting or malformed entry.
    pub fn new(entries: &[RegistryEntry]) -> Result<Self, Vec<TableError>> {
        let mut errors = Vec::new();
        let mut upstreams = Vec::with_capacity(entries.len());
        let mut by_id = HashMap::new();
        let mut by_authority = HashMap::new();

        for entry in entries {
            if entry.id.trim().is_empty() {
                errors.push(TableError::EmptyId(entry.base_url.clone()));
                continue;
            }
            if by_id.contains_key(&entry.id) {
                errors.push(TableError::DuplicateId(entry.id.clone()));
                continue;
            }

            let upstream = match Upstream::from_entry(entry) {
                Ok(upstream) => upstream,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            if let Some(&existing) = by_authority.get(&upstream.authority) {
                let first: &Upstream = &upstreams[existing];
                errors.push(TableError::AmbiguousHost {
                    authority: upstream.authority.clone(),
                    first: first.id.clone(),
                    second: upstream.id.clone(),
                });
                continue;
            }

            let index = upstreams.len();
            by_id.insert(upstream.id.clone(), index);
            by_authority.insert(upstream.authority.clone(), index);
            upstreams.push(upstream);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            upstreams,
            by_id,
            by_authority,
        })
    }

    /// Base URL of the registry with the given id.
    pub fn by_id(&self, id: &str) -> Option<&str> {
        self.by_id
            .get(id)
            .map(|&index| self.upstreams[index].base_url())
    }

    /// Registry id answering to the given Host header value.
    pub fn by_host(&self, host_header: &str) -> Option<&str> {
        self.resolve(Some(host_header)).ok().map(Upstream::id)
    }

    /// Resolve a Host header to its upstream.
    ///
    /// An explicit port is matched exactly first. If that misses, the port is
    /// ignored, but only for upstreams configured without a non-default port.
    pub fn resolve(&self, host_header: Option<&str>) -> Result<&Upstream, RoutingError> {
        let raw = match host_header.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(RoutingError::MissingHost),
        };
        let unknown = || RoutingError::UnknownHost(raw.to_string());

        let host = HostHeader::parse(raw).ok_or_else(unknown)?;
        if let Some(&index) = self.by_authority.get(&host.key()) {
            return Ok(&self.upstreams[index]);
        }

        // Port-less keys only exist for upstreams on their scheme's default port.
        if host.port().is_some() {
            if let Some(&index) = self.by_authority.get(host.host()) {
                return Ok(&self.upstreams[index]);
            }
        }

        Err(unknown())
    }

    /// Upstreams in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Upstream> {
        self.upstreams.iter()
    }

    pub fn len(&self) -> usize {
        self.upstreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }
}
