//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the registry proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream registries, in declaration order.
    pub registries: Vec<RegistryEntry>,

    /// Timeout configuration for upstream calls.
    pub timeouts: TimeoutConfig,

    /// Header and body forwarding policy.
    pub forwarding: ForwardingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            registries: default_registries(),
            timeouts: TimeoutConfig::default(),
            forwarding: ForwardingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// One upstream registry the proxy can forward to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryEntry {
    /// Registry identifier for logging/metrics.
    pub id: String,

    /// Scheme and authority of the upstream, e.g. "https://mirantis.azurecr.io".
    pub base_url: String,
}

impl RegistryEntry {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
        }
    }
}

/// Registries served when no configuration file is given.
pub fn default_registries() -> Vec<RegistryEntry> {
    vec![
        RegistryEntry::new("azure", "https://mirantis.azurecr.io"),
        RegistryEntry::new("repos", "https://repos.mirantis.com"),
        RegistryEntry::new("binary", "https://binary.mirantis.com"),
        RegistryEntry::new("mirror", "https://mirror.mirantis.com"),
        RegistryEntry::new("deb", "https://deb.nodesource.com"),
        RegistryEntry::new("archive", "http://archive.ubuntu.com"),
        RegistryEntry::new("security", "http://security.ubuntu.com"),
    ]
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Longest stall between two reads from the upstream, in seconds.
    pub read_secs: u64,

    /// Total transfer budget (request + full response body) in seconds.
    pub request_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            read_secs: 30,
            request_secs: 30,
            idle_secs: 90,
        }
    }
}

/// Header and body forwarding policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Strip hop-by-hop headers (Connection, Keep-Alive, ...) in both directions.
    pub strip_hop_by_hop: bool,

    /// Largest body chunk handed to the client in one write.
    pub max_chunk_bytes: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            strip_hop_by_hop: true,
            max_chunk_bytes: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
