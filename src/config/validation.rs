//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect registries that collide on id or Host authority
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::routing::{RoutingTable, TableError};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("forwarding.max_chunk_bytes must be greater than zero")]
    ZeroChunkSize,

    #[error("at least one registry must be configured")]
    NoRegistries,

    #[error(transparent)]
    Routing(#[from] TableError),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let timeouts = [
        ("connect_secs", config.timeouts.connect_secs),
        ("read_secs", config.timeouts.read_secs),
        ("request_secs", config.timeouts.request_secs),
        ("idle_secs", config.timeouts.idle_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if config.forwarding.max_chunk_bytes == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }

    if config.registries.is_empty() {
        errors.push(ValidationError::NoRegistries);
    } else if let Err(table_errors) = RoutingTable::new(&config.registries) {
        errors.extend(table_errors.into_iter().map(ValidationError::Routing));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
