//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (connect / read / total deadlines on the shared client)
//!     → On failure: single attempt, translated to 502 by the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: one upstream attempt per inbound request

pub mod timeouts;
