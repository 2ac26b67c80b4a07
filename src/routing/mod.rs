//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header)
//!     → matcher.rs (parse authority, normalize case)
//!     → router.rs (authority → registry lookup)
//!     → Return: Upstream or RoutingError
//!
//! Table Compilation (at startup):
//!     RegistryEntry[]
//!     → parse base URLs
//!     → reject duplicate ids / ambiguous hosts
//!     → Freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Table compiled at startup, immutable at runtime
//! - Deterministic: same Host always resolves to same registry
//! - Ambiguity is a startup error, never a per-request surprise

pub mod matcher;
pub mod router;

pub use router::{RoutingError, RoutingTable, TableError, Upstream};
