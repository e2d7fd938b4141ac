//! Routing subsystem of the gateway toolkit.
//!
//! # Data Flow
//! ```text
//! Incoming scope (route path = path minus root path, method)
//!     → router.rs (route lookup, mount dispatch)
//!     → matcher.rs (evaluate path patterns and prefixes)
//!     → Return: endpoint call, mount call, 404/405, or slash redirect
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable while serving
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod router;

pub use router::Router;
