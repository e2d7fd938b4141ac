//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (subscriber: filter + fmt or JSON output)
//!
//! Consumers:
//!     → stdout, collected by whatever runs the process
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through the trace layer's request span
//! - `RUST_LOG` overrides the configured filter

pub mod logging;

pub use logging::init_logging;
