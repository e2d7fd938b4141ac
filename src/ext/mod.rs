//! Optional view extensions.

pub mod audit;

pub use audit::{AuditModelView, DateTimeUtcConverter, DateTimeUtcField};
