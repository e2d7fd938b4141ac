//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → mount.rs (MountConfig for the admin mount)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Admin options distinguish "not given" from any given value
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod mount;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use mount::MountConfig;
pub use schema::{
    AdminSection, ListenerConfig, ObservabilityConfig, ServerConfig, Setting,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
