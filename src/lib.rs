//! Admin mount for a host HTTP server.
//!
//! Embeds a gateway-toolkit admin site inside a host application: the host
//! forwards everything below the mount path, the mount rebuilds the full
//! path, normalizes trailing slashes and keeps admin failures away from the
//! host.

// Gateway toolkit
pub mod gateway;
pub mod routing;

// Admin site
pub mod admin;
pub mod ext;
pub mod mount;

// Host integration
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{MountConfig, ServerConfig, Setting};
pub use http::HostServer;
pub use lifecycle::Shutdown;
pub use mount::AdminMount;
