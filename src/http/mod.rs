//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace)
//!     → host routes (/health)
//!     → bridge.rs (gateway scope + channels) for everything below the mount
//!     → streamed response back to the client
//! ```

pub mod bridge;
pub mod server;

pub use bridge::GatewayService;
pub use server::{HostServer, X_REQUEST_ID};
