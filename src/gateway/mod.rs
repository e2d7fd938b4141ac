//! Gateway protocol subsystem.
//!
//! # Data Flow
//! ```text
//! host request
//!     → scope.rs (shared request context)
//!     → app.rs (Application::call with receive/send channels)
//!     → middleware chain → router → endpoint
//!     → message.rs (response start + body events)
//!     → back to the host
//! ```
//!
//! # Design Decisions
//! - The context is a shared handle so every layer observes the same request
//! - Layers that rewrite the context either fork it or restore it on exit

pub mod app;
pub mod body;
pub mod error;
pub mod local;
pub mod message;
pub mod reply;
pub mod scope;

pub use app::{Application, BoxApp, GatewayApp, Middleware, Receive, Transmit};
pub use body::read_body;
pub use error::{BoxError, GatewayError};
pub use message::Message;
pub use reply::Reply;
pub use scope::{AppRef, Scope, ScopeKind, ScopeState};
