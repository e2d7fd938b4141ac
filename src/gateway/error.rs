//! Gateway protocol errors.

use thiserror::Error;

use crate::gateway::scope::ScopeKind;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("client disconnected")]
    Disconnected,

    #[error("unexpected message {received} while {state}")]
    Protocol {
        received: &'static str,
        state: &'static str,
    },

    #[error("scope type '{0}' cannot be handled here")]
    UnsupportedScope(ScopeKind),

    #[error("body read failed: {0}")]
    Body(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("application error: {0}")]
    Application(#[source] BoxError),
}

impl GatewayError {
    /// Wrap an arbitrary application failure.
    pub fn application(err: impl Into<BoxError>) -> Self {
        GatewayError::Application(err.into())
    }
}
