//! Events exchanged over the receive and send channels.

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

/// A single gateway protocol event.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Inbound request body chunk.
    HttpRequest { body: Bytes, more_body: bool },
    /// Client went away.
    HttpDisconnect,
    /// Outbound status line and headers. Must precede any body.
    HttpResponseStart { status: StatusCode, headers: HeaderMap },
    /// Outbound body chunk; `more_body: false` completes the response.
    HttpResponseBody { body: Bytes, more_body: bool },
}

impl Message {
    pub fn name(&self) -> &'static str {
        match self {
            Message::HttpRequest { .. } => "http.request",
            Message::HttpDisconnect => "http.disconnect",
            Message::HttpResponseStart { .. } => "http.response.start",
            Message::HttpResponseBody { .. } => "http.response.body",
        }
    }
}
