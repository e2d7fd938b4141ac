//! Buffered responses.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;
use serde::Serialize;

use crate::gateway::app::Transmit;
use crate::gateway::error::GatewayError;
use crate::gateway::message::Message;

/// A complete response sent as one start and one body event.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        let mut reply = Self::new(status);
        reply.body = Bytes::from(body.into());
        reply.with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )
    }

    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                let mut reply = Self::new(status);
                reply.body = Bytes::from(body);
                reply.with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON reply");
                Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    /// Redirect to `location`; falls back to 500 if it is not a valid header value.
    pub fn redirect(status: StatusCode, location: &str) -> Self {
        match HeaderValue::from_str(location) {
            Ok(value) => Self::new(status).with_header(header::LOCATION, value),
            Err(_) => Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect location"),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub async fn send_to(self, send: &mut dyn Transmit) -> Result<(), GatewayError> {
        let mut headers = self.headers;
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        send.send(Message::HttpResponseStart {
            status: self.status,
            headers,
        })
        .await?;
        send.send(Message::HttpResponseBody {
            body: self.body,
            more_body: false,
        })
        .await
    }
}
