//! In-process channel implementations.
//!
//! Used to drive an [`Application`](crate::gateway::Application) without a
//! network connection, e.g. from tests or from start-up checks.

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;

use crate::gateway::app::{Receive, Transmit};
use crate::gateway::error::GatewayError;
use crate::gateway::message::Message;

/// Replays a fixed list of inbound events, then reports a disconnect.
#[derive(Debug, Default)]
pub struct QueueReceive {
    queue: VecDeque<Message>,
}

impl QueueReceive {
    pub fn new(messages: impl IntoIterator<Item = Message>) -> Self {
        Self {
            queue: messages.into_iter().collect(),
        }
    }

    /// A single complete request body.
    pub fn body(body: impl Into<Bytes>) -> Self {
        Self::new([Message::HttpRequest {
            body: body.into(),
            more_body: false,
        }])
    }
}

#[async_trait]
impl Receive for QueueReceive {
    async fn receive(&mut self) -> Result<Message, GatewayError> {
        Ok(self.queue.pop_front().unwrap_or(Message::HttpDisconnect))
    }
}

/// Records every outbound event.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    pub messages: Vec<Message>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.messages.iter().find_map(|m| match m {
            Message::HttpResponseStart { status, .. } => Some(*status),
            _ => None,
        })
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.messages.iter().find_map(|m| match m {
            Message::HttpResponseStart { headers, .. } => Some(headers),
            _ => None,
        })
    }

    /// Concatenated body chunks.
    pub fn body(&self) -> Bytes {
        let mut body = BytesMut::new();
        for message in &self.messages {
            if let Message::HttpResponseBody { body: chunk, .. } = message {
                body.extend_from_slice(chunk);
            }
        }
        body.freeze()
    }

    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body()).ok()
    }
}

#[async_trait]
impl Transmit for ResponseRecorder {
    async fn send(&mut self, message: Message) -> Result<(), GatewayError> {
        self.messages.push(message);
        Ok(())
    }
}
