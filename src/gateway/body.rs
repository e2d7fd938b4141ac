//! Request body collection.

use bytes::{Bytes, BytesMut};

use crate::gateway::app::Receive;
use crate::gateway::error::GatewayError;
use crate::gateway::message::Message;

/// Read the whole request body, refusing anything above `limit` bytes.
pub async fn read_body(receive: &mut dyn Receive, limit: usize) -> Result<Bytes, GatewayError> {
    let mut body = BytesMut::new();
    loop {
        match receive.receive().await? {
            Message::HttpRequest {
                body: chunk,
                more_body,
            } => {
                if body.len() + chunk.len() > limit {
                    return Err(GatewayError::PayloadTooLarge { limit });
                }
                body.extend_from_slice(&chunk);
                if !more_body {
                    return Ok(body.freeze());
                }
            }
            Message::HttpDisconnect => return Err(GatewayError::Disconnected),
            other => {
                return Err(GatewayError::Protocol {
                    received: other.name(),
                    state: "reading request body",
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::local::QueueReceive;

    #[tokio::test]
    async fn test_reads_chunked_body() {
        let mut receive = QueueReceive::new([
            Message::HttpRequest {
                body: Bytes::from_static(b"a=1&"),
                more_body: true,
            },
            Message::HttpRequest {
                body: Bytes::from_static(b"b=2"),
                more_body: false,
            },
        ]);
        let body = read_body(&mut receive, 1024).await.unwrap();
        assert_eq!(&body[..], b"a=1&b=2");
    }

    #[tokio::test]
    async fn test_disconnect_and_limit() {
        let mut receive = QueueReceive::default();
        assert!(matches!(
            read_body(&mut receive, 1024).await,
            Err(GatewayError::Disconnected)
        ));

        let mut receive = QueueReceive::body("too long");
        assert!(matches!(
            read_body(&mut receive, 3).await,
            Err(GatewayError::PayloadTooLarge { limit: 3 })
        ));
    }
}
