//! Bridge from axum requests to gateway applications.
//!
//! # Responsibilities
//! - Build a [`Scope`] from the request head
//! - Stream the request body into the application's receive channel
//! - Turn the application's send events back into an axum response
//!
//! # Design Decisions
//! - The application runs on its own task; the response body is streamed
//! - Dropping the response (client gone, timeout) aborts the task

use async_trait::async_trait;
use axum::body::{Body, BodyDataStream};
use axum::http::{request::Parts, HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::{stream, StreamExt};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tower::Service;

use crate::gateway::{
    AppRef, Application, GatewayError, Message, Receive, Scope, ScopeState, Transmit,
};

/// Response body chunks buffered between the application and the client.
const BODY_CHANNEL_CAPACITY: usize = 16;

/// Tower service that serves requests with a gateway [`Application`].
pub struct GatewayService<A> {
    app: Arc<A>,
    owner: AppRef,
}

impl<A> Clone for GatewayService<A> {
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            owner: self.owner.clone(),
        }
    }
}

impl<A: Application> GatewayService<A> {
    /// `owner` is recorded as the scope's owning application.
    pub fn new(app: A, owner: AppRef) -> Self {
        Self {
            app: Arc::new(app),
            owner,
        }
    }
}

impl<A: Application> Service<Request<Body>> for GatewayService<A> {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let app = self.app.clone();
        let owner = self.owner.clone();
        Box::pin(async move { Ok(dispatch(app, owner, request).await) })
    }
}

/// Scope for a request as it arrives at the service.
///
/// `path` is percent-decoded; `raw_path` keeps the bytes from the wire.
pub fn scope_from_parts(parts: &Parts, owner: AppRef) -> ScopeState {
    let wire_path = parts.uri.path();
    let path = percent_decode_str(wire_path).decode_utf8_lossy();
    let mut state = ScopeState::http(parts.method.clone(), path, owner);
    state.raw_path = Bytes::copy_from_slice(wire_path.as_bytes());
    state.query_string = parts
        .uri
        .query()
        .map(|q| Bytes::copy_from_slice(q.as_bytes()))
        .unwrap_or_default();
    state.headers = parts.headers.clone();
    state
}

async fn dispatch<A: Application>(app: Arc<A>, owner: AppRef, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let scope = Scope::new(scope_from_parts(&parts, owner));
    let (start_tx, start_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        let mut receive = BodyReceive::new(body);
        let mut transmit = ResponseTransmit {
            start: Some(start_tx),
            body: Some(body_tx),
        };
        if let Err(e) = app.call(&scope, &mut receive, &mut transmit).await {
            tracing::error!(path = %scope.path(), error = %e, "Gateway application failed");
        }
    });
    let guard = AbortOnDrop(Some(task.abort_handle()));

    let Ok((status, headers)) = start_rx.await else {
        tracing::warn!(method = %parts.method, uri = %parts.uri, "Application returned without a response");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let chunks = stream::unfold((body_rx, guard), |(mut rx, mut guard)| async move {
        match rx.recv().await {
            Some(chunk) => Some((Ok::<_, Infallible>(chunk), (rx, guard))),
            None => {
                guard.disarm();
                None
            }
        }
    });

    let mut response = Response::new(Body::from_stream(chunks));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Aborts the application task unless disarmed.
struct AbortOnDrop(Option<AbortHandle>);

impl AbortOnDrop {
    fn disarm(&mut self) {
        self.0.take();
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

/// Receive channel fed from an axum request body.
struct BodyReceive {
    stream: BodyDataStream,
    complete: bool,
}

impl BodyReceive {
    fn new(body: Body) -> Self {
        Self {
            stream: body.into_data_stream(),
            complete: false,
        }
    }
}

#[async_trait]
impl Receive for BodyReceive {
    async fn receive(&mut self) -> Result<Message, GatewayError> {
        if self.complete {
            return Ok(Message::HttpDisconnect);
        }
        match self.stream.next().await {
            Some(Ok(chunk)) => Ok(Message::HttpRequest {
                body: chunk,
                more_body: true,
            }),
            Some(Err(e)) => Err(GatewayError::Body(e.to_string())),
            None => {
                self.complete = true;
                Ok(Message::HttpRequest {
                    body: Bytes::new(),
                    more_body: false,
                })
            }
        }
    }
}

/// Send channel that feeds the axum response.
struct ResponseTransmit {
    start: Option<oneshot::Sender<(StatusCode, HeaderMap)>>,
    body: Option<mpsc::Sender<Bytes>>,
}

#[async_trait]
impl Transmit for ResponseTransmit {
    async fn send(&mut self, message: Message) -> Result<(), GatewayError> {
        match message {
            Message::HttpResponseStart { status, headers } => {
                let start = self.start.take().ok_or(GatewayError::Protocol {
                    received: "http.response.start",
                    state: "response already started",
                })?;
                start
                    .send((status, headers))
                    .map_err(|_| GatewayError::Disconnected)
            }
            Message::HttpResponseBody { body, more_body } => {
                if self.start.is_some() {
                    return Err(GatewayError::Protocol {
                        received: "http.response.body",
                        state: "response not started",
                    });
                }
                let tx = self.body.as_ref().ok_or(GatewayError::Protocol {
                    received: "http.response.body",
                    state: "response already complete",
                })?;
                if !body.is_empty() {
                    tx.send(body).await.map_err(|_| GatewayError::Disconnected)?;
                }
                if !more_body {
                    self.body = None;
                }
                Ok(())
            }
            other => Err(GatewayError::Protocol {
                received: other.name(),
                state: "sending response",
            }),
        }
    }
}
