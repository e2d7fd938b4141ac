//! Shared fixtures for the integration tests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use admin_mount::admin::views::{ColumnSpec, ModelView, StaticView, ViewError};
use admin_mount::config::{MountConfig, ServerConfig};
use admin_mount::http::HostServer;
use admin_mount::lifecycle::Shutdown;
use admin_mount::mount::AdminMount;

/// View whose listing always panics.
pub struct ExplodingView;

#[async_trait]
impl ModelView for ExplodingView {
    fn identity(&self) -> &str {
        "exploding"
    }

    fn name(&self) -> &str {
        "Exploding"
    }

    fn columns(&self) -> Vec<ColumnSpec> {
        vec![ColumnSpec::new("id", "Integer").primary_key()]
    }

    async fn list(&self) -> Result<Vec<Value>, ViewError> {
        panic!("listing exploded")
    }
}

pub fn users() -> Arc<dyn ModelView> {
    Arc::new(
        StaticView::new(
            "user",
            "User",
            vec![
                ColumnSpec::new("id", "Integer").primary_key(),
                ColumnSpec::new("email", "String"),
                ColumnSpec::new("active", "Boolean"),
            ],
        )
        .with_rows(vec![
            json!({"id": 1, "email": "ada@example.com", "active": true}),
            json!({"id": 2, "email": "alan@example.com", "active": false}),
        ]),
    )
}

/// Admin mount with a user view and a view that panics.
pub fn mount(config: MountConfig) -> AdminMount {
    AdminMount::register(config.views(vec![users(), Arc::new(ExplodingView)]))
}

pub fn host(admin: &AdminMount) -> axum::Router {
    HostServer::new(ServerConfig::default(), admin).router()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve `admin` on an ephemeral port; returns the address and the
/// shutdown handle that stops it.
#[allow(dead_code)]
pub async fn serve(admin: &AdminMount) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HostServer::new(ServerConfig::default(), admin);
    tokio::spawn(server.run(listener, shutdown.subscribe()));
    (addr, shutdown)
}
