//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the host's own handlers
//! - Mount the admin through its start-up hook
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a listener until shutdown is signalled

use axum::{http::HeaderName, routing::get, Json, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::mount::AdminMount;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Host HTTP server with the admin mounted into it.
pub struct HostServer {
    router: Router,
    config: ServerConfig,
}

impl HostServer {
    /// Create the server and run the admin's start-up hook.
    pub fn new(config: ServerConfig, admin: &AdminMount) -> Self {
        let router = Self::build_router(&config, admin);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, admin: &AdminMount) -> Router {
        let host = Router::new().route("/health", get(health_handler));
        admin
            .on_app_init(host)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for serving without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MountConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_and_request_id() {
        let admin = AdminMount::register(MountConfig::new());
        let server = HostServer::new(ServerConfig::default(), &admin);

        let response = server
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_host_routes_outside_mount_untouched() {
        let admin = AdminMount::register(MountConfig::new());
        let server = HostServer::new(ServerConfig::default(), &admin);

        let response = server
            .router()
            .oneshot(Request::builder().uri("/elsewhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
