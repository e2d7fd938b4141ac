use async_trait::async_trait;
use axum::http::{header, HeaderValue, StatusCode};
use std::sync::Arc;

use crate::gateway::{
    Application, BoxApp, GatewayError, Middleware, Receive, Reply, Scope, ScopeState, Transmit,
};

/// Decides whether a request may reach the admin endpoints.
#[async_trait]
pub trait AuthenticationBackend: Send + Sync + 'static {
    async fn authenticate(&self, scope: &ScopeState) -> bool;
}

/// Accepts requests carrying `Authorization: Bearer <api key>`.
#[derive(Debug, Clone)]
pub struct TokenAuthentication {
    api_key: String,
}

impl TokenAuthentication {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl AuthenticationBackend for TokenAuthentication {
    async fn authenticate(&self, scope: &ScopeState) -> bool {
        let auth_header = scope
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|v| v.strip_prefix("Bearer ")) {
            Some(token) => !self.api_key.is_empty() && token == self.api_key,
            None => false,
        }
    }
}

/// Middleware rejecting unauthenticated requests with 401.
pub struct RequireAuthentication {
    backend: Arc<dyn AuthenticationBackend>,
}

impl RequireAuthentication {
    pub fn new(backend: Arc<dyn AuthenticationBackend>) -> Self {
        Self { backend }
    }
}

impl Middleware for RequireAuthentication {
    fn wrap(&self, next: BoxApp) -> BoxApp {
        Arc::new(AuthenticatedApp {
            backend: self.backend.clone(),
            next,
        })
    }
}

struct AuthenticatedApp {
    backend: Arc<dyn AuthenticationBackend>,
    next: BoxApp,
}

#[async_trait]
impl Application for AuthenticatedApp {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError> {
        if self.backend.authenticate(&scope.snapshot()).await {
            return self.next.call(scope, receive, send).await;
        }

        tracing::warn!(path = %scope.path(), "Rejected unauthenticated admin request");
        Reply::text(StatusCode::UNAUTHORIZED, "Unauthorized")
            .with_header(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))
            .send_to(send)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AppRef;
    use axum::http::Method;

    fn scope_with(auth: Option<&'static str>) -> ScopeState {
        let mut state = ScopeState::http(Method::GET, "/admin/", AppRef::new("admin"));
        if let Some(value) = auth {
            state
                .headers
                .insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        }
        state
    }

    #[tokio::test]
    async fn test_token_authentication() {
        let backend = TokenAuthentication::new("secret");
        assert!(backend.authenticate(&scope_with(Some("Bearer secret"))).await);
        assert!(!backend.authenticate(&scope_with(Some("Bearer wrong"))).await);
        assert!(!backend.authenticate(&scope_with(Some("secret"))).await);
        assert!(!backend.authenticate(&scope_with(None)).await);
    }

    #[tokio::test]
    async fn test_empty_key_never_authenticates() {
        let backend = TokenAuthentication::new("");
        assert!(!backend.authenticate(&scope_with(Some("Bearer "))).await);
    }
}
