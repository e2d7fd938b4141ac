//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store endpoint routes and mounts in registration order
//! - Dispatch a scope to the first matching route
//! - Answer 404/405, or redirect to the slash-toggled path when enabled
//!
//! # Design Decisions
//! - Routes are fixed once the router is shared; only the redirect policy
//!   can change afterwards
//! - Mounts dispatch a forked scope with an extended root path
//! - First match wins

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::gateway::{
    Application, BoxApp, GatewayError, Receive, Reply, Scope, ScopeKind, Transmit,
};
use crate::routing::matcher::{Matcher, PatternMatcher, PrefixMatcher};

#[derive(Clone)]
enum Route {
    Endpoint {
        matcher: PatternMatcher,
        methods: Vec<Method>,
        app: BoxApp,
    },
    Mount {
        matcher: PrefixMatcher,
        app: BoxApp,
    },
}

enum Resolved<'a> {
    Endpoint(&'a BoxApp, BTreeMap<String, String>),
    Mount(&'a str, &'a BoxApp),
    MethodNotAllowed,
    NotFound,
}

/// Toolkit router.
pub struct Router {
    routes: Vec<Route>,
    redirect_slashes: AtomicBool,
}

impl Router {
    /// Empty router with slash redirects enabled.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            redirect_slashes: AtomicBool::new(true),
        }
    }

    /// Register an endpoint. An empty method list accepts any method.
    pub fn add_route(&mut self, path: &str, methods: &[Method], app: BoxApp) {
        let mut methods = methods.to_vec();
        if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
            methods.push(Method::HEAD);
        }
        self.routes.push(Route::Endpoint {
            matcher: PatternMatcher::new(path),
            methods,
            app,
        });
    }

    /// Dispatch everything below `prefix` to `app`.
    pub fn mount(&mut self, prefix: &str, app: BoxApp) {
        self.routes.push(Route::Mount {
            matcher: PrefixMatcher::new(prefix),
            app,
        });
    }

    pub fn route(mut self, path: &str, methods: &[Method], app: BoxApp) -> Self {
        self.add_route(path, methods, app);
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Whether an unmatched path is redirected to its slash-toggled twin.
    pub fn redirect_slashes(&self) -> bool {
        self.redirect_slashes.load(Ordering::Acquire)
    }

    pub fn set_redirect_slashes(&self, enabled: bool) {
        self.redirect_slashes.store(enabled, Ordering::Release);
    }

    fn resolve(&self, path: &str, method: &Method) -> Resolved<'_> {
        let mut method_mismatch = false;
        for route in &self.routes {
            match route {
                Route::Endpoint {
                    matcher,
                    methods,
                    app,
                } => {
                    if let Some(found) = matcher.matches(path) {
                        if methods.is_empty() || methods.contains(method) {
                            return Resolved::Endpoint(app, found.params);
                        }
                        method_mismatch = true;
                    }
                }
                Route::Mount { matcher, app } => {
                    if matcher.matches(path).is_some() {
                        return Resolved::Mount(matcher.prefix(), app);
                    }
                }
            }
        }
        if method_mismatch {
            Resolved::MethodNotAllowed
        } else {
            Resolved::NotFound
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Router {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            redirect_slashes: AtomicBool::new(self.redirect_slashes()),
        }
    }
}

fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => format!("{path}/"),
    }
}

#[async_trait]
impl Application for Router {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError> {
        let kind = scope.kind();
        if kind != ScopeKind::Http {
            return Err(GatewayError::UnsupportedScope(kind));
        }

        let (route_path, method) = scope.read(|s| (s.route_path().to_string(), s.method.clone()));
        match self.resolve(&route_path, &method) {
            Resolved::Endpoint(app, params) => {
                scope.update(|s| s.path_params.extend(params));
                app.call(scope, receive, send).await
            }
            Resolved::Mount(prefix, app) => {
                let child = scope.fork();
                child.update(|s| s.root_path.push_str(prefix));
                app.call(&child, receive, send).await
            }
            Resolved::MethodNotAllowed => {
                Reply::text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
                    .send_to(send)
                    .await
            }
            Resolved::NotFound => {
                if self.redirect_slashes() && route_path != "/" {
                    let alternate = toggle_trailing_slash(&route_path);
                    if !matches!(
                        self.resolve(&alternate, &method),
                        Resolved::NotFound | Resolved::MethodNotAllowed
                    ) {
                        let location = scope.read(|s| {
                            let mut location = format!("{}{}", s.root_path, alternate);
                            if !s.query_string.is_empty() {
                                location.push('?');
                                location.push_str(&String::from_utf8_lossy(&s.query_string));
                            }
                            location
                        });
                        tracing::debug!(from = %route_path, to = %location, "Redirecting slash variant");
                        return Reply::redirect(StatusCode::TEMPORARY_REDIRECT, &location)
                            .send_to(send)
                            .await;
                    }
                }
                Reply::text(StatusCode::NOT_FOUND, "Not Found").send_to(send).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::local::{QueueReceive, ResponseRecorder};
    use crate::gateway::{AppRef, ScopeState};
    use axum::http::header;
    use std::sync::Arc;

    struct Named(&'static str);

    #[async_trait]
    impl Application for Named {
        async fn call(
            &self,
            scope: &Scope,
            _receive: &mut dyn Receive,
            send: &mut dyn Transmit,
        ) -> Result<(), GatewayError> {
            let state = scope.snapshot();
            Reply::json(
                StatusCode::OK,
                &serde_json::json!({
                    "name": self.0,
                    "root_path": state.root_path,
                    "params": state.path_params,
                }),
            )
            .send_to(send)
            .await
        }
    }

    fn router() -> Router {
        let mut inner = Router::new();
        inner.add_route("/", &[Method::GET], Arc::new(Named("index")));
        inner.add_route("/{identity}/list", &[Method::GET], Arc::new(Named("list")));

        let mut outer = Router::new();
        outer.add_route("/health", &[Method::GET], Arc::new(Named("health")));
        outer.mount("/admin", Arc::new(inner));
        outer
    }

    async fn dispatch(router: &Router, method: Method, path: &str) -> ResponseRecorder {
        let scope = Scope::new(ScopeState::http(method, path, AppRef::new("test")));
        let mut receive = QueueReceive::default();
        let mut recorder = ResponseRecorder::new();
        router.call(&scope, &mut receive, &mut recorder).await.unwrap();
        recorder
    }

    #[tokio::test]
    async fn test_dispatches_through_mount() {
        let response = dispatch(&router(), Method::GET, "/admin/user/list").await;
        let body = response.json().unwrap();
        assert_eq!(body["name"], "list");
        assert_eq!(body["root_path"], "/admin");
        assert_eq!(body["params"]["identity"], "user");
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let router = router();
        assert_eq!(
            dispatch(&router, Method::GET, "/missing").await.status(),
            Some(StatusCode::NOT_FOUND)
        );
        assert_eq!(
            dispatch(&router, Method::POST, "/health").await.status(),
            Some(StatusCode::METHOD_NOT_ALLOWED)
        );
    }

    #[tokio::test]
    async fn test_redirects_slash_variant_when_enabled() {
        let router = router();
        let response = dispatch(&router, Method::GET, "/health/").await;
        assert_eq!(response.status(), Some(StatusCode::TEMPORARY_REDIRECT));
        assert_eq!(response.headers().unwrap()[header::LOCATION], "/health");

        router.set_redirect_slashes(false);
        let response = dispatch(&router, Method::GET, "/health/").await;
        assert_eq!(response.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_rejects_lifespan_scope() {
        let scope = Scope::new(ScopeState {
            kind: ScopeKind::Lifespan,
            ..ScopeState::http(Method::GET, "/", AppRef::new("test"))
        });
        let result = router()
            .call(&scope, &mut QueueReceive::default(), &mut ResponseRecorder::new())
            .await;
        assert!(matches!(result, Err(GatewayError::UnsupportedScope(ScopeKind::Lifespan))));
    }

    #[test]
    fn test_clone_keeps_redirect_policy() {
        let router = router();
        router.set_redirect_slashes(false);
        assert!(!router.clone().redirect_slashes());
    }
}
