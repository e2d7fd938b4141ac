//! Administrative site built on the gateway toolkit.
//!
//! # Data Flow
//! ```text
//! outer GatewayApp router
//!     → mount at base URL
//!     → admin GatewayApp (auth + custom middleware)
//!     → admin router: /, /{identity}/list, /{identity}/details/{pk}, /{identity}/create
//!     → handlers.rs (JSON pages over the registered views)
//! ```
//!
//! # Design Decisions
//! - Views are registered at startup and read lock-free while serving
//! - Rendering is JSON; HTML templates live outside this crate

pub mod auth;
pub mod forms;
pub mod handlers;
pub mod views;

use arc_swap::ArcSwap;
use axum::http::Method;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::gateway::{AppRef, GatewayApp, Middleware};
use crate::routing::Router;
use self::auth::{AuthenticationBackend, RequireAuthentication};
use self::handlers::{AdminState, Endpoint, Page};
use self::views::ModelView;

pub use self::auth::TokenAuthentication;
pub use self::views::{ColumnSpec, StaticView, ViewConfig, ViewError};

pub const DEFAULT_BASE_URL: &str = "/admin";
pub const DEFAULT_TITLE: &str = "Admin";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
pub const DEFAULT_MAX_FORM_BYTES: usize = 64 * 1024;

/// Construction options of an [`AdminSite`].
#[derive(Clone)]
pub struct AdminOptions {
    pub base_url: String,
    pub title: String,
    pub logo_url: Option<String>,
    pub templates_dir: PathBuf,
    pub max_form_bytes: usize,
    pub middlewares: Vec<Arc<dyn Middleware>>,
    pub authentication_backend: Option<Arc<dyn AuthenticationBackend>>,
}

impl Default for AdminOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            title: DEFAULT_TITLE.to_string(),
            logo_url: None,
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
            middlewares: Vec::new(),
            authentication_backend: None,
        }
    }
}

/// The admin site, mounted inside a host [`GatewayApp`].
pub struct AdminSite {
    state: Arc<AdminState>,
    app: Arc<GatewayApp>,
}

impl AdminSite {
    /// Build the admin application and mount it into `host` at the base URL.
    pub fn new(host: &mut GatewayApp, options: AdminOptions) -> Self {
        let state = Arc::new(AdminState {
            base_url: options.base_url,
            title: options.title,
            logo_url: options.logo_url,
            templates_dir: options.templates_dir,
            max_form_bytes: options.max_form_bytes,
            views: ArcSwap::from_pointee(Vec::new()),
        });

        let endpoint = |page| Arc::new(Endpoint::new(state.clone(), page));
        let router = Router::new()
            .route("/", &[Method::GET], endpoint(Page::Index))
            .route("/{identity}/list", &[Method::GET], endpoint(Page::List))
            .route("/{identity}/details/{pk}", &[Method::GET], endpoint(Page::Details))
            .route("/{identity}/create", &[Method::POST], endpoint(Page::Create));

        let mut app = GatewayApp::new(AppRef::new("admin"), router);
        if let Some(backend) = options.authentication_backend {
            app.add_middleware(Arc::new(RequireAuthentication::new(backend)));
        }
        for middleware in options.middlewares {
            app.add_middleware(middleware);
        }
        let app = Arc::new(app);

        host.router_mut().mount(&state.base_url, app.clone());
        tracing::debug!(base_url = %state.base_url, title = %state.title, "Admin site mounted");

        Self { state, app }
    }

    /// Register a view. Views keep their registration order.
    pub fn add_view(&self, view: Arc<dyn ModelView>) {
        tracing::info!(identity = view.identity(), name = view.name(), "Registering admin view");
        self.state.views.rcu(|views| {
            let mut next = Vec::clone(views);
            next.push(view.clone());
            next
        });
    }

    pub fn views(&self) -> Arc<Vec<Arc<dyn ModelView>>> {
        self.state.views.load_full()
    }

    pub fn base_url(&self) -> &str {
        &self.state.base_url
    }

    pub fn title(&self) -> &str {
        &self.state.title
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.state.logo_url.as_deref()
    }

    pub fn templates_dir(&self) -> &Path {
        &self.state.templates_dir
    }

    pub fn max_form_bytes(&self) -> usize {
        self.state.max_form_bytes
    }

    /// The admin's own application (its router sits below the base URL).
    pub fn app(&self) -> &GatewayApp {
        &self.app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::local::{QueueReceive, ResponseRecorder};
    use crate::gateway::{Application, Scope, ScopeState};
    use axum::http::{header, HeaderValue, StatusCode};
    use serde_json::json;

    fn site(options: AdminOptions) -> (GatewayApp, AdminSite) {
        let mut host = GatewayApp::new(AppRef::new("outer"), Router::new());
        let admin = AdminSite::new(&mut host, options);
        admin.add_view(Arc::new(
            StaticView::new(
                "user",
                "User",
                vec![
                    ColumnSpec::new("id", "Integer").primary_key(),
                    ColumnSpec::new("email", "String"),
                ],
            )
            .with_rows(vec![json!({"id": 1, "email": "ada@example.com"})]),
        ));
        (host, admin)
    }

    async fn request(app: &GatewayApp, state: ScopeState, body: &'static str) -> ResponseRecorder {
        let mut receive = QueueReceive::body(body);
        let mut recorder = ResponseRecorder::new();
        app.call(&Scope::new(state), &mut receive, &mut recorder)
            .await
            .unwrap();
        recorder
    }

    fn get(path: &str) -> ScopeState {
        ScopeState::http(Method::GET, path, AppRef::new("test"))
    }

    #[tokio::test]
    async fn test_index_lists_views() {
        let (host, _admin) = site(AdminOptions {
            title: "Back Office".into(),
            ..AdminOptions::default()
        });
        let response = request(&host, get("/admin/"), "").await;
        let body = response.json().unwrap();
        assert_eq!(body["title"], "Back Office");
        assert_eq!(body["views"][0]["url"], "/admin/user/list");
    }

    #[tokio::test]
    async fn test_list_and_details() {
        let (host, _admin) = site(AdminOptions::default());

        let list = request(&host, get("/admin/user/list"), "").await.json().unwrap();
        assert_eq!(list["count"], 1);

        let details = request(&host, get("/admin/user/details/1"), "").await;
        assert_eq!(details.json().unwrap()["email"], "ada@example.com");

        let missing = request(&host, get("/admin/nope/list"), "").await;
        assert_eq!(missing.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_create_processes_form() {
        let (host, admin) = site(AdminOptions::default());
        let state = ScopeState::http(Method::POST, "/admin/user/create", AppRef::new("test"));

        let response = request(&host, state, "email=alan%40example.com").await;
        assert_eq!(response.status(), Some(StatusCode::CREATED));
        assert_eq!(response.json().unwrap()["email"], "alan@example.com");
        assert_eq!(admin.views()[0].list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_oversized_form_is_rejected() {
        let (host, admin) = site(AdminOptions {
            max_form_bytes: 16,
            ..AdminOptions::default()
        });
        let state = ScopeState::http(Method::POST, "/admin/user/create", AppRef::new("test"));

        let response = request(&host, state, "email=far-too-long%40example.com").await;
        assert_eq!(response.status(), Some(StatusCode::PAYLOAD_TOO_LARGE));
        assert_eq!(admin.views()[0].list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_authentication_backend_guards_admin() {
        let (host, _admin) = site(AdminOptions {
            authentication_backend: Some(Arc::new(TokenAuthentication::new("secret"))),
            ..AdminOptions::default()
        });

        let denied = request(&host, get("/admin/"), "").await;
        assert_eq!(denied.status(), Some(StatusCode::UNAUTHORIZED));

        let mut state = get("/admin/");
        state
            .headers
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        let allowed = request(&host, state, "").await;
        assert_eq!(allowed.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_defaults() {
        let (host, admin) = site(AdminOptions::default());
        assert_eq!(admin.base_url(), DEFAULT_BASE_URL);
        assert_eq!(admin.title(), DEFAULT_TITLE);
        assert_eq!(admin.logo_url(), None);
        assert_eq!(admin.templates_dir(), Path::new(DEFAULT_TEMPLATES_DIR));
        assert_eq!(admin.max_form_bytes(), DEFAULT_MAX_FORM_BYTES);
        assert_eq!(admin.app().id(), &AppRef::new("admin"));
        assert_eq!(host.router().len(), 1);
    }
}
