//! Admin mount subsystem.
//!
//! # Data Flow
//! ```text
//! host router strips the mount path
//!     → AdminMount::forward (fork scope, put mount path back in front)
//!     → outer GatewayApp
//!     → path_fix.rs (trailing-slash normalization, restored on exit)
//!     → outer router → admin site
//! ```
//!
//! # Design Decisions
//! - The caller's scope is never handed to the admin site; it gets a fork
//! - Admin failures are logged and contained; they never reach the host
//! - Slash redirects are disabled so the host never sees surprise 307s

pub mod path_fix;

pub use path_fix::{normalize_path, PathFix};

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::admin::views::ModelView;
use crate::admin::{AdminOptions, AdminSite};
use crate::config::MountConfig;
use crate::gateway::{
    AppRef, Application, GatewayApp, GatewayError, Receive, Scope, ScopeKind, Transmit,
};
use crate::http::bridge::GatewayService;
use crate::routing::Router;

/// Owner recorded in scopes created by the host bridge.
pub const HOST_APP: &str = "host";

/// Handle to the mounted admin application.
///
/// Cheap to clone; all clones share the same admin site.
#[derive(Clone)]
pub struct AdminMount {
    inner: Arc<MountInner>,
}

struct MountInner {
    app: GatewayApp,
    admin: AdminSite,
    mount_path: String,
    pending_views: Mutex<Option<Vec<Arc<dyn ModelView>>>>,
}

/// Puts the caller's owning application back when dropped.
struct RestoreOwner<'a> {
    scope: &'a Scope,
    owner: AppRef,
}

impl Drop for RestoreOwner<'_> {
    fn drop(&mut self) {
        self.scope.set_app(self.owner.clone());
    }
}

/// Leading slash, no trailing slash; the root becomes `/`.
fn canonical_base_url(base_url: &str) -> String {
    format!("/{}", base_url.trim_matches('/'))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl AdminMount {
    /// Build the admin site from the options that were actually given.
    pub fn register(config: MountConfig) -> Self {
        tracing::debug!(config = ?config, "Registering admin mount");
        let MountConfig {
            app,
            views,
            base_url,
            title,
            logo_url,
            templates_dir,
            max_form_bytes,
            middlewares,
            authentication_backend,
        } = config;

        let mut app = app
            .into_option()
            .unwrap_or_else(|| GatewayApp::new(AppRef::new("admin-root"), Router::new()));

        let mut options = AdminOptions::default();
        base_url.map(|url| canonical_base_url(&url)).apply_to(&mut options.base_url);
        title.apply_to(&mut options.title);
        logo_url.apply_to(&mut options.logo_url);
        templates_dir.apply_to(&mut options.templates_dir);
        max_form_bytes.apply_to(&mut options.max_form_bytes);
        middlewares.apply_to(&mut options.middlewares);
        authentication_backend.apply_to(&mut options.authentication_backend);

        let admin = AdminSite::new(&mut app, options);
        app.add_middleware(Arc::new(PathFix::new(admin.base_url())));

        // Normalization is explicit; the routers must not answer with redirects.
        app.router().set_redirect_slashes(false);
        admin.app().router().set_redirect_slashes(false);

        let mount_path = admin.base_url().trim_end_matches('/').to_string();
        tracing::info!(mount_path = %mount_path, title = %admin.title(), "Admin mount registered");

        Self {
            inner: Arc::new(MountInner {
                app,
                admin,
                mount_path,
                pending_views: Mutex::new(Some(views.into_option().unwrap_or_default())),
            }),
        }
    }

    pub fn admin(&self) -> &AdminSite {
        &self.inner.admin
    }

    /// The toolkit application requests are forwarded to.
    pub fn app(&self) -> &GatewayApp {
        &self.inner.app
    }

    /// Host path the admin is mounted at; empty for the root.
    pub fn mount_path(&self) -> &str {
        &self.inner.mount_path
    }

    /// Start-up hook: register the configured views and mount the admin
    /// into the host router.
    ///
    /// Views are registered on the first call only.
    pub fn on_app_init<S>(&self, router: axum::Router<S>) -> axum::Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.register_views();

        let service = GatewayService::new(Arc::new(self.clone()), AppRef::new(HOST_APP));
        if self.inner.mount_path.is_empty() {
            router.fallback_service(service)
        } else {
            router.nest_service(&self.inner.mount_path, service)
        }
    }

    fn register_views(&self) {
        let Some(views) = self.inner.pending_views.lock().take() else {
            tracing::debug!("Admin views already registered");
            return;
        };
        for view in views {
            self.inner.admin.add_view(view);
        }
    }

    /// Forward a request addressed below the mount path to the admin.
    ///
    /// Errors and panics inside the admin are logged and swallowed. Only
    /// scopes the mount cannot handle at all are reported back.
    pub async fn forward(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError> {
        let kind = scope.kind();
        if kind != ScopeKind::Http {
            return Err(GatewayError::UnsupportedScope(kind));
        }

        let _owner = RestoreOwner {
            scope,
            owner: scope.app(),
        };

        let mount_path = self.inner.mount_path.as_str();
        let derived = scope.fork();
        derived.update(|s| {
            s.path.insert_str(0, mount_path);
            let mut raw_path = BytesMut::with_capacity(mount_path.len() + s.raw_path.len());
            raw_path.extend_from_slice(mount_path.as_bytes());
            raw_path.extend_from_slice(&s.raw_path);
            s.raw_path = raw_path.freeze();
        });
        let path = derived.path();

        let outcome = AssertUnwindSafe(self.inner.app.call(&derived, receive, send))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(path = %path, error = %e, "Admin application failed");
            }
            Err(payload) => {
                tracing::error!(
                    path = %path,
                    panic = panic_message(payload.as_ref()),
                    "Admin application panicked"
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Application for AdminMount {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError> {
        self.forward(scope, receive, send).await
    }
}

impl std::fmt::Debug for AdminMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminMount")
            .field("mount_path", &self.inner.mount_path)
            .field("views", &self.inner.admin.views().len())
            .finish()
    }
}
