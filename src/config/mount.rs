//! Registration options of the admin mount.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::admin::auth::{AuthenticationBackend, TokenAuthentication};
use crate::admin::views::{ModelView, StaticView};
use crate::config::schema::{AdminSection, Setting};
use crate::gateway::{GatewayApp, Middleware};

/// Options for [`AdminMount::register`](crate::mount::AdminMount::register).
///
/// Only options that are `Set` are forwarded to the admin site.
#[derive(Default)]
pub struct MountConfig {
    /// Toolkit application the admin site is mounted into.
    pub app: Setting<GatewayApp>,
    pub views: Setting<Vec<Arc<dyn ModelView>>>,
    pub base_url: Setting<String>,
    pub title: Setting<String>,
    pub logo_url: Setting<Option<String>>,
    pub templates_dir: Setting<PathBuf>,
    pub max_form_bytes: Setting<usize>,
    pub middlewares: Setting<Vec<Arc<dyn Middleware>>>,
    pub authentication_backend: Setting<Option<Arc<dyn AuthenticationBackend>>>,
}

impl MountConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(mut self, app: GatewayApp) -> Self {
        self.app = Setting::Set(app);
        self
    }

    pub fn views(mut self, views: Vec<Arc<dyn ModelView>>) -> Self {
        self.views = Setting::Set(views);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Setting::Set(base_url.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Setting::Set(title.into());
        self
    }

    pub fn logo_url(mut self, logo_url: Option<String>) -> Self {
        self.logo_url = Setting::Set(logo_url);
        self
    }

    pub fn templates_dir(mut self, templates_dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Setting::Set(templates_dir.into());
        self
    }

    pub fn max_form_bytes(mut self, max_form_bytes: usize) -> Self {
        self.max_form_bytes = Setting::Set(max_form_bytes);
        self
    }

    pub fn middlewares(mut self, middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        self.middlewares = Setting::Set(middlewares);
        self
    }

    pub fn authentication_backend(mut self, backend: Option<Arc<dyn AuthenticationBackend>>) -> Self {
        self.authentication_backend = Setting::Set(backend);
        self
    }
}

impl From<&AdminSection> for MountConfig {
    fn from(section: &AdminSection) -> Self {
        MountConfig {
            views: section.views.clone().map(|views| {
                views
                    .into_iter()
                    .map(|view| Arc::new(StaticView::from(view)) as Arc<dyn ModelView>)
                    .collect()
            }),
            base_url: section.base_url.clone(),
            title: section.title.clone(),
            logo_url: section.logo_url.clone().map(Some),
            templates_dir: section.templates_dir.clone(),
            max_form_bytes: section.max_form_bytes.clone(),
            authentication_backend: section.api_key.clone().map(|key| {
                Some(Arc::new(TokenAuthentication::new(key)) as Arc<dyn AuthenticationBackend>)
            }),
            ..MountConfig::default()
        }
    }
}

impl fmt::Debug for MountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountConfig")
            .field("app", &self.app.is_set())
            .field("views", &self.views.as_ref().map(Vec::len))
            .field("base_url", &self.base_url)
            .field("title", &self.title)
            .field("logo_url", &self.logo_url)
            .field("templates_dir", &self.templates_dir)
            .field("max_form_bytes", &self.max_form_bytes)
            .field("middlewares", &self.middlewares.as_ref().map(Vec::len))
            .field(
                "authentication_backend",
                &self.authentication_backend.as_ref().map(Option::is_some),
            )
            .finish()
    }
}
