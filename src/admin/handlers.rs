use arc_swap::ArcSwap;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::admin::forms::{parse_form_data, scaffold_form};
use crate::admin::views::{ColumnSpec, ModelView, ViewError};
use crate::gateway::{read_body, Application, GatewayError, Receive, Reply, Scope, Transmit};

/// Settings and view registry shared by every admin endpoint.
pub(crate) struct AdminState {
    pub base_url: String,
    pub title: String,
    pub logo_url: Option<String>,
    pub templates_dir: PathBuf,
    /// Largest accepted form submission.
    pub max_form_bytes: usize,
    pub views: ArcSwap<Vec<Arc<dyn ModelView>>>,
}

impl AdminState {
    fn find_view(&self, identity: &str) -> Option<Arc<dyn ModelView>> {
        self.views
            .load()
            .iter()
            .find(|v| v.identity() == identity)
            .cloned()
    }

    fn url_for(&self, suffix: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), suffix)
    }
}

#[derive(Serialize)]
pub struct AdminIndex {
    pub title: String,
    pub logo_url: Option<String>,
    pub views: Vec<ViewSummary>,
}

#[derive(Serialize)]
pub struct ViewSummary {
    pub identity: String,
    pub name: String,
    pub name_plural: String,
    pub url: String,
}

#[derive(Serialize)]
pub struct RowList {
    pub identity: String,
    pub count: usize,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Page {
    Index,
    List,
    Details,
    Create,
}

pub(crate) struct Endpoint {
    state: Arc<AdminState>,
    page: Page,
}

impl Endpoint {
    pub fn new(state: Arc<AdminState>, page: Page) -> Self {
        Self { state, page }
    }
}

#[async_trait]
impl Application for Endpoint {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError> {
        let params = scope.read(|s| s.path_params.clone());
        let reply = match self.page {
            Page::Index => index(&self.state),
            Page::List => list(&self.state, &params).await,
            Page::Details => details(&self.state, &params).await,
            Page::Create => match read_body(receive, self.state.max_form_bytes).await {
                Ok(body) => create(&self.state, &params, &body).await,
                Err(GatewayError::PayloadTooLarge { limit }) => {
                    tracing::warn!(limit, "Admin form submission too large");
                    Reply::text(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
                }
                Err(e) => return Err(e),
            },
        };
        reply.send_to(send).await
    }
}

fn index(state: &AdminState) -> Reply {
    let views = state
        .views
        .load()
        .iter()
        .map(|view| ViewSummary {
            identity: view.identity().to_string(),
            name: view.name().to_string(),
            name_plural: view.name_plural(),
            url: state.url_for(&format!("/{}/list", view.identity())),
        })
        .collect();

    Reply::json(
        StatusCode::OK,
        &AdminIndex {
            title: state.title.clone(),
            logo_url: state.logo_url.clone(),
            views,
        },
    )
}

fn lookup(state: &AdminState, params: &BTreeMap<String, String>) -> Result<Arc<dyn ModelView>, Reply> {
    params
        .get("identity")
        .and_then(|identity| state.find_view(identity))
        .ok_or_else(|| Reply::text(StatusCode::NOT_FOUND, "Not Found"))
}

async fn list(state: &AdminState, params: &BTreeMap<String, String>) -> Reply {
    let view = match lookup(state, params) {
        Ok(view) => view,
        Err(reply) => return reply,
    };
    match view.list().await {
        Ok(rows) => Reply::json(
            StatusCode::OK,
            &RowList {
                identity: view.identity().to_string(),
                count: rows.len(),
                columns: view.columns(),
                rows,
            },
        ),
        Err(e) => view_error(view.identity(), e),
    }
}

async fn details(state: &AdminState, params: &BTreeMap<String, String>) -> Reply {
    let view = match lookup(state, params) {
        Ok(view) => view,
        Err(reply) => return reply,
    };
    let pk = params.get("pk").map(String::as_str).unwrap_or_default();
    match view.get(pk).await {
        Ok(row) => Reply::json(StatusCode::OK, &row),
        Err(e) => view_error(view.identity(), e),
    }
}

async fn create(state: &AdminState, params: &BTreeMap<String, String>, body: &[u8]) -> Reply {
    let view = match lookup(state, params) {
        Ok(view) => view,
        Err(reply) => return reply,
    };

    let mut form = scaffold_form(view.as_ref());
    if let Err(errors) = form.process(&parse_form_data(body)) {
        let errors: BTreeMap<String, String> = errors
            .into_iter()
            .map(|(field, e)| (field, e.to_string()))
            .collect();
        return Reply::json(
            StatusCode::UNPROCESSABLE_ENTITY,
            &serde_json::json!({ "errors": errors }),
        );
    }

    match view.insert(form.data()).await {
        Ok(row) => Reply::json(StatusCode::CREATED, &row),
        Err(e) => view_error(view.identity(), e),
    }
}

fn view_error(identity: &str, error: ViewError) -> Reply {
    match error {
        ViewError::NotFound(_) => Reply::text(StatusCode::NOT_FOUND, error.to_string()),
        ViewError::Unsupported(_) => {
            Reply::text(StatusCode::METHOD_NOT_ALLOWED, error.to_string())
        }
        ViewError::Source(ref e) => {
            tracing::error!(view = %identity, error = %e, "Admin data source failed");
            Reply::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
