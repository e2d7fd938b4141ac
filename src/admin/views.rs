//! Model view descriptors.
//!
//! A [`ModelView`] describes one model exposed by the admin site: its URL
//! identity, display names, columns, form converter and data source.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::admin::forms::{DefaultConverter, FormConverter};
use crate::gateway::BoxError;

/// Column description used for listing and form scaffolding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,

    /// Column type name, e.g. `Integer` or `DateTimeUTC`.
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("no row with primary key '{0}'")]
    NotFound(String),

    #[error("{0} is not supported by this view")]
    Unsupported(&'static str),

    #[error("data source error: {0}")]
    Source(#[source] BoxError),
}

#[async_trait]
pub trait ModelView: Send + Sync + 'static {
    /// URL slug of the view.
    fn identity(&self) -> &str;

    fn name(&self) -> &str;

    fn name_plural(&self) -> String {
        format!("{}s", self.name())
    }

    fn columns(&self) -> Vec<ColumnSpec>;

    fn form_converter(&self) -> &dyn FormConverter {
        &DefaultConverter
    }

    async fn list(&self) -> Result<Vec<Value>, ViewError>;

    /// Look a row up by primary key. The default scans [`ModelView::list`].
    async fn get(&self, pk: &str) -> Result<Value, ViewError> {
        let pk_column = self
            .columns()
            .into_iter()
            .find(|c| c.primary_key)
            .map(|c| c.name)
            .unwrap_or_else(|| "id".to_string());
        self.list()
            .await?
            .into_iter()
            .find(|row| match row.get(&pk_column) {
                Some(Value::String(s)) => s == pk,
                Some(Value::Number(n)) => n.to_string() == pk,
                _ => false,
            })
            .ok_or_else(|| ViewError::NotFound(pk.to_string()))
    }

    async fn insert(&self, _data: Map<String, Value>) -> Result<Value, ViewError> {
        Err(ViewError::Unsupported("insert"))
    }
}

/// Declarative view definition, as found in configuration files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewConfig {
    pub identity: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub rows: Vec<Value>,
}

/// View over an in-memory row set.
#[derive(Debug)]
pub struct StaticView {
    identity: String,
    name: String,
    columns: Vec<ColumnSpec>,
    rows: RwLock<Vec<Value>>,
}

impl StaticView {
    pub fn new(identity: impl Into<String>, name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            identity: identity.into(),
            name: name.into(),
            columns,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        *self.rows.write() = rows;
        self
    }
}

impl From<ViewConfig> for StaticView {
    fn from(config: ViewConfig) -> Self {
        StaticView::new(config.identity, config.name, config.columns).with_rows(config.rows)
    }
}

#[async_trait]
impl ModelView for StaticView {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> Vec<ColumnSpec> {
        self.columns.clone()
    }

    async fn list(&self) -> Result<Vec<Value>, ViewError> {
        Ok(self.rows.read().clone())
    }

    async fn insert(&self, data: Map<String, Value>) -> Result<Value, ViewError> {
        let mut rows = self.rows.write();
        let mut row = data;
        if let Some(pk) = self.columns.iter().find(|c| c.primary_key) {
            row.entry(pk.name.clone()).or_insert_with(|| Value::from(rows.len() + 1));
        }
        let row = Value::Object(row);
        rows.push(row.clone());
        Ok(row)
    }
}
