//! Support for audited models whose timestamps are stored as UTC.
//!
//! Audit columns (`created_at`, `updated_at`) use the `DateTimeUTC` column
//! type, which the default converter does not know. [`AuditModelView`] wraps
//! any view so those columns get a [`DateTimeUtcField`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::admin::forms::{DateTimeField, DefaultConverter, FieldError, FormConverter, FormField};
use crate::admin::views::{ColumnSpec, ModelView, ViewError};

/// Date-time field that interprets the submitted value as UTC.
#[derive(Debug, Clone)]
pub struct DateTimeUtcField {
    inner: DateTimeField,
    data: Option<DateTime<Utc>>,
}

impl DateTimeUtcField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: DateTimeField::new(name),
            data: None,
        }
    }

    pub fn value(&self) -> Option<DateTime<Utc>> {
        self.data
    }
}

impl FormField for DateTimeUtcField {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> &'static str {
        "datetime_utc"
    }

    fn process_form_data(&mut self, values: &[String]) -> Result<(), FieldError> {
        let result = self.inner.process_form_data(values);
        self.data = self.inner.naive().map(|naive| naive.and_utc());
        result
    }

    fn data(&self) -> Value {
        self.data
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null)
    }
}

/// Converts `DateTimeUTC` columns, deferring everything else to the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeUtcConverter;

impl FormConverter for DateTimeUtcConverter {
    fn convert(&self, column: &ColumnSpec) -> Option<Box<dyn FormField>> {
        match column.type_name.as_str() {
            "DateTimeUTC" => Some(Box::new(DateTimeUtcField::new(column.name.as_str()))),
            _ => DefaultConverter.convert(column),
        }
    }
}

/// View wrapper for audited models.
pub struct AuditModelView<V> {
    inner: V,
}

impl<V: ModelView> AuditModelView<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

#[async_trait]
impl<V: ModelView> ModelView for AuditModelView<V> {
    fn identity(&self) -> &str {
        self.inner.identity()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn name_plural(&self) -> String {
        self.inner.name_plural()
    }

    fn columns(&self) -> Vec<ColumnSpec> {
        self.inner.columns()
    }

    fn form_converter(&self) -> &dyn FormConverter {
        &DateTimeUtcConverter
    }

    async fn list(&self) -> Result<Vec<Value>, ViewError> {
        self.inner.list().await
    }

    async fn get(&self, pk: &str) -> Result<Value, ViewError> {
        self.inner.get(pk).await
    }

    async fn insert(&self, data: Map<String, Value>) -> Result<Value, ViewError> {
        self.inner.insert(data).await
    }
}
