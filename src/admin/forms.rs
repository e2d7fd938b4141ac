//! Form scaffolding for model views.
//!
//! A [`FormConverter`] maps each column of a view to a [`FormField`]; the
//! resulting [`Form`] processes submitted `application/x-www-form-urlencoded`
//! data into JSON values.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::admin::views::{ColumnSpec, ModelView};

/// Submitted form values, grouped by field name.
pub type FormData = BTreeMap<String, Vec<String>>;

/// Parse an urlencoded body.
pub fn parse_form_data(body: &[u8]) -> FormData {
    let mut data = FormData::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        data.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    data
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Not a valid datetime value.")]
    InvalidDateTime,
    #[error("Not a valid integer value.")]
    InvalidInteger,
    #[error("Not a valid boolean value.")]
    InvalidBoolean,
}

pub trait FormField: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Short type tag, e.g. `datetime`.
    fn kind(&self) -> &'static str;

    /// Consume the submitted values. An empty slice leaves the data unset.
    fn process_form_data(&mut self, values: &[String]) -> Result<(), FieldError>;

    /// Processed value, `Null` when unset.
    fn data(&self) -> Value;
}

pub trait FormConverter: Send + Sync {
    /// Field for `column`, or `None` when the column type is not supported.
    fn convert(&self, column: &ColumnSpec) -> Option<Box<dyn FormField>>;
}

#[derive(Debug, Clone, Default)]
pub struct TextField {
    name: String,
    data: Option<String>,
}

impl TextField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }
}

impl FormField for TextField {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "text"
    }

    fn process_form_data(&mut self, values: &[String]) -> Result<(), FieldError> {
        if let Some(first) = values.first() {
            self.data = Some(first.clone());
        }
        Ok(())
    }

    fn data(&self) -> Value {
        self.data.clone().map(Value::String).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegerField {
    name: String,
    data: Option<i64>,
}

impl IntegerField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }
}

impl FormField for IntegerField {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "integer"
    }

    fn process_form_data(&mut self, values: &[String]) -> Result<(), FieldError> {
        let Some(first) = values.first() else {
            return Ok(());
        };
        match first.trim().parse() {
            Ok(value) => {
                self.data = Some(value);
                Ok(())
            }
            Err(_) => {
                self.data = None;
                Err(FieldError::InvalidInteger)
            }
        }
    }

    fn data(&self) -> Value {
        self.data.map(Value::from).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BooleanField {
    name: String,
    data: bool,
}

impl BooleanField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: false,
        }
    }
}

impl FormField for BooleanField {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "boolean"
    }

    fn process_form_data(&mut self, values: &[String]) -> Result<(), FieldError> {
        self.data = match values.first().map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("false") | Some("0") | Some("off") => false,
            Some("true") | Some("1") | Some("on") | Some("y") | Some("yes") => true,
            Some(_) => return Err(FieldError::InvalidBoolean),
        };
        Ok(())
    }

    fn data(&self) -> Value {
        Value::Bool(self.data)
    }
}

/// Naive date-time field accepting the formats an admin form submits.
#[derive(Debug, Clone)]
pub struct DateTimeField {
    name: String,
    formats: Vec<&'static str>,
    data: Option<NaiveDateTime>,
}

impl DateTimeField {
    pub const DEFAULT_FORMATS: [&'static str; 3] =
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formats: Self::DEFAULT_FORMATS.to_vec(),
            data: None,
        }
    }

    pub fn naive(&self) -> Option<NaiveDateTime> {
        self.data
    }
}

impl FormField for DateTimeField {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "datetime"
    }

    fn process_form_data(&mut self, values: &[String]) -> Result<(), FieldError> {
        if values.is_empty() {
            return Ok(());
        }
        let joined = values.join(" ");
        self.data = self
            .formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(&joined, format).ok());
        match self.data {
            Some(_) => Ok(()),
            None => Err(FieldError::InvalidDateTime),
        }
    }

    fn data(&self) -> Value {
        self.data
            .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .unwrap_or(Value::Null)
    }
}

/// Converter for the column types every backend understands.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl FormConverter for DefaultConverter {
    fn convert(&self, column: &ColumnSpec) -> Option<Box<dyn FormField>> {
        let name = column.name.as_str();
        let field: Box<dyn FormField> = match column.type_name.as_str() {
            "String" | "Text" | "Uuid" => Box::new(TextField::new(name)),
            "Integer" | "BigInteger" | "SmallInteger" => Box::new(IntegerField::new(name)),
            "Boolean" => Box::new(BooleanField::new(name)),
            "DateTime" => Box::new(DateTimeField::new(name)),
            other => {
                tracing::debug!(column = %name, column_type = %other, "No form converter for column type");
                return None;
            }
        };
        Some(field)
    }
}

/// Processed form for a single view.
#[derive(Debug, Default)]
pub struct Form {
    fields: Vec<Box<dyn FormField>>,
}

impl Form {
    pub fn new(fields: Vec<Box<dyn FormField>>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&dyn FormField> {
        self.fields.iter().find(|f| f.name() == name).map(|f| f.as_ref())
    }

    pub fn fields(&self) -> impl Iterator<Item = &dyn FormField> {
        self.fields.iter().map(|f| f.as_ref())
    }

    /// Feed submitted values to every field, collecting all failures.
    pub fn process(&mut self, data: &FormData) -> Result<(), BTreeMap<String, FieldError>> {
        let mut errors = BTreeMap::new();
        for field in &mut self.fields {
            let values = data.get(field.name()).map(Vec::as_slice).unwrap_or(&[]);
            if let Err(e) = field.process_form_data(values) {
                errors.insert(field.name().to_string(), e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn data(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), f.data()))
            .collect()
    }
}

/// Build the form for `view`, skipping primary keys and unsupported columns.
pub fn scaffold_form(view: &dyn ModelView) -> Form {
    let converter = view.form_converter();
    let fields = view
        .columns()
        .iter()
        .filter(|column| !column.primary_key)
        .filter_map(|column| converter.convert(column))
        .collect();
    Form::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_form_data_groups_values() {
        let data = parse_form_data(b"name=Ada+Lovelace&tag=a&tag=b&empty=");
        assert_eq!(data["name"], vec!["Ada Lovelace"]);
        assert_eq!(data["tag"], vec!["a", "b"]);
        assert_eq!(data["empty"], vec![""]);
    }

    #[test]
    fn test_date_time_field_parses_default_format() {
        let mut field = DateTimeField::new("f");
        field.process_form_data(&["2021-01-01 00:00:00".into()]).unwrap();
        let expected = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(field.naive(), Some(expected));
    }

    #[test]
    fn test_date_time_field_rejects_garbage() {
        let mut field = DateTimeField::new("f");
        assert_eq!(
            field.process_form_data(&["yesterday".into()]),
            Err(FieldError::InvalidDateTime)
        );
        assert_eq!(field.data(), Value::Null);
    }

    #[test]
    fn test_date_time_field_without_values_stays_empty() {
        let mut field = DateTimeField::new("f");
        field.process_form_data(&[]).unwrap();
        assert_eq!(field.naive(), None);
    }

    #[test]
    fn test_default_converter_skips_unknown_types() {
        let column = ColumnSpec::new("created_at", "DateTimeUTC");
        assert!(DefaultConverter.convert(&column).is_none());

        let column = ColumnSpec::new("count", "Integer");
        assert_eq!(DefaultConverter.convert(&column).unwrap().kind(), "integer");
    }

    #[test]
    fn test_form_collects_all_errors() {
        let mut form = Form::new(vec![
            Box::new(IntegerField::new("count")),
            Box::new(BooleanField::new("active")),
            Box::new(TextField::new("name")),
        ]);
        let data = parse_form_data(b"count=ten&active=maybe&name=x");
        let errors = form.process(&data).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["count"], FieldError::InvalidInteger);
        assert_eq!(errors["active"], FieldError::InvalidBoolean);
    }
}
