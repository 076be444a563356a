// File: src/validation/rule.rs
// Purpose: Field rules and the value types they cast to

use crate::request_context::Location;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;
use std::sync::Arc;

/// Fallible unary function applied to a present raw value
pub type Transform = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Accepted text layouts for the datetime cast, tried in order after RFC 3339
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Target of a rule's cast. Its tag doubles as the catalog key for type errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    Float,
    DateTime,
}

impl ValueType {
    pub fn tag(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::DateTime => "datetime",
        }
    }

    /// Coerce `value` into this type
    pub fn cast(&self, value: &Value) -> Option<Value> {
        match self {
            ValueType::String => Some(Value::String(value.to_display_string())),
            ValueType::Integer => cast_integer(value).map(Value::Integer),
            ValueType::Float => cast_float(value).map(Value::Float),
            ValueType::DateTime => cast_datetime(value).map(Value::DateTime),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

fn cast_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        Value::Float(n) => {
            let whole = n.trunc();
            // 2^63 is exactly representable; anything at or past it overflows
            (whole >= i64::MIN as f64 && whole < i64::MAX as f64).then_some(whole as i64)
        }
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cast_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cast_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::String(s) => parse_datetime(s.trim()),
        _ => None,
    }
}

/// Parse the datetime layouts accepted from requests
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// How one named argument is read, checked and coerced
#[derive(Clone)]
pub struct FieldRule {
    pub name: String,
    pub required: bool,
    pub location: Location,
    pub transform: Option<Transform>,
    pub cast: Option<ValueType>,
    /// Catalog code reported when `transform` fails
    pub code: String,
    /// Replaces the catalog message for transform and required errors
    pub message: Option<String>,
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("location", &self.location)
            .field("transform", &self.transform.is_some())
            .field("cast", &self.cast)
            .field("code", &self.code)
            .field("message", &self.message)
            .finish()
    }
}

impl FieldRule {
    /// Optional argument read from `location`, reporting `input-entry-type`
    /// when a transform rejects it
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            required: false,
            location,
            transform: None,
            cast: None,
            code: crate::catalog::codes::INPUT_ENTRY_TYPE.to_string(),
            message: None,
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, Location::Query)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, Location::Json)
    }

    pub fn form(name: impl Into<String>) -> Self {
        Self::new(name, Location::Form)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    /// Use an already shared transform
    pub fn transform_with(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn cast(mut self, value_type: ValueType) -> Self {
        self.cast = Some(value_type);
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
