// File: src/validation/session.rs
// Purpose: Per-request validation session and the binding pass

use super::rule::FieldRule;
use crate::catalog::{codes, Catalogs, CatalogError, ErrorCatalog, ErrorDescriptor, ErrorKey};
use crate::request_context::SourceBuckets;
use crate::response::{Envelope, ValidationError};
use crate::value::Value;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Source of "now" for the date helpers
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Arguments that passed validation, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BoundData {
    values: HashMap<String, Value>,
}

impl BoundData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.as_str()
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name)?.as_i64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name)?.as_f64()
    }

    pub fn get_datetime(&self, name: &str) -> Option<NaiveDateTime> {
        self.values.get(name)?.as_datetime()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> HashMap<String, Value> {
        self.values
    }
}

impl FromIterator<(String, Value)> for BoundData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Validation context for a single request.
///
/// Rules are evaluated in registration order. Registering the same name twice
/// is allowed: both rules run and the later one's bound value wins.
#[derive(Clone)]
pub struct ValidationSession {
    catalog: Arc<ErrorCatalog>,
    bundle_errors: bool,
    rules: Vec<FieldRule>,
    buckets: SourceBuckets,
    clock: Clock,
}

impl fmt::Debug for ValidationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationSession")
            .field("bundle_errors", &self.bundle_errors)
            .field("rules", &self.rules)
            .field("buckets", &self.buckets)
            .finish()
    }
}

impl ValidationSession {
    /// Create a fail-fast session over an explicit catalog
    pub fn new(catalog: Arc<ErrorCatalog>, buckets: SourceBuckets) -> Self {
        Self {
            catalog,
            bundle_errors: false,
            rules: Vec::new(),
            buckets,
            clock: Arc::new(local_now),
        }
    }

    /// Create a session using the catalog registered for `locale`
    pub fn for_locale(
        catalogs: &Catalogs,
        locale: &str,
        buckets: SourceBuckets,
    ) -> Result<Self, CatalogError> {
        Ok(Self::new(catalogs.for_locale(locale)?, buckets))
    }

    /// Collect every rule's errors instead of stopping at the first
    pub fn bundle_errors(mut self, bundle: bool) -> Self {
        self.bundle_errors = bundle;
        self
    }

    /// Replace the clock used by the date helpers
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.add_rule(rule);
        self
    }

    pub fn is_bundling(&self) -> bool {
        self.bundle_errors
    }

    pub fn catalog(&self) -> &ErrorCatalog {
        &self.catalog
    }

    pub fn buckets(&self) -> &SourceBuckets {
        &self.buckets
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub(crate) fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    /// Append a rule
    pub fn add_rule(&mut self, rule: FieldRule) {
        if self.rules.iter().any(|r| r.name == rule.name) {
            debug!(field = %rule.name, "registering another rule for an existing field");
        }
        self.rules.push(rule);
    }

    /// Remove every rule registered under `name`
    pub fn remove_rule(&mut self, name: &str) {
        self.rules.retain(|rule| rule.name != name);
    }

    /// Catalog descriptor for a symbolic code
    pub fn message_for(&self, code: &str) -> Result<ErrorDescriptor, ValidationError> {
        self.lookup(&ErrorKey::code(code))
    }

    /// Build the rejection for `code`, attached to `field` when given and with
    /// `message` replacing the catalog text when given
    pub fn abort_with_message(
        &self,
        code: &str,
        field: Option<&str>,
        message: Option<&str>,
    ) -> ValidationError {
        match self.message_for(code) {
            Ok(mut descriptor) => {
                if let Some(field) = field {
                    descriptor.field = Some(field.to_string());
                }
                self.reject(descriptor.with_message(message))
            }
            Err(err) => err,
        }
    }

    /// Shape one descriptor according to the bundle flag
    pub(crate) fn reject(&self, descriptor: ErrorDescriptor) -> ValidationError {
        ValidationError::Rejected(Envelope::one(descriptor, self.bundle_errors))
    }

    pub(crate) fn lookup(&self, key: &ErrorKey) -> Result<ErrorDescriptor, ValidationError> {
        self.catalog.lookup(key).map_err(|err| {
            error!(error = %err, "error catalog lookup failed");
            ValidationError::Internal(err)
        })
    }

    /// Run every rule against the request buckets
    pub fn bind(&self) -> Result<BoundData, ValidationError> {
        let mut data = BoundData::new();
        let mut errors: Vec<ErrorDescriptor> = Vec::new();

        for rule in &self.rules {
            let before = errors.len();
            let bound = self.bind_rule(rule, &mut errors)?;
            data.values.insert(rule.name.clone(), bound);

            if errors.len() > before {
                debug!(
                    field = %rule.name,
                    location = %rule.location,
                    errors = errors.len() - before,
                    "argument rejected"
                );
                if !self.bundle_errors {
                    break;
                }
            }
        }

        match Envelope::shape(errors, self.bundle_errors) {
            Some(envelope) => {
                debug!(errors = envelope.len(), "binding failed");
                Err(ValidationError::Rejected(envelope))
            }
            None => {
                debug!(fields = data.len(), "binding succeeded");
                Ok(data)
            }
        }
    }

    /// Evaluate one rule, appending its errors and returning the working value
    fn bind_rule(
        &self,
        rule: &FieldRule,
        errors: &mut Vec<ErrorDescriptor>,
    ) -> Result<Value, ValidationError> {
        let mut value = self
            .buckets
            .resolve(rule.location, &rule.name)
            .cloned()
            .unwrap_or(Value::Null);
        let message = rule.message.as_deref();

        if let (true, Some(transform)) = (value.is_present(), &rule.transform) {
            match transform(&value) {
                Ok(transformed) => value = transformed,
                Err(reason) => {
                    debug!(field = %rule.name, %reason, "transform failed");
                    let descriptor = self.lookup(&ErrorKey::code(rule.code.as_str()))?;
                    errors.push(descriptor.with_field(rule.name.as_str()).with_message(message));
                }
            }
        }

        if rule.required && value.is_missing() {
            let descriptor = self.lookup(&ErrorKey::code(codes::INPUT_REQUIRED))?;
            errors.push(descriptor.with_field(rule.name.as_str()).with_message(message));
        }

        if let Some(value_type) = rule.cast {
            // Absent values are cast as the empty string
            if value == Value::Null {
                value = Value::String(String::new());
            }
            match value_type.cast(&value) {
                Some(cast) => value = cast,
                None => {
                    let descriptor = self.lookup(&ErrorKey::Type(value_type))?;
                    errors.push(descriptor.with_field(rule.name.as_str()));
                }
            }
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request_context::{Bucket, Location};
    use crate::validation::ValueType;
    use pretty_assertions::assert_eq;

    fn session(query: Bucket) -> ValidationSession {
        ValidationSession::new(
            Arc::new(ErrorCatalog::english()),
            SourceBuckets::new().with_query(query),
        )
    }

    fn fields(err: &ValidationError) -> Vec<(String, Option<String>)> {
        err.envelope()
            .map(|e| {
                e.errors()
                    .iter()
                    .map(|d| (d.kind.clone(), d.field.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_add_and_remove_rules() {
        let mut session = session(Bucket::new());
        session.add_rule(FieldRule::query("a"));
        session.add_rule(FieldRule::query("b"));
        session.add_rule(FieldRule::query("a").required());
        assert_eq!(session.rules().len(), 3);

        session.remove_rule("a");
        assert_eq!(session.rules().len(), 1);
        assert_eq!(session.rules()[0].name, "b");

        session.remove_rule("missing");
        assert_eq!(session.rules().len(), 1);
    }

    #[test]
    fn test_transform_replaces_value() {
        let data = session(Bucket::new().with("name", "alice"))
            .with_rule(FieldRule::query("name").transform(|v| {
                Ok(Value::from(v.to_display_string().to_uppercase()))
            }))
            .bind()
            .unwrap();

        assert_eq!(data.get_str("name"), Some("ALICE"));
    }

    #[test]
    fn test_transform_failure_uses_rule_code_and_message() {
        let err = session(Bucket::new().with("id", "x"))
            .with_rule(
                FieldRule::query("id")
                    .transform(|_| Err("bad".to_string()))
                    .code(codes::RESOURCE_NOT_FOUND)
                    .message("no such id"),
            )
            .bind()
            .unwrap_err();

        let envelope = err.envelope().unwrap();
        let error = envelope.first().unwrap();
        assert_eq!(error.kind, "/errors/resource-not-found");
        assert_eq!(error.status, 404);
        assert_eq!(error.message, "no such id");
        assert_eq!(error.field.as_deref(), Some("id"));
    }

    #[test]
    fn test_transform_skipped_for_missing_value() {
        let data = session(Bucket::new())
            .with_rule(FieldRule::query("name").transform(|_| Err("never".to_string())))
            .bind()
            .unwrap();

        assert_eq!(data.get("name"), Some(&Value::Null));
    }

    #[test]
    fn test_absent_required_field_with_cast_reports_both_errors() {
        let err = session(Bucket::new())
            .bundle_errors(true)
            .with_rule(FieldRule::query("page").required().cast(ValueType::Integer))
            .bind()
            .unwrap_err();

        assert_eq!(
            fields(&err),
            vec![
                ("/errors/bad-request-input-required".to_string(), Some("page".to_string())),
                ("/errors/bad-request-input-type-integer".to_string(), Some("page".to_string())),
            ]
        );
    }

    #[test]
    fn test_absent_optional_field_still_cast() {
        let err = session(Bucket::new())
            .with_rule(FieldRule::query("page").cast(ValueType::Integer))
            .bind()
            .unwrap_err();
        assert_eq!(
            fields(&err),
            vec![("/errors/bad-request-input-type-integer".to_string(), Some("page".to_string()))]
        );

        let data = session(Bucket::new())
            .with_rule(FieldRule::query("name").cast(ValueType::String))
            .bind()
            .unwrap();
        assert_eq!(data.get_str("name"), Some(""));
    }

    #[test]
    fn test_cast_error_keyed_by_type_not_code() {
        let err = session(Bucket::new().with("page", "two"))
            .with_rule(
                FieldRule::query("page")
                    .cast(ValueType::Integer)
                    .code(codes::RESOURCE_NOT_FOUND)
                    .message("ignored for type errors"),
            )
            .bind()
            .unwrap_err();

        let error = err.envelope().unwrap().first().unwrap().clone();
        assert_eq!(error.kind, "/errors/bad-request-input-type-integer");
        assert_eq!(error.message, "This field should be integer value");
        assert_eq!(error.field.as_deref(), Some("page"));
    }

    #[test]
    fn test_transform_and_cast_errors_for_one_rule() {
        let err = session(Bucket::new().with("n", "abc"))
            .bundle_errors(true)
            .with_rule(
                FieldRule::query("n")
                    .transform(|_| Err("nope".to_string()))
                    .cast(ValueType::Float),
            )
            .bind()
            .unwrap_err();

        assert_eq!(
            fields(&err),
            vec![
                ("/errors/bad-request-input-entry-type".to_string(), Some("n".to_string())),
                ("/errors/bad-request-input-type-float".to_string(), Some("n".to_string())),
            ]
        );
    }

    #[test]
    fn test_fail_fast_reports_first_error_of_first_failing_rule() {
        let err = session(Bucket::new().with("n", "abc"))
            .with_rule(FieldRule::query("ok"))
            .with_rule(
                FieldRule::query("n")
                    .transform(|_| Err("nope".to_string()))
                    .cast(ValueType::Float),
            )
            .with_rule(FieldRule::query("later").required())
            .bind()
            .unwrap_err();

        assert_eq!(
            fields(&err),
            vec![("/errors/bad-request-input-entry-type".to_string(), Some("n".to_string()))]
        );
    }

    #[test]
    fn test_duplicate_rules_both_evaluated() {
        let err = session(Bucket::new())
            .bundle_errors(true)
            .with_rule(FieldRule::query("a").required())
            .with_rule(FieldRule::query("a").required().message("again"))
            .bind()
            .unwrap_err();

        let envelope = err.envelope().unwrap();
        assert_eq!(envelope.len(), 2);
        assert_eq!(envelope.errors()[1].message, "again");
    }

    #[test]
    fn test_unknown_transform_code_is_internal() {
        let err = session(Bucket::new().with("a", "1"))
            .bundle_errors(true)
            .with_rule(
                FieldRule::query("a")
                    .transform(|_| Err("x".to_string()))
                    .code("not-in-catalog"),
            )
            .bind()
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::Internal(CatalogError::MissingKey(ErrorKey::code("not-in-catalog")))
        );
    }

    #[test]
    fn test_json_location() {
        let buckets = SourceBuckets::new().with_json(Bucket::new().with("age", 0));
        let data = ValidationSession::new(Arc::new(ErrorCatalog::english()), buckets)
            .with_rule(FieldRule::new("age", Location::Json).required().cast(ValueType::Integer))
            .bind()
            .unwrap();

        assert_eq!(data.get_i64("age"), Some(0));
    }

    #[test]
    fn test_message_for_and_abort() {
        let session = session(Bucket::new());
        assert_eq!(session.message_for(codes::INPUT_REQUIRED).unwrap().status, 400);
        assert!(session.message_for("nope").unwrap_err().is_internal());

        let err = session.abort_with_message(codes::RESOURCE_NOT_FOUND, Some("id"), None);
        let envelope = err.envelope().unwrap();
        assert!(matches!(envelope, Envelope::Single { .. }));
        assert_eq!(envelope.status(), 404);
        assert_eq!(envelope.first().unwrap().field.as_deref(), Some("id"));
        assert_eq!(envelope.first().unwrap().message, "The selected resource not exist");

        let bundled = session.clone().bundle_errors(true);
        let err = bundled.abort_with_message(codes::INPUT_ENTRY_TYPE, None, Some("custom"));
        let envelope = err.envelope().unwrap();
        assert!(matches!(envelope, Envelope::Bundle { .. }));
        assert_eq!(envelope.first().unwrap().message, "custom");
        assert_eq!(envelope.first().unwrap().field, None);
    }

    #[test]
    fn test_for_locale() {
        let catalogs = Catalogs::standard();
        assert!(ValidationSession::for_locale(&catalogs, "en", SourceBuckets::new()).is_ok());
        assert_eq!(
            ValidationSession::for_locale(&catalogs, "fr", SourceBuckets::new()).unwrap_err(),
            CatalogError::UnknownLocale("fr".to_string())
        );
    }
}
