//! Integration tests for the binding engine
//!
//! Covers required-ness, fail-fast versus bundled reporting, pass-through
//! binding and the date/filter helpers working on bound data.

use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use reqbind::validation::{END_DATE, START_DATE};
use reqbind::*;
use rstest::rstest;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

fn catalog() -> Arc<ErrorCatalog> {
    Arc::new(ErrorCatalog::english())
}

fn query(pairs: &[(&str, &str)]) -> SourceBuckets {
    let params: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    SourceBuckets::new().with_query(Bucket::from_strings(params))
}

fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, mi, s))
        .unwrap()
}

fn error_types(err: &ValidationError) -> Vec<(String, String)> {
    err.envelope()
        .expect("validation envelope")
        .errors()
        .iter()
        .map(|d| (d.kind.clone(), d.field.clone().unwrap_or_default()))
        .collect()
}

const REQUIRED: &str = "/errors/bad-request-input-required";
const ENTRY_TYPE: &str = "/errors/bad-request-input-entry-type";
const INTEGER: &str = "/errors/bad-request-input-type-integer";

#[rstest]
#[case(&[])]
#[case(&[("name", "")])]
fn test_required_field_missing(#[case] pairs: &[(&str, &str)]) {
    let err = ValidationSession::new(catalog(), query(pairs))
        .with_rule(FieldRule::query("name").required())
        .bind()
        .unwrap_err();

    assert_eq!(error_types(&err), vec![(REQUIRED.to_string(), "name".to_string())]);
    assert_eq!(err.status(), 400);
}

#[test]
fn test_whitespace_is_bound_unchanged() {
    let data = ValidationSession::new(catalog(), query(&[("v", "  hi "), ("w", "   ")]))
        .with_rule(FieldRule::query("v"))
        .with_rule(FieldRule::query("w").required())
        .bind()
        .unwrap();

    assert_eq!(data.get_str("v"), Some("  hi "));
    assert_eq!(data.get_str("w"), Some("   "));
}

#[test]
fn test_trimmed_transform_opts_in() {
    let data = ValidationSession::new(catalog(), query(&[("name", " Ada ")]))
        .with_rule(FieldRule::query("name").required().transform_with(validators::trimmed()))
        .bind()
        .unwrap();

    assert_eq!(data.get_str("name"), Some("Ada"));
}

#[test]
fn test_required_zero_is_not_missing() {
    let data = ValidationSession::new(catalog(), query(&[("count", "0")]))
        .with_rule(FieldRule::query("count").required().cast(ValueType::Integer))
        .bind()
        .unwrap();

    assert_eq!(data.get_i64("count"), Some(0));

    let json = SourceBuckets::new().with_json(Bucket::from_json(json!({"count": 0})));
    let data = ValidationSession::new(catalog(), json)
        .with_rule(FieldRule::json("count").required())
        .bind()
        .unwrap();

    assert_eq!(data.get("count"), Some(&Value::Integer(0)));
}

#[test]
fn test_required_message_override() {
    let err = ValidationSession::new(catalog(), query(&[]))
        .with_rule(FieldRule::query("email").required().message("Email please"))
        .bind()
        .unwrap_err();

    let envelope = err.envelope().unwrap();
    assert_eq!(envelope.first().unwrap().message, "Email please");
}

#[test]
fn test_fail_fast_reports_single_error() {
    let err = ValidationSession::new(catalog(), query(&[("page", "x"), ("email", "nope")]))
        .with_rule(FieldRule::query("id"))
        .with_rule(FieldRule::query("page").cast(ValueType::Integer))
        .with_rule(FieldRule::query("email").transform_with(validators::email()))
        .with_rule(FieldRule::query("name").required())
        .bind()
        .unwrap_err();

    assert!(matches!(err.envelope(), Some(Envelope::Single { .. })));
    assert_eq!(error_types(&err), vec![(INTEGER.to_string(), "page".to_string())]);
}

#[test]
fn test_bundled_reports_every_error_in_order() {
    let err = ValidationSession::new(catalog(), query(&[("page", "x"), ("email", "nope")]))
        .bundle_errors(true)
        .with_rule(FieldRule::query("id"))
        .with_rule(FieldRule::query("page").cast(ValueType::Integer))
        .with_rule(FieldRule::query("email").transform_with(validators::email()))
        .with_rule(FieldRule::query("name").required())
        .bind()
        .unwrap_err();

    assert!(matches!(err.envelope(), Some(Envelope::Bundle { .. })));
    assert_eq!(
        error_types(&err),
        vec![
            (INTEGER.to_string(), "page".to_string()),
            (ENTRY_TYPE.to_string(), "email".to_string()),
            (REQUIRED.to_string(), "name".to_string()),
        ]
    );
}

#[test]
fn test_bundled_envelope_json_shape() {
    let err = ValidationSession::new(catalog(), query(&[]))
        .bundle_errors(true)
        .with_rule(FieldRule::query("a").required())
        .with_rule(FieldRule::query("b").required())
        .bind()
        .unwrap_err();

    assert_eq!(
        serde_json::to_value(err.envelope().unwrap()).unwrap(),
        json!({"errors": [
            {"type": REQUIRED, "message": "This field is required", "code": 400, "field": "a"},
            {"type": REQUIRED, "message": "This field is required", "code": 400, "field": "b"}
        ]})
    );
}

#[rstest]
#[case(Value::from("hello"))]
#[case(Value::Integer(12))]
#[case(Value::Float(1.5))]
#[case(Value::Bool(false))]
fn test_plain_rule_round_trips(#[case] value: Value) {
    let buckets = SourceBuckets::new().with_json(Bucket::new().with("v", value.clone()));
    let data = ValidationSession::new(catalog(), buckets)
        .with_rule(FieldRule::json("v"))
        .bind()
        .unwrap();

    assert_eq!(data.get("v"), Some(&value));
}

#[test]
fn test_optional_absent_field_binds_null() {
    let data = ValidationSession::new(catalog(), query(&[]))
        .with_rule(FieldRule::query("page").transform_with(validators::positive_integer()))
        .bind()
        .unwrap();

    assert_eq!(data.get("page"), Some(&Value::Null));
}

#[test]
fn test_absent_field_with_cast_is_type_error() {
    let err = ValidationSession::new(catalog(), query(&[]))
        .bundle_errors(true)
        .with_rule(FieldRule::query("page").required().cast(ValueType::Integer))
        .with_rule(FieldRule::query("ratio").cast(ValueType::Float))
        .bind()
        .unwrap_err();

    assert_eq!(
        error_types(&err),
        vec![
            (REQUIRED.to_string(), "page".to_string()),
            (INTEGER.to_string(), "page".to_string()),
            ("/errors/bad-request-input-type-float".to_string(), "ratio".to_string()),
        ]
    );
}

#[test]
fn test_query_fallback_for_json_rule() {
    let data = ValidationSession::new(catalog(), query(&[("page", "3")]))
        .with_rule(FieldRule::json("page").required().cast(ValueType::Integer))
        .bind()
        .unwrap();

    assert_eq!(data.get_i64("page"), Some(3));
}

#[test]
fn test_missing_catalog_entry_is_internal_not_envelope() {
    let sparse = ErrorCatalog::new().entry(
        codes::INPUT_REQUIRED,
        "/errors/bad-request-input-required",
        "This field is required",
        400,
    );
    let err = ValidationSession::new(Arc::new(sparse), query(&[("page", "x")]))
        .with_rule(FieldRule::query("page").cast(ValueType::Integer))
        .bind()
        .unwrap_err();

    assert!(err.is_internal());
    assert!(err.envelope().is_none());
    assert_eq!(
        err,
        ValidationError::Internal(CatalogError::MissingKey(ErrorKey::Type(ValueType::Integer)))
    );
}

#[test]
fn test_report_flow_with_business_helpers() {
    let session = ValidationSession::new(catalog(), query(&[("end_date", "2024-02-10")]))
        .with_clock(|| at(2024, 2, 15, 12, 0, 0))
        .with_rule(FieldRule::query(START_DATE).transform_with(validators::datetime()))
        .with_rule(FieldRule::query(END_DATE).transform_with(validators::datetime()));

    let data = session.default_range_date(session.bind().unwrap());

    assert_eq!(data.get_datetime(START_DATE), Some(at(2024, 2, 1, 0, 0, 0)));
    assert_eq!(data.get_datetime(END_DATE), Some(at(2024, 2, 29, 23, 59, 59)));
    assert_eq!(
        session.validate_date_range(data.get_datetime(START_DATE), data.get_datetime(END_DATE)),
        Ok(())
    );
}

#[test]
fn test_date_range_examples() {
    let session = ValidationSession::new(catalog(), SourceBuckets::new())
        .with_clock(|| at(2024, 3, 5, 0, 0, 0));

    let err = session
        .validate_date_range(Some(at(2024, 1, 10, 0, 0, 0)), Some(at(2024, 1, 5, 0, 0, 0)))
        .unwrap_err();
    assert_eq!(err.envelope().unwrap().first().unwrap().kind, "/errors/bussines-roles-date");

    let err = session
        .validate_date_range(Some(at(2024, 1, 1, 0, 0, 0)), Some(at(2024, 3, 1, 0, 0, 0)))
        .unwrap_err();
    assert_eq!(
        err.envelope().unwrap().first().unwrap().kind,
        "/errors/bussines-roles-range-date"
    );
}

#[test]
fn test_filter_list_with_disallowed_entry() {
    let bucket = Bucket::new().with(
        "q",
        r#"{"filter":[{"name":"age","val":5},{"name":"bogus","val":1}]}"#,
    );
    let err = ValidationSession::new(catalog(), SourceBuckets::new())
        .validate_filters_dict(&bucket, &["age"])
        .unwrap_err();

    assert_eq!(error_types(&err), vec![(ENTRY_TYPE.to_string(), "q".to_string())]);
}
