// File: src/handlers.rs
// Purpose: Routes and handlers for the report service

use crate::extract::{body_location, request_buckets};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use reqbind::config::ValidationConfig;
use reqbind::validation::{Clock, END_DATE, FILTER_PARAM, START_DATE};
use reqbind::{
    codes, validators, BoundData, Catalogs, FieldRule, Filter, Location, SourceBuckets,
    ValidationError, ValidationSession, Value,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Columns a report may be filtered on
pub const FILTER_COLUMNS: &[&str] = &["status", "amount"];

/// Accepted report statuses
pub const STATUSES: &[&str] = &["open", "closed", "pending"];

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalogs: Arc<Catalogs>,
    pub validation: ValidationConfig,
    pub clock: Option<Clock>,
}

impl AppState {
    pub fn new(catalogs: Catalogs, validation: ValidationConfig) -> Self {
        Self {
            catalogs: Arc::new(catalogs),
            validation,
            clock: None,
        }
    }

    /// Pin "now" for every session this state creates
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    fn session(&self, buckets: SourceBuckets) -> Result<ValidationSession, ValidationError> {
        let session = self.validation.session(&self.catalogs, buckets)?;
        Ok(match &self.clock {
            Some(clock) => {
                let clock = clock.clone();
                session.with_clock(move || clock())
            }
            None => session,
        })
    }
}

/// Body returned for an accepted report query
#[derive(Debug, Serialize)]
pub struct ReportWindow {
    pub start_date: String,
    pub end_date: String,
    pub page: Option<i64>,
    pub status: Option<String>,
    pub filters: Vec<Filter>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/reports", get(reports_handler).post(reports_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn report_rules(location: Location) -> Vec<FieldRule> {
    vec![
        FieldRule::new(START_DATE, location).transform_with(validators::datetime()),
        FieldRule::new(END_DATE, location).transform_with(validators::datetime()),
        FieldRule::new("page", location).transform_with(validators::positive_integer()),
        FieldRule::new("status", location)
            .transform_with(validators::one_of(STATUSES))
            .message("Status must be open, closed or pending"),
        FieldRule::new(FILTER_PARAM, location),
    ]
}

async fn reports_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let location = body_location(&method, &headers);
    let result = match request_buckets(&method, &headers, query, &body) {
        Ok(buckets) => report_window(&state, location, buckets),
        Err(err) => {
            debug!(error = %err, "malformed JSON body");
            Err(malformed_body(&state))
        }
    };

    match result {
        Ok(window) => {
            info!(start = %window.start_date, end = %window.end_date, "report window accepted");
            Json(window).into_response()
        }
        Err(err) => {
            warn!(%method, error = %err, "report query rejected");
            err.into_response()
        }
    }
}

fn malformed_body(state: &AppState) -> ValidationError {
    match state.session(SourceBuckets::new()) {
        Ok(session) => session.abort_with_message(codes::INPUT_ENTRY_TYPE, None, None),
        Err(err) => err,
    }
}

fn report_window(
    state: &AppState,
    location: Location,
    buckets: SourceBuckets,
) -> Result<ReportWindow, ValidationError> {
    let session = report_rules(location)
        .into_iter()
        .fold(state.session(buckets)?, ValidationSession::with_rule);

    let data = session.default_range_date(session.bind()?);
    let start = data.get_datetime(START_DATE);
    let end = data.get_datetime(END_DATE);
    session.validate_date_range(start, end)?;

    let buckets = session.buckets();
    let filter_bucket = if buckets.bucket(location).has(FILTER_PARAM) {
        buckets.bucket(location)
    } else {
        &buckets.query
    };
    let filters = session.validate_filters_dict(filter_bucket, FILTER_COLUMNS)?;

    Ok(window_from(&data, filters))
}

fn window_from(data: &BoundData, filters: Vec<Filter>) -> ReportWindow {
    let iso = |name: &str| data.get(name).and_then(Value::to_iso_string).unwrap_or_default();
    ReportWindow {
        start_date: iso(START_DATE),
        end_date: iso(END_DATE),
        page: data.get_i64("page"),
        status: data.get_str("status").map(str::to_string),
        filters,
    }
}
