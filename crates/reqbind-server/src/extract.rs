// File: src/extract.rs
// Purpose: Build validation buckets from an incoming request

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method};
use reqbind::{Bucket, Location, SourceBuckets};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Bucket a route's rules should read from for `method`
pub fn body_location(method: &Method, headers: &HeaderMap) -> Location {
    if *method == Method::GET {
        return Location::Query;
    }
    match content_type(headers) {
        Some(ct) if ct.contains("application/x-www-form-urlencoded") => Location::Form,
        _ => Location::Json,
    }
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::CONTENT_TYPE)?.to_str().ok()
}

/// Split the request into query, JSON and form buckets.
/// A JSON body that does not parse is an error.
pub fn request_buckets(
    method: &Method,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: &Bytes,
) -> Result<SourceBuckets, serde_json::Error> {
    let buckets = SourceBuckets::new().with_query(Bucket::from_strings(query));

    if !(*method == Method::POST || *method == Method::PUT || *method == Method::PATCH) {
        return Ok(buckets);
    }

    Ok(match content_type(headers) {
        Some(ct) if ct.contains("application/json") => {
            let json = serde_json::from_slice::<JsonValue>(body)?;
            buckets.with_json(Bucket::from_json(json))
        }
        Some(ct) if ct.contains("application/x-www-form-urlencoded") => {
            buckets.with_form(Bucket::from_strings(parse_form(body)))
        }
        _ => buckets,
    })
}

fn parse_form(body: &Bytes) -> HashMap<String, String> {
    let form_str = String::from_utf8_lossy(body);
    form_str
        .split('&')
        .filter_map(|pair| {
            pair.split_once('=').map(|(k, v)| {
                (
                    urlencoding::decode(&k.replace('+', " ")).unwrap_or_default().to_string(),
                    urlencoding::decode(&v.replace('+', " ")).unwrap_or_default().to_string(),
                )
            })
        })
        .collect()
}
