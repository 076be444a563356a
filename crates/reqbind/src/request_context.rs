// File: src/request_context.rs
// Purpose: Named buckets of raw request parameters that rules read from

use crate::value::Value;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// Which bucket a rule reads its argument from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Query string parameters (`?key=value`)
    Query,
    /// Parsed JSON request body
    Json,
    /// Form-encoded request body
    Form,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Query => "query",
            Location::Json => "json",
            Location::Form => "form",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One group of raw key/value parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    params: HashMap<String, Value>,
}

impl Bucket {
    /// Create an empty bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from string pairs, as delivered by a query string or a form.
    /// Values are stored exactly as received.
    pub fn from_strings(params: HashMap<String, String>) -> Self {
        let params = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        Self { params }
    }

    /// Create from a JSON body. Only top-level object keys become entries;
    /// values keep their JSON type.
    pub fn from_json(json: JsonValue) -> Self {
        let params = match json {
            JsonValue::Object(map) => map
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect(),
            _ => HashMap::new(),
        };

        Self { params }
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a raw entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Get a string entry
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key)?.as_str()
    }

    /// Check if an entry exists
    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get all entry names
    pub fn keys(&self) -> Vec<&String> {
        self.params.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get as HashMap
    pub fn as_map(&self) -> &HashMap<String, Value> {
        &self.params
    }
}

impl FromIterator<(String, Value)> for Bucket {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

/// Every bucket a session can read from
#[derive(Debug, Clone, Default)]
pub struct SourceBuckets {
    pub query: Bucket,
    pub json: Bucket,
    pub form: Bucket,
}

impl SourceBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: Bucket) -> Self {
        self.query = query;
        self
    }

    pub fn with_json(mut self, json: Bucket) -> Self {
        self.json = json;
        self
    }

    pub fn with_form(mut self, form: Bucket) -> Self {
        self.form = form;
        self
    }

    pub fn bucket(&self, location: Location) -> &Bucket {
        match location {
            Location::Query => &self.query,
            Location::Json => &self.json,
            Location::Form => &self.form,
        }
    }

    /// Find the raw entry for `name`, starting at `location`.
    ///
    /// When the declared bucket has no entry the lookup falls back to the
    /// query bucket and then the JSON bucket, each only if non-empty, so a
    /// single rule accepts either query-string or body-encoded input.
    pub fn resolve(&self, location: Location, name: &str) -> Option<&Value> {
        self.bucket(location)
            .get(name)
            .or_else(|| Self::non_empty(&self.query).and_then(|b| b.get(name)))
            .or_else(|| Self::non_empty(&self.json).and_then(|b| b.get(name)))
    }

    fn non_empty(bucket: &Bucket) -> Option<&Bucket> {
        (!bucket.is_empty()).then_some(bucket)
    }
}
