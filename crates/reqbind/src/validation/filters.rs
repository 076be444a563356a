// File: src/validation/filters.rs
// Purpose: Validation of the JSON-encoded `q` filter list

use super::session::ValidationSession;
use crate::catalog::codes;
use crate::request_context::Bucket;
use crate::response::ValidationError;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Parameter carrying the encoded filter list
pub const FILTER_PARAM: &str = "q";

const DROPPED_ENTRIES_MESSAGE: &str = "Incorrect entry or invalid columns";

/// One `{name, val}` filter entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub val: JsonValue,
}

#[derive(Deserialize)]
struct FilterQuery {
    filter: Vec<JsonValue>,
}

/// Keep entries with both `name` and `val` whose name is allowed
fn accept(entry: JsonValue, allowed_fields: &[&str]) -> Option<Filter> {
    let JsonValue::Object(mut map) = entry else {
        return None;
    };
    let name = map.get("name")?.as_str()?.to_string();
    let val = map.remove("val")?;
    allowed_fields
        .contains(&name.as_str())
        .then_some(Filter { name, val })
}

impl ValidationSession {
    /// Parse and check the `q` filter list in `filters`.
    ///
    /// Returns an empty list when `q` is absent, empty, or does not mention
    /// `filter`. Rejects with `input-entry-type` for `q` when `q` is not text,
    /// when the list cannot be parsed, or when any entry is dropped.
    pub fn validate_filters_dict(
        &self,
        filters: &Bucket,
        allowed_fields: &[&str],
    ) -> Result<Vec<Filter>, ValidationError> {
        let raw = match filters.get(FILTER_PARAM) {
            Some(value) if value.is_missing() => return Ok(Vec::new()),
            Some(Value::String(raw)) if raw.contains("filter") => raw,
            Some(Value::String(_)) | None => return Ok(Vec::new()),
            Some(other) => {
                tracing::debug!(value = %other.to_display_string(), "filter list is not text");
                return Err(self.abort_with_message(codes::INPUT_ENTRY_TYPE, Some(FILTER_PARAM), None));
            }
        };

        let query: FilterQuery = match serde_json::from_str(raw) {
            Ok(query) => query,
            Err(err) => {
                tracing::debug!(error = %err, "unparseable filter list");
                return Err(self.abort_with_message(codes::INPUT_ENTRY_TYPE, Some(FILTER_PARAM), None));
            }
        };

        let before = query.filter.len();
        let accepted: Vec<Filter> = query
            .filter
            .into_iter()
            .filter_map(|entry| accept(entry, allowed_fields))
            .collect();

        if accepted.len() != before {
            tracing::debug!(dropped = before - accepted.len(), "filter entries dropped");
            return Err(self.abort_with_message(
                codes::INPUT_ENTRY_TYPE,
                Some(FILTER_PARAM),
                Some(DROPPED_ENTRIES_MESSAGE),
            ));
        }

        Ok(accepted)
    }
}
