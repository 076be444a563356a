// File: src/validation/validators.rs
// Purpose: Ready-made transforms for field rules

use super::rule::{parse_datetime, Transform};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

// Email validation regex
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

// URL validation regex
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap()
});

fn from_fn<F>(f: F) -> Transform
where
    F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn text(value: &Value) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected text, got {}", value.to_display_string()))
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Validate URL format
pub fn is_valid_url(url: &str) -> bool {
    URL_REGEX.is_match(url)
}

/// Trim surrounding whitespace from text values; other values pass through
pub fn trimmed() -> Transform {
    from_fn(|value| match value {
        Value::String(s) => Ok(Value::String(s.trim().to_string())),
        other => Ok(other.clone()),
    })
}

/// Accept well-formed email addresses, lowercased
pub fn email() -> Transform {
    from_fn(|value| {
        let email = text(value)?;
        if is_valid_email(email) {
            Ok(Value::String(email.to_lowercase()))
        } else {
            Err(format!("invalid email: {}", email))
        }
    })
}

/// Accept http(s) URLs
pub fn url() -> Transform {
    from_fn(|value| {
        let url = text(value)?;
        if is_valid_url(url) {
            Ok(value.clone())
        } else {
            Err(format!("invalid url: {}", url))
        }
    })
}

/// Accept text matching `pattern`. An invalid pattern rejects every value.
pub fn matches(pattern: &str) -> Transform {
    let regex = Regex::new(pattern).map_err(|e| e.to_string());
    from_fn(move |value| {
        let regex = regex.as_ref().map_err(|e| e.clone())?;
        let s = text(value)?;
        if regex.is_match(s) {
            Ok(value.clone())
        } else {
            Err(format!("`{}` does not match `{}`", s, regex.as_str()))
        }
    })
}

/// Accept numbers (or numeric text) greater than zero
pub fn positive() -> Transform {
    from_fn(|value| {
        let n = match value {
            Value::Integer(n) => *n as f64,
            Value::Float(n) => *n,
            Value::String(s) => s.trim().parse::<f64>().map_err(|e| e.to_string())?,
            other => return Err(format!("not a number: {}", other.to_display_string())),
        };
        if n > 0.0 {
            Ok(value.clone())
        } else {
            Err(format!("{} is not positive", n))
        }
    })
}

/// Accept whole numbers (or integer text) greater than zero, binding an integer
pub fn positive_integer() -> Transform {
    from_fn(|value| {
        let n = match value {
            Value::Integer(n) => *n,
            Value::String(s) => s.trim().parse::<i64>().map_err(|e| e.to_string())?,
            other => return Err(format!("not an integer: {}", other.to_display_string())),
        };
        if n > 0 {
            Ok(Value::Integer(n))
        } else {
            Err(format!("{} is not positive", n))
        }
    })
}

/// Accept one of a fixed set of text values
pub fn one_of(choices: &[&str]) -> Transform {
    let choices: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
    from_fn(move |value| {
        let s = text(value)?;
        if choices.iter().any(|c| c == s) {
            Ok(value.clone())
        } else {
            Err(format!("`{}` is not one of {:?}", s, choices))
        }
    })
}

/// Parse text with a chrono format string into a datetime.
/// Date-only formats are accepted and bind to midnight.
pub fn date_format(format: &str) -> Transform {
    let format = format.to_string();
    from_fn(move |value| {
        let s = text(value)?;
        match NaiveDateTime::parse_from_str(s, &format) {
            Ok(dt) => Ok(Value::DateTime(dt)),
            Err(err) => NaiveDate::parse_from_str(s, &format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(Value::DateTime)
                .ok_or_else(|| err.to_string()),
        }
    })
}

/// Parse any of the datetime layouts the datetime cast accepts
pub fn datetime() -> Transform {
    from_fn(|value| match value {
        Value::DateTime(_) => Ok(value.clone()),
        _ => {
            let s = text(value)?;
            parse_datetime(s.trim())
                .map(Value::DateTime)
                .ok_or_else(|| format!("invalid datetime: {}", s))
        }
    })
}
