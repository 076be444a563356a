// File: src/catalog.rs
// Purpose: Error catalog mapping codes and type tags to error descriptors

use crate::validation::ValueType;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Symbolic codes known to the standard catalog
pub mod codes {
    pub const INTERNAL_SERVER: &str = "internal-server";
    pub const INPUT_ENTRY_TYPE: &str = "input-entry-type";
    pub const INPUT_REQUIRED: &str = "input-required";
    pub const AUTH_EXPIRATION: &str = "auth-expiration";
    pub const AUTH_REVOKED: &str = "auth-revoked";
    pub const AUTH_INVALID_CLIENT_ID: &str = "auth-invalid-client-id";
    pub const AUTH_INVALID_CLIENT_ISS: &str = "auth-invalid-client-iss";
    pub const AUTH_INVALID_TOKEN: &str = "auth-invalid-token";
    pub const AUTH_INVALID_SCOPE: &str = "auth-invalid-scope";
    pub const AUTH_UNSUPPORTED_AUTHORIZATION: &str = "auth-unsupported-authorization";
    pub const AUTH_TOKEN_MISSING: &str = "auth-token-missing";
    pub const AUTH_TOKEN_SPACES: &str = "auth-token-spaces";
    pub const BUSINESS_START_DATE: &str = "bussines-roles-start-date";
    pub const BUSINESS_RANGE_DATE: &str = "bussines-roles-range-date";
    pub const BUSINESS_RANGE_LIMIT: &str = "bussines-roles-range-limit";
    pub const RESOURCE_NOT_FOUND: &str = "resource-not-found";
}

/// Locale populated by [`Catalogs::standard`]
pub const DEFAULT_LOCALE: &str = "en";

/// Key of a catalog entry: a symbolic code or the tag of a cast target type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    Code(String),
    Type(ValueType),
}

impl ErrorKey {
    pub fn code(code: impl Into<String>) -> Self {
        ErrorKey::Code(code.into())
    }
}

impl From<&str> for ErrorKey {
    fn from(code: &str) -> Self {
        ErrorKey::Code(code.to_string())
    }
}

impl From<String> for ErrorKey {
    fn from(code: String) -> Self {
        ErrorKey::Code(code)
    }
}

impl From<ValueType> for ErrorKey {
    fn from(value_type: ValueType) -> Self {
        ErrorKey::Type(value_type)
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKey::Code(code) => f.write_str(code),
            ErrorKey::Type(value_type) => write!(f, "type:{}", value_type.tag()),
        }
    }
}

/// Programming errors in catalog usage. These are never caused by user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("error catalog has no entry for `{0}`")]
    MissingKey(ErrorKey),

    #[error("no error catalog registered for locale `{0}`")]
    UnknownLocale(String),
}

/// A user-facing error, as delivered in an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(rename = "code")]
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDescriptor {
    pub fn new(kind: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            status,
            field: None,
        }
    }

    /// Descriptor used when the request fails for a reason unrelated to input.
    /// Built without a catalog so it is available even when lookups fail.
    pub fn internal() -> Self {
        Self::new("/errors/internal-error-exception", "Internal server error", 500)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Replace the default message when an override is given
    pub fn with_message(mut self, message: Option<&str>) -> Self {
        if let Some(message) = message {
            self.message = message.to_string();
        }
        self
    }
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorTemplate {
    kind: &'static str,
    message: &'static str,
    status: u16,
    field: Option<&'static str>,
}

impl ErrorTemplate {
    fn instantiate(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: self.kind.to_string(),
            message: self.message.to_string(),
            status: self.status,
            field: self.field.map(str::to_string),
        }
    }
}

/// Read-only table of error templates for one locale
#[derive(Debug, Clone, Default)]
pub struct ErrorCatalog {
    entries: HashMap<ErrorKey, ErrorTemplate>,
}

impl ErrorCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard English catalog
    pub fn english() -> Self {
        Self::new()
            .entry(codes::INTERNAL_SERVER, "/errors/internal-error-exception", "Internal server error", 500)
            .entry(ValueType::DateTime, "/errors/bad-request-input-type-date", "This field should be datetime value", 400)
            .entry(ValueType::String, "/errors/bad-request-input-type-string", "This field should be string value", 400)
            .entry(ValueType::Integer, "/errors/bad-request-input-type-integer", "This field should be integer value", 400)
            .entry(ValueType::Float, "/errors/bad-request-input-type-float", "This field should be float value", 400)
            .entry(codes::INPUT_ENTRY_TYPE, "/errors/bad-request-input-entry-type", "Incorrect entry or invalid type", 400)
            .entry(codes::INPUT_REQUIRED, "/errors/bad-request-input-required", "This field is required", 400)
            .entry(codes::AUTH_EXPIRATION, "/errors/auth-expired-code", "Your token has expired", 403)
            .entry(codes::AUTH_REVOKED, "/errors/auth-token-revoked", "Access Token has been revoked", 403)
            .entry(codes::AUTH_INVALID_CLIENT_ID, "/errors/auth-invalid-client-id", "Invalid token client_id", 403)
            .entry(codes::AUTH_INVALID_CLIENT_ISS, "/errors/auth-invalid-client-iss", "Invalid token iss", 403)
            .entry(codes::AUTH_INVALID_TOKEN, "/errors/auth-invalid-token", "Invalid token", 403)
            .entry(codes::AUTH_INVALID_SCOPE, "/errors/auth-invalid-scope", "Permission denied invalid scope access", 403)
            .entry(codes::AUTH_UNSUPPORTED_AUTHORIZATION, "/errors/auth-unsupported-authorization", "Unsupported authorization type", 401)
            .entry(codes::AUTH_TOKEN_MISSING, "/errors/auth-token-missing", "Token missing", 401)
            .entry(codes::AUTH_TOKEN_SPACES, "/errors/auth-token-spaces", "Token contains spaces", 401)
            .field_entry(
                codes::BUSINESS_START_DATE,
                "/errors/bussines-roles-date",
                "The start_date can't be greater than end_date",
                400,
                "start_date",
            )
            .entry(codes::RESOURCE_NOT_FOUND, "/errors/resource-not-found", "The selected resource not exist", 404)
            .entry(codes::BUSINESS_RANGE_DATE, "/errors/bussines-roles-range-date", "The limit is current date -366 days", 400)
            .entry(
                codes::BUSINESS_RANGE_LIMIT,
                "/errors/bussines-roles-range-limit",
                "The range bettween start_date and today can't be greater than one year",
                400,
            )
    }

    /// Add an entry (builder style). Catalogs are assembled once at startup
    /// and only read afterward.
    pub fn entry(
        mut self,
        key: impl Into<ErrorKey>,
        kind: &'static str,
        message: &'static str,
        status: u16,
    ) -> Self {
        self.entries.insert(
            key.into(),
            ErrorTemplate { kind, message, status, field: None },
        );
        self
    }

    /// Add an entry that is always attached to a specific field
    pub fn field_entry(
        mut self,
        key: impl Into<ErrorKey>,
        kind: &'static str,
        message: &'static str,
        status: u16,
        field: &'static str,
    ) -> Self {
        self.entries.insert(
            key.into(),
            ErrorTemplate { kind, message, status, field: Some(field) },
        );
        self
    }

    /// Build a fresh descriptor for `key`
    pub fn lookup(&self, key: &ErrorKey) -> Result<ErrorDescriptor, CatalogError> {
        self.entries
            .get(key)
            .map(ErrorTemplate::instantiate)
            .ok_or_else(|| CatalogError::MissingKey(key.clone()))
    }

    /// Lookup by symbolic code
    pub fn lookup_code(&self, code: &str) -> Result<ErrorDescriptor, CatalogError> {
        self.lookup(&ErrorKey::code(code))
    }

    pub fn contains(&self, key: &ErrorKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Locale to catalog registry, shared by every session
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    by_locale: HashMap<String, Arc<ErrorCatalog>>,
}

impl Catalogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the English catalog under [`DEFAULT_LOCALE`]
    pub fn standard() -> Self {
        Self::new().with_locale(DEFAULT_LOCALE, ErrorCatalog::english())
    }

    pub fn with_locale(mut self, locale: impl Into<String>, catalog: ErrorCatalog) -> Self {
        self.insert(locale, catalog);
        self
    }

    pub fn insert(&mut self, locale: impl Into<String>, catalog: ErrorCatalog) {
        self.by_locale.insert(locale.into(), Arc::new(catalog));
    }

    pub fn for_locale(&self, locale: &str) -> Result<Arc<ErrorCatalog>, CatalogError> {
        self.by_locale
            .get(locale)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownLocale(locale.to_string()))
    }

    /// Registered locale names, sorted
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.by_locale.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }
}
