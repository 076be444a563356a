// File: src/response.rs
// Purpose: Error envelopes and their HTTP rendering

use crate::catalog::{CatalogError, ErrorDescriptor};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Body returned for a failed validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    /// `{"error": {...}}`
    Single { error: ErrorDescriptor },
    /// `{"errors": [...]}`
    Bundle { errors: Vec<ErrorDescriptor> },
}

impl Envelope {
    /// Shape collected errors. With `bundle` every descriptor is kept,
    /// otherwise only the first. `None` when there is nothing to report.
    pub fn shape(errors: Vec<ErrorDescriptor>, bundle: bool) -> Option<Self> {
        if bundle {
            (!errors.is_empty()).then_some(Envelope::Bundle { errors })
        } else {
            errors
                .into_iter()
                .next()
                .map(|error| Envelope::Single { error })
        }
    }

    /// Shape a single descriptor
    pub fn one(error: ErrorDescriptor, bundle: bool) -> Self {
        if bundle {
            Envelope::Bundle { errors: vec![error] }
        } else {
            Envelope::Single { error }
        }
    }

    pub fn errors(&self) -> &[ErrorDescriptor] {
        match self {
            Envelope::Single { error } => std::slice::from_ref(error),
            Envelope::Bundle { errors } => errors,
        }
    }

    pub fn first(&self) -> Option<&ErrorDescriptor> {
        self.errors().first()
    }

    pub fn len(&self) -> usize {
        self.errors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors().is_empty()
    }

    /// Status of the first descriptor
    pub fn status(&self) -> u16 {
        self.first().map(|e| e.status).unwrap_or(400)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::BAD_REQUEST);
        (status, Json(self)).into_response()
    }
}

/// Outcome of a failed bind or business check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The request's input was rejected
    #[error("request rejected with {} error(s)", .0.len())]
    Rejected(Envelope),

    /// The rules reference something the catalog does not define
    #[error(transparent)]
    Internal(#[from] CatalogError),
}

impl ValidationError {
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            ValidationError::Rejected(envelope) => Some(envelope),
            ValidationError::Internal(_) => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ValidationError::Internal(_))
    }

    pub fn status(&self) -> u16 {
        match self {
            ValidationError::Rejected(envelope) => envelope.status(),
            ValidationError::Internal(_) => 500,
        }
    }
}

impl From<Envelope> for ValidationError {
    fn from(envelope: Envelope) -> Self {
        ValidationError::Rejected(envelope)
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        match self {
            ValidationError::Rejected(envelope) => envelope.into_response(),
            ValidationError::Internal(err) => {
                tracing::error!(error = %err, "validation rules are misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Envelope::Single { error: ErrorDescriptor::internal() }),
                )
                    .into_response()
            }
        }
    }
}
