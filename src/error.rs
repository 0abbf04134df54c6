//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `ApiError` used throughout the
//! application. It centralizes error management, providing a consistent way
//! to represent every failure condition, from database issues to token
//! verification failures.
//!
//! `ApiError` implements `actix_web::error::ResponseError`, so any handler or
//! middleware error is rendered as the standard response envelope with the
//! matching status code. `From` implementations for `sqlx::Error`,
//! `validator::ValidationErrors`, `jsonwebtoken::errors::Error`, and
//! `bcrypt::BcryptError` let the `?` operator do the mapping.
//!
//! Status mapping: 401 covers missing/invalid authentication and role
//! denial, while 403 is reserved for ownership violations on resources the
//! caller is otherwise allowed to reach.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use validator::ValidationErrors;

use crate::response::ApiEnvelope;

/// Postgres error code for a unique-constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input, duplicate email, validation failure (HTTP 400).
    BadRequest(String),
    /// Missing/invalid/expired token, wrong password, or role not permitted (HTTP 401).
    Unauthorized(String),
    /// Ownership violation: authenticated, permitted on the route, but not
    /// the owner of the target resource (HTTP 403).
    Forbidden(String),
    /// A requested resource id does not resolve (HTTP 404).
    NotFound(String),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Error originating from the database layer (HTTP 500).
    DatabaseError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "{}", msg),
            ApiError::Unauthorized(msg) => write!(f, "{}", msg),
            ApiError::Forbidden(msg) => write!(f, "{}", msg),
            ApiError::NotFound(msg) => write!(f, "{}", msg),
            ApiError::InternalServerError(msg) => write!(f, "{}", msg),
            ApiError::DatabaseError(msg) => write!(f, "{}", msg),
        }
    }
}

/// Converts `ApiError` variants into enveloped `HttpResponse` objects.
impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("request failed: {}", self);
        }
        ApiEnvelope::respond_message(status, &self.to_string())
    }
}

/// Converts `sqlx::Error` into `ApiError`.
///
/// `RowNotFound` maps to `NotFound`, a unique-constraint violation maps to
/// `BadRequest` (duplicate email is the only unique constraint in the
/// schema), and everything else becomes `DatabaseError`.
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> ApiError {
        match &error {
            sqlx::Error::RowNotFound => ApiError::NotFound("record not found".into()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                ApiError::BadRequest("a record with that value already exists".into())
            }
            _ => ApiError::DatabaseError(error.to_string()),
        }
    }
}

/// Validation failures are client errors; the detailed messages are preserved.
impl From<ValidationErrors> for ApiError {
    fn from(error: ValidationErrors) -> ApiError {
        ApiError::BadRequest(error.to_string())
    }
}

/// JWT processing failures are authentication failures, never server errors.
impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(error: jsonwebtoken::errors::Error) -> ApiError {
        ApiError::Unauthorized(error.to_string())
    }
}

/// Hashing failures are unexpected internal conditions.
impl From<bcrypt::BcryptError> for ApiError {
    fn from(error: bcrypt::BcryptError) -> ApiError {
        ApiError::InternalServerError(error.to_string())
    }
}
