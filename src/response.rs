//!
//! # Response Envelope
//!
//! Every response the API produces, success or failure, is wrapped in the
//! same JSON envelope: `{ "statusCode": u16, "data": <value|null>, "message": string }`.
//! Handlers build success envelopes through the helpers here; error envelopes
//! are produced by `ApiError::error_response` using the same struct.

use actix_web::{http::StatusCode, HttpResponse, HttpResponseBuilder};
use serde::Serialize;

/// The uniform response body shared by every endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    /// HTTP status code, repeated in the body for client convenience.
    pub status_code: u16,
    /// Operation payload; `null` for message-only and error responses.
    pub data: Option<T>,
    /// Human-readable outcome description.
    pub message: String,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn new(status: StatusCode, data: T, message: &str) -> Self {
        Self {
            status_code: status.as_u16(),
            data: Some(data),
            message: message.to_owned(),
        }
    }

    /// Builds an `HttpResponse` carrying the envelope with the given payload.
    pub fn respond(status: StatusCode, data: T, message: &str) -> HttpResponse {
        HttpResponse::build(status).json(Self::new(status, data, message))
    }

    /// Same as `respond`, but on a caller-provided builder so cookies or
    /// headers can be attached first.
    pub fn respond_with(
        builder: &mut HttpResponseBuilder,
        status: StatusCode,
        data: T,
        message: &str,
    ) -> HttpResponse {
        builder.json(Self::new(status, data, message))
    }
}

impl ApiEnvelope<()> {
    /// Envelope with `data: null`, used for errors and message-only successes.
    pub fn empty(status: StatusCode, message: &str) -> Self {
        Self {
            status_code: status.as_u16(),
            data: None,
            message: message.to_owned(),
        }
    }

    pub fn respond_message(status: StatusCode, message: &str) -> HttpResponse {
        HttpResponse::build(status).json(Self::empty(status, message))
    }
}
