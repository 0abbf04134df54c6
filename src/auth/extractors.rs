use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::ApiError;
use crate::models::User;

/// Extracts the authenticated user from request extensions.
///
/// Intended for routes protected by `AuthMiddleware`, which validates the
/// access token and inserts the resolved `User` record into the extensions.
/// If no identity is present the extractor fails with 401; a handler can
/// never observe a half-authenticated request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError; // ApiError converts via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<User>().cloned() {
            Some(user) => ready(Ok(AuthenticatedUser(user))),
            None => {
                let err = ApiError::Unauthorized(
                    "no authenticated identity attached to the request".to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}
