use std::rc::Rc;

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web::{self, BytesMut},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use futures::StreamExt;
use sqlx::PgPool;

use crate::auth::token::TokenManager;
use crate::error::ApiError;
use crate::models::User;

/// Routes reachable without an access token.
const PUBLIC_PATHS: &[&str] = &[
    "/api/v1/user/register",
    "/api/v1/user/login",
    "/api/v1/user/refresh-token",
];

/// Authentication middleware.
///
/// Resolves a verified identity for every non-public request: the access
/// token is looked up in the `accessToken` cookie, then the JSON request
/// body, then the `Authorization: Bearer` header (in that precedence order),
/// verified, and resolved to a stored user record which is attached to the
/// request extensions. Any failure short-circuits with 401.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // Skip authentication for health check and credential endpoints
            let path = req.path().to_owned();
            if path == "/health" || PUBLIC_PATHS.iter().any(|public| path == *public) {
                return service.call(req).await;
            }

            let token = match request_token(&mut req).await {
                Some(token) => token,
                None => {
                    return Err(
                        ApiError::Unauthorized("missing access token, unauthorized".into()).into(),
                    )
                }
            };

            let tokens = req
                .app_data::<web::Data<TokenManager>>()
                .cloned()
                .ok_or_else(|| {
                    Error::from(ApiError::InternalServerError(
                        "token manager is not configured".into(),
                    ))
                })?;
            let claims = tokens.verify_access_token(&token).map_err(Error::from)?;

            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| {
                    Error::from(ApiError::InternalServerError(
                        "database pool is not configured".into(),
                    ))
                })?;

            // The token may outlive the account it was issued for.
            let user = sqlx::query_as::<_, User>(
                "SELECT id, name, email, password, role, refresh_token, created_at, updated_at \
                 FROM users WHERE id = $1",
            )
            .bind(claims.sub)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| Error::from(ApiError::from(e)))?;

            match user {
                Some(user) => {
                    req.extensions_mut().insert(user);
                    service.call(req).await
                }
                None => Err(ApiError::Unauthorized(
                    "access token does not resolve to an existing user".into(),
                )
                .into()),
            }
        })
    }
}

/// Extracts the access token from the request.
///
/// Precedence: `accessToken` cookie, `accessToken` field of a JSON body,
/// `Authorization: Bearer` header. Reading the body consumes the payload, so
/// it is buffered and reinstalled for downstream extractors.
pub(crate) async fn request_token(req: &mut ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie("accessToken") {
        return Some(cookie.value().to_owned());
    }

    if let Some(token) = token_from_body(req).await {
        return Some(token);
    }

    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.trim().to_owned())
}

/// Upper bound on how much of a JSON body is buffered while looking for a
/// token. Bodies above it are skipped; the header carrier still applies.
const MAX_BUFFERED_BODY: usize = 100 * 1024;

async fn token_from_body(req: &mut ServiceRequest) -> Option<String> {
    if req.content_type() != "application/json" {
        return None;
    }

    // Oversized bodies never get drained; the payload is left untouched for
    // downstream extractors to reject.
    let declared_len = req
        .headers()
        .get(actix_web::http::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if matches!(declared_len, Some(len) if len > MAX_BUFFERED_BODY) {
        return None;
    }

    let mut payload = req.take_payload();
    let mut buf = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        match chunk {
            // A stream that outgrows the cap despite its declared length is
            // cut off here; the truncated body then fails JSON extraction.
            Ok(bytes) if buf.len() + bytes.len() > MAX_BUFFERED_BODY => break,
            Ok(bytes) => buf.extend_from_slice(&bytes),
            Err(_) => break,
        }
    }
    let body = buf.freeze();

    let token = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("accessToken")
                .and_then(|token| token.as_str())
                .map(str::to_owned)
        });

    // Reinstall the buffered bytes so Json extractors still see the body.
    let (_, mut restored) = h1::Payload::create(true);
    restored.unread_data(body);
    req.set_payload(actix_web::dev::Payload::from(restored));

    token
}
