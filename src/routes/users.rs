use actix_web::{cookie::Cookie, http::StatusCode, web, HttpRequest, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{
        hash_password, verify_password, AuthenticatedUser, LoginRequest, RefreshRequest,
        RegisterRequest, TokenManager,
    },
    error::ApiError,
    models::{UpdateUserRequest, User},
    response::ApiEnvelope,
};

const USER_COLUMNS: &str = "id, name, email, password, role, refresh_token, created_at, updated_at";

/// Builds the httpOnly+secure cookie both tokens are delivered in.
fn auth_cookie(name: &'static str, value: &str) -> Cookie<'static> {
    Cookie::build(name, value.to_owned())
        .path("/")
        .http_only(true)
        .secure(true)
        .finish()
}

/// An expired variant of `auth_cookie`, used to clear it on logout.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = auth_cookie(name, "");
    cookie.make_removal();
    cookie
}

async fn fetch_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Register a new user
///
/// Creates an account with a hashed password. No tokens are issued here;
/// the client logs in afterwards.
pub async fn register(
    pool: web::Data<PgPool>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let email = body.email.trim().to_lowercase();

    // Application-level duplicate check; the unique index on lower(email) is
    // the authority under concurrent registration.
    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE lower(email) = $1")
        .bind(&email)
        .fetch_optional(pool.get_ref())
        .await?;

    if existing.is_some() {
        return Err(ApiError::BadRequest(
            "a user with that email already exists".into(),
        ));
    }

    let password = hash_password(&body.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, name, email, password, role) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(body.name.trim())
    .bind(&email)
    .bind(&password)
    .bind(body.role)
    .fetch_one(pool.get_ref())
    .await?;

    log::info!("registered user {} ({})", user.id, user.email);

    Ok(ApiEnvelope::respond(
        StatusCode::CREATED,
        json!({ "user": user }),
        "user has been created successfully",
    ))
}

/// Login user
///
/// Verifies the credentials, issues an access/refresh token pair, persists
/// the refresh token (overwriting any prior one, so only a single session
/// stays refreshable), and delivers both tokens as cookies and in the body.
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenManager>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let email = body.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE lower(email) = $1",
        USER_COLUMNS
    ))
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?;

    // Unknown email and wrong password answer identically; nothing to
    // enumerate accounts with.
    let user = user.ok_or_else(|| ApiError::Unauthorized("invalid email or password".into()))?;

    if !verify_password(&body.password, &user.password)? {
        return Err(ApiError::Unauthorized("invalid email or password".into()));
    }

    let access_token = tokens.issue_access_token(&user)?;
    let refresh_token = tokens.issue_refresh_token(user.id)?;

    sqlx::query("UPDATE users SET refresh_token = $1, updated_at = now() WHERE id = $2")
        .bind(&refresh_token)
        .bind(user.id)
        .execute(pool.get_ref())
        .await?;

    Ok(ApiEnvelope::respond_with(
        HttpResponse::Ok()
            .cookie(auth_cookie("accessToken", &access_token))
            .cookie(auth_cookie("refreshToken", &refresh_token)),
        StatusCode::OK,
        json!({
            "user": user,
            "accessToken": access_token,
            "refreshToken": refresh_token,
        }),
        "user logged in successfully",
    ))
}

/// Logout user
///
/// Clears the stored refresh token and both cookies. Previously issued
/// access tokens stay valid until their own expiry, since access tokens are
/// never checked against server state.
pub async fn logout(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = now() WHERE id = $1")
        .bind(user.0.id)
        .execute(pool.get_ref())
        .await?;

    Ok(ApiEnvelope::respond_with(
        HttpResponse::Ok()
            .cookie(removal_cookie("accessToken"))
            .cookie(removal_cookie("refreshToken")),
        StatusCode::OK,
        serde_json::Value::Null,
        "user logged out successfully",
    ))
}

/// Rotate the token pair using a refresh token.
///
/// The presented token (cookie or body) must verify *and* match the stored
/// per-user value; a token superseded by a later login or cleared by logout
/// is rejected even if its signature and expiry are still valid.
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenManager>,
    body: Option<web::Json<RefreshRequest>>,
) -> Result<HttpResponse, ApiError> {
    let presented = req
        .cookie("refreshToken")
        .map(|cookie| cookie.value().to_owned())
        .or_else(|| body.as_ref().and_then(|b| b.refresh_token.clone()))
        .ok_or_else(|| ApiError::Unauthorized("missing refresh token".into()))?;

    let claims = tokens.verify_refresh_token(&presented)?;

    let user = fetch_user_by_id(pool.get_ref(), claims.sub)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized("refresh token does not resolve to an existing user".into())
        })?;

    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        return Err(ApiError::Unauthorized(
            "refresh token has been superseded or revoked".into(),
        ));
    }

    let access_token = tokens.issue_access_token(&user)?;
    let new_refresh_token = tokens.issue_refresh_token(user.id)?;

    sqlx::query("UPDATE users SET refresh_token = $1, updated_at = now() WHERE id = $2")
        .bind(&new_refresh_token)
        .bind(user.id)
        .execute(pool.get_ref())
        .await?;

    Ok(ApiEnvelope::respond_with(
        HttpResponse::Ok()
            .cookie(auth_cookie("accessToken", &access_token))
            .cookie(auth_cookie("refreshToken", &new_refresh_token)),
        StatusCode::OK,
        json!({
            "accessToken": access_token,
            "refreshToken": new_refresh_token,
        }),
        "access token refreshed successfully",
    ))
}

/// Delete a user by id. Admin only (route-gated).
pub async fn delete_user(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let target = fetch_user_by_id(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user with the provided id couldn't be found".into()))?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    log::info!("deleted user {} ({})", target.id, target.email);

    Ok(ApiEnvelope::respond(
        StatusCode::OK,
        json!({ "deleted_user": target }),
        "user successfully deleted",
    ))
}

/// List every user. Admin only (route-gated).
pub async fn fetch_all_users(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let all_users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY created_at",
        USER_COLUMNS
    ))
    .fetch_all(pool.get_ref())
    .await?;

    Ok(ApiEnvelope::respond(
        StatusCode::OK,
        json!({ "all_users": all_users }),
        "all users fetched successfully",
    ))
}

/// Fetch one user by id. Admin only (route-gated).
pub async fn fetch_user(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user = fetch_user_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("user with the provided id couldn't be found".into()))?;

    Ok(ApiEnvelope::respond(
        StatusCode::OK,
        json!({ "user": user }),
        "user fetched successfully",
    ))
}

/// Update the authenticated user's own name, email and/or password.
///
/// The role is not updatable through this endpoint. The password is rehashed
/// only when the payload actually carries one; other field changes never
/// touch the stored hash.
pub async fn update_user(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let update = body.into_inner();

    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one of name, email or password must be provided".into(),
        ));
    }

    let email = update.email.map(|e| e.trim().to_lowercase());
    let password = match update.password {
        Some(plaintext) => Some(hash_password(&plaintext)?),
        None => None,
    };

    // Duplicate email surfaces as a unique violation and maps to 400.
    let updated_user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users \
         SET name = COALESCE($1, name), \
             email = COALESCE($2, email), \
             password = COALESCE($3, password), \
             updated_at = now() \
         WHERE id = $4 \
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(update.name)
    .bind(email)
    .bind(password)
    .bind(user.0.id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(ApiEnvelope::respond(
        StatusCode::OK,
        json!({ "updated_user": updated_user }),
        "user data is updated successfully",
    ))
}
