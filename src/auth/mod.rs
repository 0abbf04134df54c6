pub mod extractors;
pub mod middleware;
pub mod password;
pub mod role;
pub mod token;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::Role;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use role::RequireRole;
pub use token::{AccessClaims, RefreshClaims, TokenManager};

/// Rejects values that are empty once trimmed; any other content is a valid
/// display name.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("must not be empty"));
    }
    Ok(())
}

/// Payload for a new account registration.
///
/// Unknown JSON keys are ignored at deserialization, which is the typed
/// equivalent of the field allow-list this API has always applied to
/// incoming bodies.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name; any non-empty string up to the length cap.
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub name: String,
    /// Must be a valid email format; stored lowercased.
    #[validate(email)]
    pub email: String,
    /// Must be at least 6 characters long.
    #[validate(length(min = 6, max = 100))]
    pub password: String,
    /// Privilege tier for the new account.
    pub role: Role,
}

/// Payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 100))]
    pub password: String,
}

/// Payload for a token refresh; the token may also arrive as a cookie.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}
