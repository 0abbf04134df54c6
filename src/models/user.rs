use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Coarse privilege tier gating route access.
/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account; can manage only its own tasks.
    User,
    /// May list and manage records across all owners.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// A user record as stored in the database.
///
/// The bcrypt hash and the current refresh token are never serialized, so no
/// response can leak them regardless of which handler returns the record.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored lowercased; uniqueness is enforced by a unique index on
    /// `lower(email)`.
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    /// The single currently-valid refresh token, or `None` when logged out.
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update payload for `/user/update-user`.
///
/// `role` is deliberately absent: a user must not be able to promote
/// themselves, and unknown JSON keys are ignored by deserialization the same
/// way the field allow-list did in earlier revisions of this API.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 100))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// True when the payload carries nothing to update.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}
