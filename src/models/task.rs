use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Input structure for creating or replacing a task.
/// Both fields are required and must be non-empty.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// The description of the task.
    /// Must be between 1 and 1000 characters.
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Identifier of the owning user. Set at creation, immutable afterwards.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` from `TaskInput`, owned by `owner_id`.
    pub fn new(input: TaskInput, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            user_id: owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}
