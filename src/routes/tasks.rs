use actix_web::{http::StatusCode, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    error::ApiError,
    models::{Role, Task, TaskInput, User},
    response::ApiEnvelope,
};

const TASK_COLUMNS: &str = "id, title, description, user_id, created_at, updated_at";

/// Ownership check for task mutation.
///
/// The owner may always mutate; an admin may mutate any task. Everyone else
/// gets 403 — distinct from the 401 used for authentication failures.
fn ensure_owner_or_admin(user: &User, owner_id: Uuid) -> Result<(), ApiError> {
    if user.id == owner_id || user.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "you do not own this task".into(),
        ))
    }
}

async fn fetch_task_by_id(pool: &PgPool, id: Uuid) -> Result<Task, ApiError> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("task with the provided id couldn't be found".into()))
}

/// Create a task owned by the authenticated user.
pub async fn add_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    body: web::Json<TaskInput>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let task = Task::new(body.into_inner(), user.0.id);

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, title, description, user_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.user_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(ApiEnvelope::respond(
        StatusCode::CREATED,
        json!({ "task": task }),
        "task added successfully",
    ))
}

/// List the authenticated user's own tasks, newest first.
pub async fn fetch_tasks(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC",
        TASK_COLUMNS
    ))
    .bind(user.0.id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(ApiEnvelope::respond(
        StatusCode::OK,
        json!({ "tasks": tasks }),
        "tasks fetched successfully",
    ))
}

/// List every user's tasks. Admin only (route-gated).
pub async fn fetch_all_tasks(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks ORDER BY created_at DESC",
        TASK_COLUMNS
    ))
    .fetch_all(pool.get_ref())
    .await?;

    Ok(ApiEnvelope::respond(
        StatusCode::OK,
        json!({ "tasks": tasks }),
        "all tasks fetched successfully",
    ))
}

/// Replace the title and description of a task (owner or admin).
pub async fn update_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<TaskInput>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let id = path.into_inner();

    let task = fetch_task_by_id(pool.get_ref(), id).await?;
    ensure_owner_or_admin(&user.0, task.user_id)?;

    // The owner reference is never part of the update; ownership is
    // immutable after creation.
    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET title = $1, description = $2, updated_at = now() \
         WHERE id = $3 \
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&body.title)
    .bind(&body.description)
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(ApiEnvelope::respond(
        StatusCode::OK,
        json!({ "task": task }),
        "task updated successfully",
    ))
}

/// Delete a task (owner or admin).
pub async fn delete_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let task = fetch_task_by_id(pool.get_ref(), id).await?;
    ensure_owner_or_admin(&user.0, task.user_id)?;

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    Ok(ApiEnvelope::respond(
        StatusCode::OK,
        json!({ "deleted_task": task }),
        "task deleted successfully",
    ))
}
