use crate::{
    auth::AuthSession,
    error::AppError,
    models::{Task, TaskInput, TaskQuery, TaskUpdate},
    repo::TaskRepo,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

/// Retrieves the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `completed` (optional): keep only done (`true`) or open (`false`) tasks.
/// - `limit` / `skip` (optional): pagination.
/// - `sortBy` (optional): `createdAt`/`updatedAt` with `:asc` or `:desc`,
///   e.g. `sortBy=createdAt:asc`. Defaults to newest first.
///
/// ## Responses:
/// - `200 OK`: a JSON array of tasks.
/// - `400 Bad Request`: unsupported sort specification.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    repo: web::Data<TaskRepo>,
    session: AuthSession,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = repo.list(session.user.id, &query_params).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// The description must be non-empty after trimming; `completed` defaults
/// to false. Responds `201 Created` with the stored task.
#[post("")]
pub async fn create_task(
    repo: web::Data<TaskRepo>,
    session: AuthSession,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), session.user.id);
    let task = repo.insert(&task).await?;

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a single task by id.
///
/// A task that does not exist and a task owned by someone else are both
/// reported as a bodyless 404.
#[get("/{id}")]
pub async fn get_task(
    repo: web::Data<TaskRepo>,
    session: AuthSession,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = repo
        .find(task_id.into_inner(), session.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task.
///
/// The body is checked against the `{description, completed}` allow-list as
/// a whole; one disallowed key rejects the entire request. Not-found and
/// foreign tasks are a bodyless 404.
#[patch("/{id}")]
pub async fn update_task(
    repo: web::Data<TaskRepo>,
    session: AuthSession,
    task_id: web::Path<Uuid>,
    body: web::Json<Map<String, Value>>,
) -> Result<impl Responder, AppError> {
    let update = TaskUpdate::from_body(&body)?;

    let task = repo
        .update(task_id.into_inner(), session.user.id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task and returns the deleted document.
#[delete("/{id}")]
pub async fn delete_task(
    repo: web::Data<TaskRepo>,
    session: AuthSession,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = repo
        .delete(task_id.into_inner(), session.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}
