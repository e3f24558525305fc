use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Rejects descriptions that are empty once surrounding whitespace is removed.
fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// What needs to be done. Required, non-empty after trimming.
    #[validate(custom = "validate_not_blank")]
    pub description: String,

    /// Whether the task is already done. Defaults to false.
    pub completed: Option<bool>,
}

/// A task entity as stored in the database and returned by the API.
///
/// `owner` references `users.id` but is enforced only at the application
/// layer; the schema carries no foreign-key constraint for it, so deleting
/// a user must explicitly remove their tasks.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// What needs to be done, stored trimmed.
    pub description: String,
    /// Whether the task is done.
    pub completed: bool,
    /// Identifier of the user who owns the task.
    pub owner: i32,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the owner's user id.
    pub fn new(input: TaskInput, owner: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: input.description.trim().to_string(),
            completed: input.completed.unwrap_or(false),
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by completion state.
    pub completed: Option<bool>,
    /// Maximum number of tasks to return.
    pub limit: Option<i64>,
    /// Number of tasks to skip, for pagination.
    pub skip: Option<i64>,
    /// Sort specification, `<field>:<asc|desc>`, e.g. `createdAt:desc`.
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

impl TaskQuery {
    /// Translates the `sortBy` parameter into an ORDER BY clause.
    ///
    /// Only the timestamp columns are sortable; anything else is rejected
    /// rather than interpolated into SQL. Defaults to newest first.
    pub fn order_clause(&self) -> Result<&'static str, AppError> {
        let spec = match self.sort_by.as_deref() {
            None => return Ok("created_at DESC"),
            Some(spec) => spec,
        };

        match spec {
            "createdAt:asc" => Ok("created_at ASC"),
            "createdAt:desc" => Ok("created_at DESC"),
            "updatedAt:asc" => Ok("updated_at ASC"),
            "updatedAt:desc" => Ok("updated_at DESC"),
            other => Err(AppError::BadRequest(format!(
                "Unsupported sort: {}",
                other
            ))),
        }
    }
}

/// Field names a client is permitted to send in a task PATCH.
pub const TASK_UPDATE_FIELDS: [&str; 2] = ["description", "completed"];

/// Typed form of a task PATCH body, allow-list checked before deserialization.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(custom = "validate_not_blank")]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    /// Checks every key of a raw PATCH body against the allow-list, then
    /// deserializes and validates the values. One disallowed key rejects the
    /// entire request.
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, AppError> {
        if !body.keys().all(|key| TASK_UPDATE_FIELDS.contains(&key.as_str())) {
            return Err(AppError::InvalidUpdates);
        }

        let update: TaskUpdate = serde_json::from_value(Value::Object(body.clone()))
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        update.validate()?;
        Ok(update)
    }
}
