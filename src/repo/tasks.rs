use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskQuery, TaskUpdate};

const TASK_COLUMNS: &str = "id, description, completed, owner, created_at, updated_at";

/// Repository for task rows. Every query is scoped to an owner so one user
/// can never read or mutate another user's tasks.
#[derive(Clone)]
pub struct TaskRepo {
    pool: PgPool,
}

impl TaskRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, description, completed, owner, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.owner)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    /// Lists an owner's tasks with optional completion filter, pagination
    /// and sort order.
    ///
    /// The filter and pagination clauses are appended dynamically; the sort
    /// clause comes from `TaskQuery::order_clause`, which only ever yields
    /// fixed column/direction pairs.
    pub async fn list(&self, owner: i32, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let order = query.order_clause()?;

        let mut sql = format!("SELECT {} FROM tasks WHERE owner = $1", TASK_COLUMNS);
        let mut param_count = 2;

        if query.completed.is_some() {
            sql.push_str(&format!(" AND completed = ${}", param_count));
            param_count += 1;
        }

        sql.push_str(&format!(" ORDER BY {}", order));

        if query.limit.is_some() {
            sql.push_str(&format!(" LIMIT ${}", param_count));
            param_count += 1;
        }
        if query.skip.is_some() {
            sql.push_str(&format!(" OFFSET ${}", param_count));
        }

        let mut query_builder = sqlx::query_as::<_, Task>(&sql).bind(owner);

        if let Some(completed) = query.completed {
            query_builder = query_builder.bind(completed);
        }
        if let Some(limit) = query.limit {
            query_builder = query_builder.bind(limit);
        }
        if let Some(skip) = query.skip {
            query_builder = query_builder.bind(skip);
        }

        let tasks = query_builder.fetch_all(&self.pool).await?;

        Ok(tasks)
    }

    pub async fn find(&self, id: Uuid, owner: i32) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND owner = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// Applies a validated partial update. Returns `None` when the task does
    /// not exist or belongs to someone else, which callers report as 404.
    pub async fn update(
        &self,
        id: Uuid,
        owner: i32,
        update: &TaskUpdate,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET \
                 description = COALESCE($1, description), \
                 completed = COALESCE($2, completed), \
                 updated_at = NOW() \
             WHERE id = $3 AND owner = $4 \
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.completed)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task and returns the deleted row, or `None` when the task
    /// does not exist or belongs to someone else.
    pub async fn delete(&self, id: Uuid, owner: i32) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND owner = $2 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }
}
