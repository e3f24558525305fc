use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{User, UserUpdate};

const USER_COLUMNS: &str = "id, name, email, password_hash, age, avatar, created_at, updated_at";

/// Repository for user rows and their session token list.
#[derive(Clone)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        age: Option<i32>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, age) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(age)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool, AppError> {
        let existing = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(existing.is_some())
    }

    /// Applies a validated partial update and returns the updated row.
    ///
    /// Absent fields are left untouched. The password arrives pre-hashed;
    /// the plaintext in `update` is never written anywhere.
    pub async fn update_profile(
        &self,
        id: i32,
        update: &UserUpdate,
        password_hash: Option<String>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                 name = COALESCE($1, name), \
                 email = COALESCE($2, email), \
                 password_hash = COALESCE($3, password_hash), \
                 age = COALESCE($4, age), \
                 updated_at = NOW() \
             WHERE id = $5 \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(update.name.as_deref())
        .bind(update.email.as_deref())
        .bind(password_hash)
        .bind(update.age)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn set_avatar(&self, id: i32, bytes: &[u8]) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET avatar = $1, updated_at = NOW() WHERE id = $2")
            .bind(bytes)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Clears the avatar column. Idempotent: clearing an absent avatar is
    /// still a success.
    pub async fn clear_avatar(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET avatar = NULL, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Appends a freshly issued token to the user's session list.
    pub async fn insert_session(&self, user_id: i32, token: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO sessions (user_id, token) VALUES ($1, $2)")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn session_exists(&self, user_id: i32, token: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT id FROM sessions WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Removes exactly one session, matched by the full token string. Other
    /// sessions of the same user stay valid.
    pub async fn delete_session(&self, user_id: i32, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn clear_sessions(&self, user_id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Removes an account and everything it owns in one transaction.
    ///
    /// `tasks.owner` carries no foreign-key constraint, so the store would
    /// happily leave orphaned tasks behind; the cascade has to be spelled out
    /// here. Sessions and the user row follow in the same transaction so a
    /// partial failure rolls the whole deletion back.
    pub async fn delete_cascade(&self, user_id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tasks WHERE owner = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
