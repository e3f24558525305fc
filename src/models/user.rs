use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

/// A user row as stored in the database.
///
/// Credential material never leaves the server: `password_hash` and the raw
/// `avatar` bytes are excluded from serialization, and the session token list
/// lives in its own table rather than on the user object.
#[derive(Debug, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: Option<i32>,
    #[serde(skip_serializing)]
    pub avatar: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(range(min = 0))]
    pub age: Option<i32>,
}

/// Field names a client is permitted to send in a profile PATCH.
pub const ALLOWED_UPDATE_FIELDS: [&str; 4] = ["name", "email", "password", "age"];

/// Typed form of a profile PATCH body.
///
/// Constructed through [`UserUpdate::from_body`], which enforces the field
/// allow-list before any value is even deserialized. A single disallowed key
/// rejects the whole request; nothing is applied partially.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[validate(range(min = 0))]
    pub age: Option<i32>,
}

impl UserUpdate {
    /// Checks every key of a raw PATCH body against the allow-list, then
    /// deserializes and validates the values.
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, AppError> {
        if !body.keys().all(|key| ALLOWED_UPDATE_FIELDS.contains(&key.as_str())) {
            return Err(AppError::InvalidUpdates);
        }

        let update: UserUpdate = serde_json::from_value(Value::Object(body.clone()))
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        update.validate()?;
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.age.is_none()
    }
}
