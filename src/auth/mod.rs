pub mod extractors;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};

use crate::models::User;

// Re-export necessary items
pub use extractors::AuthSession;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Represents the payload for a user login request.
///
/// Deliberately not validated beyond its shape: every login failure,
/// whatever its cause, produces the same bodyless 400 response.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// User's email address.
    pub email: String,
    /// User's password.
    pub password: String,
}

/// Response structure after successful authentication (login or signup).
///
/// The embedded user serializes without credential material; the token is
/// the session credential to present on subsequent requests.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}
