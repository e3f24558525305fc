use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::auth::token::verify_token;
use crate::error::AppError;
use crate::models::User;
use crate::repo::UserRepo;

/// An authenticated request context: the resolved user plus the exact token
/// string that authenticated this request.
///
/// Declaring an `AuthSession` parameter is what makes a route protected.
/// Extraction performs the full authentication step and either yields this
/// context or fails the request with 401, so handlers never see a
/// half-authenticated state:
///
/// 1. the `Authorization: Bearer <token>` header must be present and intact,
/// 2. the token signature and expiry must verify,
/// 3. the (user, token) pair must still exist in the stored session list,
///    which is how logging out revokes a token whose signature is still good.
///
/// Keeping the raw token around lets the logout handler remove exactly the
/// session it was called with.
#[derive(Debug)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

impl FromRequest for AuthSession {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let repo = req.app_data::<web::Data<UserRepo>>().cloned();
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.to_string());

        Box::pin(async move {
            let token = bearer
                .ok_or_else(|| AppError::Unauthorized("Please authenticate".into()))?;

            let claims = verify_token(&token)?;

            let repo = repo.ok_or_else(|| {
                AppError::InternalServerError("User repository not configured".into())
            })?;

            // The signature alone is not enough: a logged-out token is dead
            // even though it would still verify.
            if !repo.session_exists(claims.sub, &token).await? {
                return Err(AppError::Unauthorized("Please authenticate".into()).into());
            }

            let user = repo
                .find_by_id(claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Please authenticate".into()))?;

            Ok(AuthSession { user, token })
        })
    }
}
