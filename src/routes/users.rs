use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, AuthSession, LoginRequest,
    },
    avatar,
    error::AppError,
    models::{SignupRequest, UserUpdate},
    repo::UserRepo,
};
use actix_multipart::Multipart;
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::{Map, Value};
use validator::Validate;

/// Create a new account.
///
/// Validates the payload, rejects duplicate emails, stores the password as a
/// bcrypt hash and immediately opens a session, so the response token is
/// usable on the very next request.
#[post("/signup")]
pub async fn signup(
    repo: web::Data<UserRepo>,
    signup_data: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    signup_data.validate()?;

    if repo.email_taken(&signup_data.email).await? {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = hash_password(&signup_data.password)?;

    let user = repo
        .create(
            &signup_data.name,
            &signup_data.email,
            &password_hash,
            signup_data.age,
        )
        .await?;

    let token = generate_token(user.id)?;
    repo.insert_session(user.id, &token).await?;

    Ok(HttpResponse::Created().json(AuthResponse { user, token }))
}

/// Authenticate with email and password.
///
/// Every failure mode collapses into the same bodyless 400 so the response
/// never reveals whether the email exists or the password was wrong.
#[post("/login")]
pub async fn login(
    repo: web::Data<UserRepo>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let user = repo
        .find_by_email(&login_data.email)
        .await
        .map_err(|_| AppError::InvalidCredentials)?
        .ok_or(AppError::InvalidCredentials)?;

    let verified = verify_password(&login_data.password, &user.password_hash)
        .map_err(|_| AppError::InvalidCredentials)?;
    if !verified {
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_token(user.id).map_err(|_| AppError::InvalidCredentials)?;
    repo.insert_session(user.id, &token)
        .await
        .map_err(|_| AppError::InvalidCredentials)?;

    Ok(HttpResponse::Ok().json(AuthResponse { user, token }))
}

/// End the current session.
///
/// Removes exactly the token this request was authenticated with; tokens
/// issued to the same user from other logins keep working.
#[post("/logout")]
pub async fn logout(
    repo: web::Data<UserRepo>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    repo.delete_session(session.user.id, &session.token).await?;

    Ok(HttpResponse::Ok().finish())
}

/// End every session of the current user.
#[post("/logoutAll")]
pub async fn logout_all(
    repo: web::Data<UserRepo>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    repo.clear_sessions(session.user.id).await?;

    Ok(HttpResponse::Ok().finish())
}

/// Return the authenticated user's profile.
#[get("/me")]
pub async fn me(session: AuthSession) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(session.user))
}

/// Partially update the authenticated user's profile.
///
/// The body is an arbitrary JSON object checked against the field
/// allow-list as a whole: one disallowed key rejects the entire request and
/// nothing is applied. A new password is re-hashed before storage.
#[patch("/me")]
pub async fn update_me(
    repo: web::Data<UserRepo>,
    session: AuthSession,
    body: web::Json<Map<String, Value>>,
) -> Result<impl Responder, AppError> {
    let update = UserUpdate::from_body(&body)?;

    let password_hash = match update.password.as_deref() {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = repo
        .update_profile(session.user.id, &update, password_hash)
        .await?;

    Ok(HttpResponse::Ok().json(user))
}

/// Delete the authenticated user's account.
///
/// Cascades over everything the account owns (tasks, sessions) in a single
/// transaction and returns the deleted profile.
#[delete("/me")]
pub async fn delete_me(
    repo: web::Data<UserRepo>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    repo.delete_cascade(session.user.id).await?;

    Ok(HttpResponse::Ok().json(session.user))
}

/// Upload an avatar image.
///
/// Expects a multipart file field named `avatar` (jpg/jpeg/png by filename,
/// at most 1 MB). The image is normalized to a 250x250 PNG before storage
/// and replaces any previous avatar.
#[post("/me/avatar")]
pub async fn upload_avatar(
    repo: web::Data<UserRepo>,
    session: AuthSession,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let bytes = avatar::read_upload(payload).await?;
    let normalized = avatar::normalize(&bytes)?;

    repo.set_avatar(session.user.id, &normalized).await?;

    Ok(HttpResponse::Ok().finish())
}

/// Remove the authenticated user's avatar. Idempotent.
#[delete("/me/avatar")]
pub async fn delete_avatar(
    repo: web::Data<UserRepo>,
    session: AuthSession,
) -> Result<impl Responder, AppError> {
    repo.clear_avatar(session.user.id).await?;

    Ok(HttpResponse::Ok().finish())
}

/// Fetch any user's avatar by user id. Public.
///
/// Responds 404 with no body when the user is unknown or has no avatar; a
/// stored avatar is always a PNG, so the content type is fixed.
#[get("/{id}/avatar")]
pub async fn get_avatar(
    repo: web::Data<UserRepo>,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let user = repo
        .find_by_id(user_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    match user.avatar {
        Some(bytes) => Ok(HttpResponse::Ok().content_type("image/png").body(bytes)),
        None => Err(AppError::NotFound("Avatar not set".into())),
    }
}
