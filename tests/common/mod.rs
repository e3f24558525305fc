//! Shared plumbing for the database-backed integration tests.
//!
//! These tests run against a real Postgres instance; they expect
//! `DATABASE_URL` to point at a database with the migrations applied.

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test;
use dotenv::dotenv;
use serde_json::json;
use sqlx::PgPool;

pub async fn test_pool() -> PgPool {
    dotenv().ok();
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
    }

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

/// Removes a user and everything hanging off it, keyed by email, so a test
/// can rerun after a failed earlier attempt.
pub async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query(
        "DELETE FROM tasks WHERE owner IN (SELECT id FROM users WHERE email = $1)",
    )
    .bind(email)
    .execute(pool)
    .await;
    // Sessions go with the user row via the FK cascade.
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

/// Signs up a fresh user and returns its id and session token.
pub async fn register_user<S, B>(app: &S, name: &str, email: &str, password: &str) -> (i32, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/users/signup")
        .set_json(json!({
            "name": name,
            "email": email,
            "password": password
        }))
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Signup failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );

    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes).expect("Failed to parse signup response JSON");
    let user_id = body["user"]["id"].as_i64().expect("user id missing") as i32;
    let token = body["token"].as_str().expect("token missing").to_string();

    (user_id, token)
}

/// Logs an existing user in and returns a new session token.
pub async fn login_user<S, B>(app: &S, email: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({
            "email": email,
            "password": password
        }))
        .to_request();

    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK, "Login failed");

    let body: serde_json::Value = test::read_body_json(resp).await;
    body["token"].as_str().expect("token missing").to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
