use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::json;

use taskhub::repo::{TaskRepo, UserRepo};
use taskhub::routes;

mod common;
use common::{bearer, cleanup_user, login_user, register_user, test_pool};

macro_rules! test_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(UserRepo::new($pool.clone())))
                .app_data(web::Data::new(TaskRepo::new($pool.clone())))
                .wrap(Logger::default())
                .service(routes::health::health)
                .configure(routes::config),
        )
        .await
    };
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_signup_token_works_immediately() {
    let pool = test_pool().await;
    let email = "signup_flow@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    let (_, token) = register_user(&app, "Signup Flow", email, "Password123!").await;

    // The token returned by signup must authenticate the very next request.
    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], email);
    // Credential material must never serialize.
    assert!(body.get("password_hash").is_none());
    assert!(body.get("avatar").is_none());

    cleanup_user(&pool, email).await;
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_logout_invalidates_exactly_one_token() {
    let pool = test_pool().await;
    let email = "logout_flow@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    let (_, signup_token) = register_user(&app, "Logout Flow", email, "Password123!").await;
    let token_a = login_user(&app, email, "Password123!").await;
    let token_b = login_user(&app, email, "Password123!").await;

    // Log out with token A.
    let req = test::TestRequest::post()
        .uri("/users/logout")
        .insert_header(bearer(&token_a))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    // Token A is dead, token B and the signup token still work.
    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&token_a))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(bearer(&token_b))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    // Logout-all kills every remaining session.
    let req = test::TestRequest::post()
        .uri("/users/logoutAll")
        .insert_header(bearer(&token_b))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    for token in [&signup_token, &token_b] {
        let req = test::TestRequest::get()
            .uri("/users/me")
            .insert_header(bearer(token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    cleanup_user(&pool, email).await;
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_duplicate_email_rejected() {
    let pool = test_pool().await;
    let email = "duplicate@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    register_user(&app, "First", email, "Password123!").await;

    let req = test::TestRequest::post()
        .uri("/users/signup")
        .set_json(json!({
            "name": "Second",
            "email": email,
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    cleanup_user(&pool, email).await;
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_invalid_signup_inputs() {
    let pool = test_pool().await;
    let app = test_app!(pool);

    let test_cases = vec![
        (
            json!({ "email": "no_name@example.com", "password": "Password123!" }),
            "missing name",
        ),
        (
            json!({ "name": "No Email", "password": "Password123!" }),
            "missing email",
        ),
        (
            json!({ "name": "Bad Email", "email": "not-an-email", "password": "Password123!" }),
            "invalid email format",
        ),
        (
            json!({ "name": "Short Pw", "email": "short_pw@example.com", "password": "123" }),
            "password too short",
        ),
        (
            json!({ "name": "Negative", "email": "negative_age@example.com", "password": "Password123!", "age": -3 }),
            "negative age",
        ),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/users/signup")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::BAD_REQUEST,
            "Test case failed: {}",
            description
        );
    }
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_login_failures_are_opaque() {
    let pool = test_pool().await;
    let email = "opaque_login@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    register_user(&app, "Opaque Login", email, "Password123!").await;

    // Wrong password and unknown email must be indistinguishable: same
    // status, same (empty) body.
    let cases = vec![
        json!({ "email": email, "password": "WrongPassword!" }),
        json!({ "email": "ghost@example.com", "password": "Password123!" }),
    ];

    for payload in cases {
        let req = test::TestRequest::post()
            .uri("/users/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let body = test::read_body(resp).await;
        assert!(body.is_empty(), "login failure body must be empty");
    }

    cleanup_user(&pool, email).await;
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_protected_routes_require_token() {
    let pool = test_pool().await;
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri("/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/users/logout")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}
