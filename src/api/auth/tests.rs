use axum::http::{Method, StatusCode};
use serde_json::json;
use time::Duration;
use tower::ServiceExt;

use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;
use crate::services::password_reset;
use crate::test_support;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn student_registration_returns_token_and_rejects_duplicate_email() {
    let ctx = test_support::setup_test_context().await;

    let payload = json!({
        "fullname": "Ada Lovelace",
        "email": "Ada@Example.com ",
        "password": "analytical",
        "class": "JSS1"
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/register/student",
            None,
            Some(payload.clone()),
        ))
        .await
        .expect("register");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "student");
    assert_eq!(body["user"]["class"], "JSS1");
    assert!(body["access_token"].as_str().is_some_and(|token| !token.is_empty()));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/register/student",
            None,
            Some(payload),
        ))
        .await
        .expect("register again");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn pending_teacher_cannot_login_until_approved() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/register/teacher",
            None,
            Some(json!({
                "fullname": "Grace Hopper",
                "email": "grace@example.com",
                "password": "compilers"
            })),
        ))
        .await
        .expect("register teacher");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["status"], "pending");

    let login = || {
        test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "grace@example.com", "password": "compilers" })),
        )
    };

    let response = ctx.app.clone().oneshot(login()).await.expect("login pending");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let teacher_id = body["id"].as_str().expect("teacher id");
    repositories::users::approve_teacher(ctx.state.db(), teacher_id)
        .await
        .expect("approve")
        .expect("pending teacher");

    let response = ctx.app.clone().oneshot(login()).await.expect("login approved");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["user"]["role"], "teacher");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn wrong_password_and_unknown_email_share_one_message() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_student(ctx.state.db(), "pupil@example.com", "JSS1").await;

    let mut details = Vec::new();
    for (email, password) in [("pupil@example.com", "wrong-pass"), ("nobody@example.com", "x")] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            ))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        details.push(test_support::read_json(response).await["detail"].clone());
    }

    assert_eq!(details[0], details[1]);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn me_requires_token() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "me@example.com", "JSS2").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", None, None))
        .await
        .expect("me without token");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = ctx.token_for(&student);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");
    let body = test_support::read_json(response).await;
    assert_eq!(body["id"], student.id.as_str());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn password_reset_flow_replaces_password_and_consumes_link() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(
        ctx.state.db(),
        "reset@example.com",
        "old-password",
        UserRole::Student,
        AccountStatus::Approved,
        Some("JSS3"),
    )
    .await;

    let forgot = |email: &str| {
        test_support::json_request(
            Method::POST,
            "/api/v1/auth/forgot-password",
            None,
            Some(json!({ "email": email })),
        )
    };

    let known = ctx.app.clone().oneshot(forgot("reset@example.com")).await.expect("forgot");
    assert_eq!(known.status(), StatusCode::OK);
    let known = test_support::read_json(known).await;
    let unknown = ctx.app.clone().oneshot(forgot("ghost@example.com")).await.expect("forgot");
    let unknown = test_support::read_json(unknown).await;
    assert_eq!(known, unknown);

    let links = ctx.notifier.links();
    assert_eq!(links.len(), 1);
    let (email, link) = &links[0];
    assert_eq!(email, "reset@example.com");
    let raw = link.rsplit('/').next().expect("token segment").to_string();
    assert!(link.starts_with("http://portal.test/reset-password/"));

    let uri = format!("/api/v1/auth/reset-password/{raw}");
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, None, None))
        .await
        .expect("check token");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            None,
            Some(json!({ "password": "brand-new-pass", "confirm_password": "different" })),
        ))
        .await
        .expect("mismatch");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            None,
            Some(json!({ "password": "brand-new-pass", "confirm_password": "brand-new-pass" })),
        ))
        .await
        .expect("reset");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "reset@example.com", "password": "brand-new-pass" })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, None, None))
        .await
        .expect("reuse token");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn expired_reset_token_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let user = test_support::insert_student(ctx.state.db(), "late@example.com", "JSS1").await;

    let issued_at = test_support::now() - Duration::hours(2);
    let issued = password_reset::issue_token(issued_at, Duration::hours(1));
    repositories::reset_tokens::create(
        ctx.state.db(),
        "expired-token",
        &user.id,
        &issued.hash,
        issued.expires_at,
        test_support::now() - Duration::hours(2),
    )
    .await
    .expect("store token");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/auth/reset-password/{}", issued.raw),
            None,
            None,
        ))
        .await
        .expect("check token");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid or expired password reset link");
}
