use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;
use crate::test_support;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn admin_approves_and_declines_teachers() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let token = ctx.token_for(&admin);
    let keep = test_support::insert_user(
        ctx.state.db(),
        "keep@example.com",
        "teacher-pass",
        UserRole::Teacher,
        AccountStatus::Pending,
        None,
    )
    .await;
    let drop = test_support::insert_user(
        ctx.state.db(),
        "drop@example.com",
        "teacher-pass",
        UserRole::Teacher,
        AccountStatus::Pending,
        None,
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/admin/teachers/pending",
            Some(&token),
            None,
        ))
        .await
        .expect("pending");
    let pending = test_support::read_json(response).await;
    assert_eq!(pending.as_array().map(Vec::len), Some(2));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/admin/teachers/{}/approve", keep.id),
            Some(&token),
            None,
        ))
        .await
        .expect("approve");
    let approved = test_support::read_json(response).await;
    assert_eq!(approved["status"], "approved");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/admin/teachers/{}", drop.id),
            Some(&token),
            None,
        ))
        .await
        .expect("decline");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let gone = repositories::users::find_by_id(ctx.state.db(), &drop.id).await.expect("find");
    assert!(gone.is_none());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/admin/teachers/{}", keep.id),
            Some(&token),
            None,
        ))
        .await
        .expect("decline approved");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn admin_routes_reject_other_roles() {
    let ctx = test_support::setup_test_context().await;
    let teacher = test_support::insert_teacher(ctx.state.db(), "teach@example.com").await;
    let token = ctx.token_for(&teacher);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/admin/stats", Some(&token), None))
        .await
        .expect("stats");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn bulk_import_skips_existing_and_invalid_rows() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    test_support::insert_student(ctx.state.db(), "old@example.com", "JSS1").await;
    let token = ctx.token_for(&admin);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/admin/users/import",
            Some(&token),
            Some(json!({ "users": [
                { "fullname": "New Kid", "email": "New@Example.com", "password": "long-enough",
                  "role": "student", "class": "JSS1" },
                { "fullname": "Old Kid", "email": "old@example.com", "password": "long-enough",
                  "role": "student", "class": "JSS1" },
                { "fullname": "No Class", "email": "noclass@example.com",
                  "password": "long-enough", "role": "student" },
                { "fullname": "New Teacher", "email": "t@example.com", "password": "long-enough",
                  "role": "teacher" }
            ]})),
        ))
        .await
        .expect("import");
    let status = response.status();
    let report = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {report}");
    assert_eq!(report["created"], json!(["new@example.com", "t@example.com"]));
    assert_eq!(report["skipped"], json!(["old@example.com", "noclass@example.com"]));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/admin/users?role=teacher&status=approved",
            Some(&token),
            None,
        ))
        .await
        .expect("list");
    let users = test_support::read_json(response).await;
    assert_eq!(users.as_array().map(Vec::len), Some(1));
    assert_eq!(users[0]["email"], "t@example.com");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn admin_edits_resets_and_deletes_users() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = test_support::insert_student(ctx.state.db(), "kid@example.com", "JSS1").await;
    let token = ctx.token_for(&admin);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/admin/users/{}", student.id),
            Some(&token),
            Some(json!({ "class": "JSS2", "fullname": "Moved Kid" })),
        ))
        .await
        .expect("update");
    let updated = test_support::read_json(response).await;
    assert_eq!(updated["class"], "JSS2");
    assert_eq!(updated["fullname"], "Moved Kid");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/admin/users/{}/reset-password", student.id),
            Some(&token),
            None,
        ))
        .await
        .expect("reset");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.notifier.links().len(), 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/admin/users/{}", admin.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete self");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/admin/users/{}", student.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/admin/stats", Some(&token), None))
        .await
        .expect("stats");
    let stats = test_support::read_json(response).await;
    assert_eq!(stats["total_users"], 1);
    assert_eq!(stats["total_students"], 0);
    assert_eq!(stats["average_score"], 0.0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn teacher_with_exams_keeps_teacher_role() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let busy = test_support::insert_teacher(ctx.state.db(), "busy@example.com").await;
    let idle = test_support::insert_teacher(ctx.state.db(), "idle@example.com").await;
    test_support::insert_open_exam(ctx.state.db(), &busy, "SS1", false).await;
    let token = ctx.token_for(&admin);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/admin/users/{}", busy.id),
            Some(&token),
            Some(json!({ "role": "student" })),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let stored = repositories::users::find_by_id(ctx.state.db(), &busy.id)
        .await
        .expect("user")
        .expect("exists");
    assert_eq!(stored.role, UserRole::Teacher);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/admin/users/{}", busy.id),
            Some(&token),
            Some(json!({ "role": "teacher", "fullname": "Still Teaching" })),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/admin/users/{}", idle.id),
            Some(&token),
            Some(json!({ "role": "admin" })),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["role"], "admin");
}
