use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use crate::api::auth::{create_account, hash, issue_reset_link};
use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::users::apply_update;
use crate::api::validation::MIN_PASSWORD_LEN;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;
use crate::schemas::user::{
    normalize_email, AdminUserUpdate, UserImportReport, UserImportRequest, UserImportRow,
    UserListQuery, UserResponse,
};
use crate::schemas::MessageResponse;
use crate::services::analytics::PlatformStats;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/teachers/pending", get(pending_teachers))
        .route("/teachers/:user_id/approve", post(approve_teacher))
        .route("/teachers/:user_id", delete(decline_teacher))
        .route("/users", get(list_users))
        .route("/users/import", post(import_users))
        .route("/users/:user_id", patch(update_user).delete(delete_user))
        .route("/users/:user_id/reset-password", post(reset_user_password))
        .route("/stats", get(stats))
}

async fn find_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::not_found("User"))
}

async fn pending_teachers(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list(
        state.db(),
        Some(UserRole::Teacher),
        Some(AccountStatus::Pending),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list teachers"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn approve_teacher(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let teacher = repositories::users::approve_teacher(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to approve teacher"))?
        .ok_or_else(|| ApiError::not_found("Pending teacher"))?;

    tracing::info!(teacher_id = %teacher.id, admin_id = %admin.id, "teacher approved");
    Ok(Json(UserResponse::from_db(teacher)))
}

async fn decline_teacher(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::users::delete_pending_teacher(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to decline teacher"))?;
    if !deleted {
        return Err(ApiError::not_found("Pending teacher"));
    }

    tracing::info!(teacher_id = %user_id, admin_id = %admin.id, "teacher declined");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(
    Query(params): Query<UserListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list(state.db(), params.role, params.status)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    let user = find_user(&state, &user_id).await?;

    // Exams stay reachable only through a teacher account.
    let leaves_teaching = user.role == UserRole::Teacher
        && payload.role.is_some_and(|role| role != UserRole::Teacher);
    if leaves_teaching {
        let owns_exams = repositories::exams::owns_any(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check exam ownership"))?;
        if owns_exams {
            return Err(ApiError::Conflict(
                "Teacher still owns exams; delete them before changing the role".to_string(),
            ));
        }
    }

    let updated = apply_update(
        &state,
        &user,
        repositories::users::UpdateUser {
            fullname: payload.fullname.map(|name| name.trim().to_string()),
            email: payload.email,
            role: payload.role,
            class_name: payload.class_name.map(|class| class.trim().to_string()),
            profile_image: None,
        },
    )
    .await?;

    Ok(Json(UserResponse::from_db(updated)))
}

async fn delete_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::BadRequest("You cannot delete your own account".to_string()));
    }

    let deleted = repositories::users::delete(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;
    if !deleted {
        return Err(ApiError::not_found("User"));
    }

    tracing::info!(user_id = %user_id, admin_id = %admin.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Rows without a usable email or password, students without a class, and
/// emails already registered are skipped and reported back.
fn importable(row: &UserImportRow) -> bool {
    let email = row.email.trim().to_string();
    let class_ok = row.role != UserRole::Student
        || row.class_name.as_deref().is_some_and(|class| !class.trim().is_empty());

    !row.fullname.trim().is_empty()
        && email.validate_email()
        && row.password.chars().count() >= MIN_PASSWORD_LEN
        && class_ok
}

async fn import_users(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<UserImportRequest>,
) -> Result<(StatusCode, Json<UserImportReport>), ApiError> {
    let mut report = UserImportReport::default();

    for row in &payload.users {
        let email = normalize_email(&row.email);
        if !importable(row) {
            report.skipped.push(email);
            continue;
        }

        let created = create_account(
            &state,
            repositories::users::CreateUser {
                id: &Uuid::new_v4().to_string(),
                fullname: row.fullname.trim(),
                email: &email,
                hashed_password: hash(&row.password)?,
                role: row.role,
                status: AccountStatus::Approved,
                class_name: row.class_name.as_deref().map(str::trim),
                gender: row.gender.as_deref(),
                created_at: state.now(),
            },
        )
        .await;

        match created {
            Ok(_) => report.created.push(email),
            Err(ApiError::Conflict(_)) => report.skipped.push(email),
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        admin_id = %admin.id,
        created = report.created.len(),
        skipped = report.skipped.len(),
        "users imported"
    );
    Ok((StatusCode::CREATED, Json(report)))
}

async fn reset_user_password(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = find_user(&state, &user_id).await?;
    issue_reset_link(&state, &user).await?;

    tracing::info!(user_id = %user.id, admin_id = %admin.id, "password reset issued by admin");
    Ok(Json(MessageResponse::new(format!("Password reset link sent to {}", user.email))))
}

async fn stats(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<PlatformStats>, ApiError> {
    let by_role = repositories::users::count_by_role(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;
    let total_exams = repositories::exams::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;
    let total_submissions = repositories::submissions::count_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count submissions"))?;
    let average_score = repositories::submissions::average_score(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to average scores"))?;

    let count_of = |role: UserRole| {
        by_role.iter().find(|(r, _)| *r == role).map(|(_, count)| *count).unwrap_or(0)
    };

    Ok(Json(PlatformStats {
        total_users: by_role.iter().map(|(_, count)| count).sum(),
        total_teachers: count_of(UserRole::Teacher),
        total_students: count_of(UserRole::Student),
        total_exams,
        total_submissions,
        average_score: average_score.unwrap_or(0.0),
    }))
}

#[cfg(test)]
mod tests;
