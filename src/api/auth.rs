use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_password_len;
use crate::core::metrics;
use crate::core::redis::RateLimit;
use crate::core::security;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;
use crate::schemas::auth::{
    ForgotPasswordRequest, ResetPasswordRequest, ResetTokenStatus, TokenResponse,
};
use crate::schemas::user::{
    normalize_email, StudentRegister, TeacherRegister, UserLogin, UserResponse,
};
use crate::schemas::MessageResponse;
use crate::services::notifier::{self, ResetNotice};
use crate::services::password_reset;

const LOGIN_LIMIT: RateLimit = RateLimit { scope: "login", max_attempts: 10, window_seconds: 60 };
const FORGOT_LIMIT: RateLimit =
    RateLimit { scope: "forgot-password", max_attempts: 5, window_seconds: 3600 };

const BAD_LOGIN: &str = "Invalid email or password, or account not approved";
const RESET_REQUESTED: &str =
    "If an account exists for that email, a password reset link has been sent";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register/student", post(register_student))
        .route("/register/teacher", post(register_teacher))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", get(validate_reset_token).post(reset_password))
}

async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<StudentRegister>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    validate_password_len(&payload.password)?;

    let email = normalize_email(&payload.email);
    let user = create_account(
        &state,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            fullname: payload.fullname.trim(),
            email: &email,
            hashed_password: hash(&payload.password)?,
            role: UserRole::Student,
            status: AccountStatus::Approved,
            class_name: Some(payload.class_name.trim()),
            gender: payload.gender.as_deref(),
            created_at: state.now(),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "student registered");
    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token, UserResponse::from_db(user)))))
}

/// Teachers start pending and cannot log in until an admin approves them.
async fn register_teacher(
    State(state): State<AppState>,
    Json(payload): Json<TeacherRegister>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    validate_password_len(&payload.password)?;

    let email = normalize_email(&payload.email);
    let user = create_account(
        &state,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            fullname: payload.fullname.trim(),
            email: &email,
            hashed_password: hash(&payload.password)?,
            role: UserRole::Teacher,
            status: AccountStatus::Pending,
            class_name: None,
            gender: payload.gender.as_deref(),
            created_at: state.now(),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "teacher registered, awaiting approval");
    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    let allowed = state.redis().allow(LOGIN_LIMIT, &email).await.unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .filter(|user| {
            user.is_approved()
                && security::verify_password(&payload.password, &user.hashed_password)
                    .unwrap_or(false)
        });
    metrics::record_login(user.is_some());
    let user = user.ok_or(ApiError::Unauthorized(BAD_LOGIN))?;

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse::bearer(token, UserResponse::from_db(user))))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

/// Answers identically whether or not the email is known.
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    let allowed = state.redis().allow(FORGOT_LIMIT, &email).await.unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many reset requests, try again later"));
    }

    let user = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    if let Some(user) = user {
        issue_reset_link(&state, &user).await?;
    }

    Ok(Json(MessageResponse::new(RESET_REQUESTED)))
}

async fn validate_reset_token(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ResetTokenStatus>, ApiError> {
    let stored = repositories::reset_tokens::find_by_hash(
        state.db(),
        &password_reset::hash_token(&token),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch reset token"))?;

    password_reset::ensure_usable(stored.map(|stored| stored.expires_at), state.now())?;
    Ok(Json(ResetTokenStatus { valid: true }))
}

async fn reset_password(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let stored =
        repositories::reset_tokens::find_by_hash(&mut *tx, &password_reset::hash_token(&token))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch reset token"))?;
    password_reset::ensure_usable(stored.as_ref().map(|stored| stored.expires_at), state.now())?;
    password_reset::check_new_password(&payload.password, &payload.confirm_password)?;

    let Some(stored) = stored else {
        return Err(password_reset::ResetError::InvalidOrExpired.into());
    };

    let hashed = hash(&payload.password)?;
    repositories::users::set_password(&mut *tx, &stored.user_id, &hashed)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update password"))?;
    repositories::reset_tokens::delete_for_user(&mut *tx, &stored.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to consume reset token"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(user_id = %stored.user_id, "password reset completed");
    Ok(Json(MessageResponse::new("Your password has been reset")))
}

/// Replaces any outstanding token of the user and hands the link to the
/// notifier. Delivery problems are logged only.
pub(crate) async fn issue_reset_link(state: &AppState, user: &User) -> Result<(), ApiError> {
    let now = state.now();
    let issued = password_reset::issue_token(now, state.settings().auth().reset_token_ttl);

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    repositories::reset_tokens::delete_for_user(&mut *tx, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to clear reset tokens"))?;
    repositories::reset_tokens::create(
        &mut *tx,
        &Uuid::new_v4().to_string(),
        &user.id,
        &issued.hash,
        issued.expires_at,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store reset token"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    if let Err(err) = repositories::reset_tokens::delete_expired(state.db(), now).await {
        tracing::warn!(error = %err, "failed to purge expired reset tokens");
    }

    let link = password_reset::reset_link(&state.settings().api().public_base_url, &issued.raw);
    notifier::deliver(
        state.notifier(),
        ResetNotice { email: &user.email, fullname: &user.fullname, link: &link },
    )
    .await;
    Ok(())
}

pub(crate) fn hash(password: &str) -> Result<String, ApiError> {
    security::hash_password(password).map_err(|e| ApiError::internal(e, "Failed to hash password"))
}

pub(crate) async fn create_account(
    state: &AppState,
    params: repositories::users::CreateUser<'_>,
) -> Result<User, ApiError> {
    let taken = repositories::users::email_taken(state.db(), params.email, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if taken {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    repositories::users::create(state.db(), params)
        .await
        .map_err(|e| ApiError::from_write(e, "Email already registered", "Failed to create user"))
}

#[cfg(test)]
mod tests;
