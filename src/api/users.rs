use axum::{extract::State, routing::get, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::user::{normalize_email, ProfileUpdate, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(me).patch(update_me))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn update_me(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let updated = apply_update(
        &state,
        &user,
        repositories::users::UpdateUser {
            fullname: payload.fullname.map(|name| name.trim().to_string()),
            email: payload.email,
            role: None,
            class_name: None,
            profile_image: payload.profile_image,
        },
    )
    .await?;

    Ok(Json(UserResponse::from_db(updated)))
}

/// Normalises a changed email and refuses one already held by someone else.
pub(crate) async fn apply_update(
    state: &AppState,
    user: &User,
    mut params: repositories::users::UpdateUser,
) -> Result<User, ApiError> {
    if let Some(email) = params.email.take() {
        let email = normalize_email(&email);
        let taken = repositories::users::email_taken(state.db(), &email, Some(&user.id))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
        if taken {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        params.email = Some(email);
    }

    repositories::users::update(state.db(), &user.id, params)
        .await
        .map_err(|e| ApiError::from_write(e, "Email already registered", "Failed to update user"))
}
