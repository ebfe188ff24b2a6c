use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;

const BAD_CREDENTIALS: &str = "Invalid authentication credentials";

/// Any approved account holding a valid bearer token.
pub(crate) struct CurrentUser(pub(crate) User);

fn bearer(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim()).filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer(parts).ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;
        let claims = security::verify_token(token, state.settings())
            .map_err(|_| ApiError::Unauthorized(BAD_CREDENTIALS))?;

        let user = repositories::users::find_by_id(state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?
            .ok_or(ApiError::Unauthorized("User not found"))?;

        if !user.is_approved() {
            return Err(ApiError::Forbidden("Account is awaiting approval"));
        }
        Ok(Self(user))
    }
}

/// Declares an extractor that admits only users of one role.
macro_rules! role_guard {
    ($name:ident, $role:expr, $denied:literal) => {
        pub(crate) struct $name(pub(crate) User);

        #[async_trait]
        impl FromRequestParts<AppState> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, ApiError> {
                let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
                if user.role != $role {
                    return Err(ApiError::Forbidden($denied));
                }
                Ok(Self(user))
            }
        }
    };
}

role_guard!(CurrentStudent, UserRole::Student, "Student access required");
role_guard!(CurrentTeacher, UserRole::Teacher, "Teacher access required");
role_guard!(CurrentAdmin, UserRole::Admin, "Admin access required");

#[cfg(test)]
mod tests {
    use super::bearer;
    use axum::http::Request;

    fn parts(authorization: &str) -> axum::http::request::Parts {
        let request = Request::builder().header("authorization", authorization).body(());
        request.expect("request").into_parts().0
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer(&parts("Bearer abc")), Some("abc"));
        assert_eq!(bearer(&parts("bearer abc")), Some("abc"));
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        assert_eq!(bearer(&parts("Basic abc")), None);
        assert_eq!(bearer(&parts("Bearer  ")), None);
        assert_eq!(bearer(&parts("abc")), None);
    }
}
