use serde::{Deserialize, Serialize};

use crate::schemas::user::UserResponse;

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) user: UserResponse,
}

impl TokenResponse {
    pub(crate) fn bearer(access_token: String, user: UserResponse) -> Self {
        Self { access_token, token_type: "bearer".to_string(), user }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForgotPasswordRequest {
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResetPasswordRequest {
    pub(crate) password: String,
    #[serde(alias = "confirmPassword")]
    pub(crate) confirm_password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResetTokenStatus {
    pub(crate) valid: bool,
}
