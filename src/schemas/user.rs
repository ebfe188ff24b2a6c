use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_offset;
use crate::db::models::User;
use crate::db::types::{AccountStatus, UserRole};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentRegister {
    #[validate(length(min = 1, message = "fullname must not be empty"))]
    pub(crate) fullname: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) gender: Option<String>,
    #[serde(alias = "class")]
    #[validate(length(min = 1, message = "class must not be empty"))]
    pub(crate) class_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TeacherRegister {
    #[validate(length(min = 1, message = "fullname must not be empty"))]
    pub(crate) fullname: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "fullname must not be empty"))]
    pub(crate) fullname: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) profile_image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminUserUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "fullname must not be empty"))]
    pub(crate) fullname: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) role: Option<UserRole>,
    #[serde(default, alias = "class")]
    pub(crate) class_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    pub(crate) role: Option<UserRole>,
    #[serde(default)]
    pub(crate) status: Option<AccountStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserImportRow {
    pub(crate) fullname: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) role: UserRole,
    #[serde(default, alias = "class")]
    pub(crate) class_name: Option<String>,
    #[serde(default)]
    pub(crate) gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserImportRequest {
    pub(crate) users: Vec<UserImportRow>,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct UserImportReport {
    pub(crate) created: Vec<String>,
    pub(crate) skipped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) fullname: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) status: AccountStatus,
    #[serde(rename = "class")]
    pub(crate) class_name: Option<String>,
    pub(crate) gender: Option<String>,
    pub(crate) profile_image: Option<String>,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
            role: user.role,
            status: user.status,
            class_name: user.class_name,
            gender: user.gender,
            profile_image: user.profile_image,
            created_at: format_offset(user.created_at),
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
