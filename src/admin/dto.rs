use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{dto::email_format, repo_types::Admin};

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub admin: Admin,
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RejectRecruiterRequest {
    #[validate(length(min = 1, max = 1000, message = "must be 1 to 1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAdminRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
    #[validate(custom(function = "email_format"))]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_super: bool,
}

#[derive(Debug, Serialize)]
pub struct RecruiterPage<T> {
    pub recruiters: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
