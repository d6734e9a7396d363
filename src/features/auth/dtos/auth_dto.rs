use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::auth::models::AuthenticatedUser;
use crate::features::users::models::Role;
use crate::modules::storage::FileDescriptor;

/// Request DTO for signup
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupDto {
    #[validate(
        length(min = 1, max = 64, message = "Username must be 1-64 characters"),
        regex(
            path = "*crate::shared::validation::USERNAME_REGEX",
            message = "Username must start with a letter or underscore"
        )
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: Role,
}

/// Request DTO for login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response DTO for a successful login
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponseDto {
    /// Opaque session token, also set as an HttpOnly cookie
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: MeResponseDto,
}

/// Current session's user summary
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponseDto {
    pub username: String,
    pub role: Role,
    pub profile_picture: Option<FileDescriptor>,
    /// False for externally-authenticated accounts
    pub password_change_allowed: bool,
}

impl From<AuthenticatedUser> for MeResponseDto {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            username: user.username,
            role: user.role,
            profile_picture: user.profile_picture,
            password_change_allowed: user.password_set,
        }
    }
}

/// Request DTO for username change
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUsernameDto {
    #[validate(length(min = 1, message = "Old username is required"))]
    pub old_username: String,

    #[validate(length(min = 1, message = "New username is required"))]
    pub new_username: String,
}

/// Request DTO for password change
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,

    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GoogleLoginQuery {
    /// Requested role for a first-time Google sign-in; TEACHER is honored,
    /// anything else falls back to STUDENT
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GoogleCallbackQuery {
    pub code: String,
    pub state: String,
}
