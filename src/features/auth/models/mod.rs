use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::users::models::{Role, User};
use crate::modules::storage::FileDescriptor;

/// The authenticated principal attached to every request by the session
/// middleware. Rebuilt from the users table on each request; never cached.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// False for externally-authenticated (Google) accounts, which have no
    /// local password and must not be offered a password change.
    pub password_set: bool,
    pub profile_picture: Option<FileDescriptor>,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            password_set: user.password.is_some(),
            profile_picture: user.profile_picture.map(|p| p.0),
        }
    }
}

/// Database model for a server-side session. The principal is the user's
/// email, re-resolved to the full user record on every request.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct Session {
    pub id: Uuid,
    pub token: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Raw session token of the current request, stored in the request
/// extensions by the auth middleware so logout can revoke it.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn user(password: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "anna".to_string(),
            email: "anna@example.com".to_string(),
            password: password.map(String::from),
            role: Role::Student,
            profile_picture: Some(Json(FileDescriptor {
                filename: "p.png".to_string(),
                path: "profilePictures/p.png".to_string(),
                size: 10,
                mimetype: "image/png".to_string(),
            })),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_set_reflects_local_account() {
        let principal = AuthenticatedUser::from(user(Some("$2b$10$hash")));
        assert!(principal.password_set);
    }

    #[test]
    fn google_account_has_no_password_change() {
        let principal = AuthenticatedUser::from(user(None));
        assert!(!principal.password_set);
        assert!(principal.profile_picture.is_some());
    }
}
