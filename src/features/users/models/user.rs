use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::modules::storage::FileDescriptor;

/// Closed role enumeration; authorization decisions go through the
/// capability methods below instead of ad-hoc comparisons at call sites.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default,
)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// Elevated roles bypass visibility and group filtering entirely when
    /// reading the feed.
    pub fn sees_all_posts(&self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }

    /// teachers_only groups and posts are restricted to these roles.
    pub fn satisfies_teachers_only(&self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }

    /// Admins moderate freely: delete any post or comment at any time.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Database model for a user account.
///
/// `password` holds a bcrypt hash; NULL marks an externally-authenticated
/// (Google) account, which can never log in locally or change a password.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Role,
    pub profile_picture: Option<Json<FileDescriptor>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevated_roles_bypass_visibility() {
        assert!(Role::Teacher.sees_all_posts());
        assert!(Role::Admin.sees_all_posts());
        assert!(!Role::Student.sees_all_posts());
    }

    #[test]
    fn teachers_only_gate() {
        assert!(Role::Teacher.satisfies_teachers_only());
        assert!(Role::Admin.satisfies_teachers_only());
        assert!(!Role::Student.satisfies_teachers_only());
    }

    #[test]
    fn only_admin_moderates() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Teacher.is_admin());
        assert!(!Role::Student.is_admin());
    }
}
