use sqlx::types::Json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::AuthenticatedUser;
use crate::features::users::dtos::{GroupMemberDto, UserResponseDto};
use crate::features::users::models::User;
use crate::modules::storage::{FileDescriptor, LocalStore, StorageKind};

/// Service for user lookup and profile picture management
pub struct UserService {
    pool: PgPool,
    store: Arc<LocalStore>,
}

impl UserService {
    pub fn new(pool: PgPool, store: Arc<LocalStore>) -> Self {
        Self { pool, store }
    }

    /// Look up a user by exact, case-sensitive username
    pub async fn get_by_username(&self, username: &str) -> Result<UserResponseDto> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        user.map(UserResponseDto::from)
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))
    }

    /// List the members of a group
    pub async fn users_of_group(&self, group_id: Uuid) -> Result<Vec<GroupMemberDto>> {
        let group_exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM groups_nexus WHERE id = $1")
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !group_exists {
            return Err(AppError::NotFound("Group not found".to_string()));
        }

        let members = sqlx::query_as::<_, GroupMemberDto>(
            r#"
            SELECT users.id, users.username, users.role FROM user_groups
            JOIN users ON user_groups.user_id = users.id
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Store a new profile picture for the authenticated user and replace the
    /// previous one. The old file is removed only after the database update
    /// succeeds; a freshly stored file is cleaned up if the update fails.
    pub async fn upload_profile_picture(
        &self,
        user: &AuthenticatedUser,
        original_filename: &str,
        mimetype: &str,
        data: &[u8],
    ) -> Result<FileDescriptor> {
        let previous = self.current_picture(user.id).await?;

        let descriptor = self
            .store
            .save(StorageKind::ProfilePictures, original_filename, mimetype, data)
            .await?;

        let updated = sqlx::query("UPDATE users SET profile_picture = $1 WHERE id = $2")
            .bind(Json(&descriptor))
            .bind(user.id)
            .execute(&self.pool)
            .await;

        if let Err(e) = updated {
            self.store
                .remove(StorageKind::ProfilePictures, &descriptor.filename)
                .await;
            return Err(AppError::Database(e));
        }

        if let Some(old) = previous {
            self.store
                .remove(StorageKind::ProfilePictures, &old.filename)
                .await;
        }

        info!("Profile picture updated for user {}", user.username);
        Ok(descriptor)
    }

    /// Clear the authenticated user's profile picture
    pub async fn remove_profile_picture(&self, user: &AuthenticatedUser) -> Result<()> {
        let previous = self.current_picture(user.id).await?;

        sqlx::query("UPDATE users SET profile_picture = NULL WHERE id = $1")
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        if let Some(old) = previous {
            self.store
                .remove(StorageKind::ProfilePictures, &old.filename)
                .await;
        }

        info!("Profile picture removed for user {}", user.username);
        Ok(())
    }

    async fn current_picture(&self, user_id: Uuid) -> Result<Option<FileDescriptor>> {
        let picture = sqlx::query_scalar::<_, Option<Json<FileDescriptor>>>(
            "SELECT profile_picture FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        Ok(picture.map(|p| p.0))
    }
}
