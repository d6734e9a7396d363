use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::AuthenticatedUser;
use crate::features::groups::dtos::{AddUsersToGroupDto, CreateGroupDto, GroupResponseDto};
use crate::features::groups::models::Group;
use crate::features::users::models::User;

/// Service for group management and membership
pub struct GroupService {
    pool: PgPool,
}

impl GroupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every group
    pub async fn list_all(&self) -> Result<Vec<GroupResponseDto>> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, name, description, teachers_only, created_by, created_at
            FROM groups_nexus
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups.into_iter().map(|g| g.into()).collect())
    }

    /// List the groups a user belongs to
    pub async fn groups_of_user(&self, username: &str) -> Result<Vec<GroupResponseDto>> {
        let user = self.get_user_by_name(username).await?.ok_or_else(|| {
            AppError::NotFound(format!("User '{}' not found", username))
        })?;

        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT g.id, g.name, g.description, g.teachers_only, g.created_by, g.created_at
            FROM user_groups ug
            JOIN groups_nexus g ON ug.group_id = g.id
            WHERE ug.user_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups.into_iter().map(|g| g.into()).collect())
    }

    /// Create a group. Creating a teachers-only group requires an elevated
    /// role; names are unique.
    pub async fn create(
        &self,
        creator: &AuthenticatedUser,
        dto: CreateGroupDto,
    ) -> Result<GroupResponseDto> {
        let name = dto.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(
                "The group name is required".to_string(),
            ));
        }

        if dto.teachers_only && !creator.role.satisfies_teachers_only() {
            return Err(AppError::Forbidden(
                "Only teachers can create teachers-only groups".to_string(),
            ));
        }

        let existing = sqlx::query_as::<_, Group>("SELECT * FROM groups_nexus WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "The group name '{}' is already taken",
                name
            )));
        }

        let description = dto.description.as_deref().unwrap_or("").trim().to_string();

        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups_nexus (name, description, teachers_only, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(&description)
        .bind(dto.teachers_only)
        .bind(creator.id)
        .fetch_one(&self.pool)
        .await?;

        info!("Group created: {}", group.name);
        Ok(group.into())
    }

    /// Delete a group. Deleting a missing group logs a warning and still
    /// succeeds (idempotent).
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM groups_nexus WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!("Group to delete not found: {}", id);
        }
        Ok(())
    }

    /// Add users (by username) to a group.
    ///
    /// Teachers-only groups accept only TEACHER/ADMIN members; this is the
    /// single enforcement point for membership-side gating.
    pub async fn add_users(&self, dto: AddUsersToGroupDto) -> Result<()> {
        let group = self
            .get_group_by_name(&dto.group_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Group '{}' not found", dto.group_name))
            })?;

        let mut members = Vec::with_capacity(dto.users_to_add.len());
        for username in &dto.users_to_add {
            let user = self.get_user_by_name(username).await?.ok_or_else(|| {
                AppError::NotFound(format!("User '{}' not found", username))
            })?;

            if group.teachers_only && !user.role.satisfies_teachers_only() {
                return Err(AppError::Forbidden(format!(
                    "'{}' cannot join the teachers-only group '{}'",
                    user.username, group.name
                )));
            }

            members.push(user.id);
        }

        for user_id in members {
            sqlx::query(
                r#"
                INSERT INTO user_groups (user_id, group_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(group.id)
            .execute(&self.pool)
            .await?;
        }

        info!(
            "Added {} user(s) to group {}",
            dto.users_to_add.len(),
            group.name
        );
        Ok(())
    }

    /// Remove a user from a group. A membership that does not exist logs a
    /// warning and still succeeds (idempotent).
    pub async fn remove_user(&self, group_name: &str, user_id: Uuid) -> Result<()> {
        let group = self.get_group_by_name(group_name).await?.ok_or_else(|| {
            AppError::NotFound(format!("Group '{}' not found", group_name))
        })?;

        let result = sqlx::query("DELETE FROM user_groups WHERE user_id = $1 AND group_id = $2")
            .bind(user_id)
            .bind(group.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!(
                "Membership to delete not found: user {} in group {}",
                user_id, group.name
            );
        }
        Ok(())
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups_nexus WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group)
    }

    async fn get_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
