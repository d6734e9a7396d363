use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::AuthenticatedUser;
use crate::features::comments::dtos::{CommentResponseDto, CreateCommentDto};
use crate::features::comments::models::Comment;
use crate::shared::constants::COMMENT_DELETE_WINDOW_SECS;

/// Service for comment operations
pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every comment
    pub async fn list(&self) -> Result<Vec<CommentResponseDto>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(comments.into_iter().map(|c| c.into()).collect())
    }

    /// Create a comment on an existing post
    pub async fn create(
        &self,
        author: &AuthenticatedUser,
        dto: CreateCommentDto,
    ) -> Result<CommentResponseDto> {
        let post_exists =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE id = $1")
                .bind(dto.post_id)
                .fetch_optional(&self.pool)
                .await?
                .is_some();
        if !post_exists {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, post_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&dto.content)
        .bind(dto.post_id)
        .bind(author.id)
        .fetch_one(&self.pool)
        .await?;

        info!("Comment {} added to post {}", comment.id, comment.post_id);
        Ok(comment.into())
    }

    /// Delete a comment.
    ///
    /// Non-admin authors may only delete their own comment within the
    /// 60-second window after posting; admins delete any comment at any
    /// time. The delete itself is idempotent.
    pub async fn delete(&self, requester: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        check_delete_permission(requester, &comment, Utc::now())?;

        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!("Comment to delete not found: {}", id);
        }
        Ok(())
    }
}

/// The time-boxed delete policy: admins always; the owning author only
/// within the window; everyone else never.
fn check_delete_permission(
    requester: &AuthenticatedUser,
    comment: &Comment,
    now: DateTime<Utc>,
) -> Result<()> {
    if requester.role.is_admin() {
        return Ok(());
    }

    if comment.user_id != requester.id {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this comment".to_string(),
        ));
    }

    let age = now.signed_duration_since(comment.created_at);
    if age.num_seconds() > COMMENT_DELETE_WINDOW_SECS {
        return Err(AppError::Forbidden(format!(
            "Comments can no longer be deleted {} seconds after posting",
            COMMENT_DELETE_WINDOW_SECS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::Role;
    use crate::shared::test_helpers::create_test_user;
    use chrono::Duration;

    fn comment_by(user_id: Uuid, created_at: DateTime<Utc>) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            content: "hello".to_string(),
            post_id: Uuid::new_v4(),
            user_id,
            created_at,
        }
    }

    #[test]
    fn author_deletes_within_window() {
        let author = create_test_user("anna", Role::Student);
        let created = Utc::now();
        let comment = comment_by(author.id, created);

        let at = created + Duration::seconds(30);
        assert!(check_delete_permission(&author, &comment, at).is_ok());
    }

    #[test]
    fn stranger_is_rejected_even_within_window() {
        let author = create_test_user("anna", Role::Student);
        let stranger = create_test_user("bela", Role::Student);
        let created = Utc::now();
        let comment = comment_by(author.id, created);

        let at = created + Duration::seconds(30);
        assert!(matches!(
            check_delete_permission(&stranger, &comment, at),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn author_is_rejected_after_window() {
        let author = create_test_user("anna", Role::Student);
        let created = Utc::now();
        let comment = comment_by(author.id, created);

        let at = created + Duration::seconds(61);
        assert!(matches!(
            check_delete_permission(&author, &comment, at),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let author = create_test_user("anna", Role::Student);
        let created = Utc::now();
        let comment = comment_by(author.id, created);

        let at = created + Duration::seconds(COMMENT_DELETE_WINDOW_SECS);
        assert!(check_delete_permission(&author, &comment, at).is_ok());
    }

    #[test]
    fn admin_deletes_any_comment_any_time() {
        let author = create_test_user("anna", Role::Student);
        let admin = create_test_user("root", Role::Admin);
        let created = Utc::now();
        let comment = comment_by(author.id, created);

        let at = created + Duration::days(30);
        assert!(check_delete_permission(&admin, &comment, at).is_ok());
    }

    #[test]
    fn teacher_has_no_moderation_shortcut() {
        let author = create_test_user("anna", Role::Student);
        let teacher = create_test_user("prof", Role::Teacher);
        let created = Utc::now();
        let comment = comment_by(author.id, created);

        let at = created + Duration::seconds(10);
        assert!(matches!(
            check_delete_permission(&teacher, &comment, at),
            Err(AppError::Forbidden(_))
        ));
    }
}
