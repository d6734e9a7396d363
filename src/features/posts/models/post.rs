use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::comments::models::Comment;
use crate::modules::storage::FileDescriptor;

/// PUBLIC posts are visible to everyone; PRIVATE posts only to members of
/// the associated groups (and elevated roles).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default,
)]
#[sqlx(type_name = "post_visibility", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Database model for a post
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub labels: Option<String>,
    pub user_id: Uuid,
    pub video_link: Option<String>,
    pub files: Option<Json<Vec<FileDescriptor>>>,
    pub teachers_only: bool,
    pub created_at: DateTime<Utc>,
}

/// A post with its comments, ordered oldest first. A post without comments
/// carries a genuinely empty list; the query layer never produces
/// placeholder rows.
#[derive(Debug, Clone)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<Comment>,
}
