use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a group (table `groups_nexus`; `groups` collides with
/// a reserved word)
#[derive(Debug, Clone, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub teachers_only: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
