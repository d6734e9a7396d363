use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::posts::models::Visibility;
use crate::modules::storage::FileDescriptor;

/// A post in the resolved feed, with author display names attached
#[derive(Debug, Serialize, ToSchema)]
pub struct PostFeedDto {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub labels: Option<String>,
    pub user_id: Uuid,
    /// Display name of the authoring user
    pub author: String,
    pub video_link: Option<String>,
    pub files: Option<Vec<FileDescriptor>>,
    pub teachers_only: bool,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<CommentFeedDto>,
}

/// A comment in the resolved feed
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentFeedDto {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    /// Display name of the authoring user
    pub author: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FeedQuery {
    /// Username of the requesting user
    pub username: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeletePostQuery {
    pub id: Uuid,
}

/// Multipart form for post creation (Swagger documentation only; the
/// handler uses axum's Multipart extractor directly).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreatePostDto {
    pub title: String,
    pub content: String,
    /// PUBLIC (default) or PRIVATE
    pub visibility: Option<String>,
    pub labels: Option<String>,
    /// Sent as `videoLink`
    pub video_link: Option<String>,
    /// Sent as `teachersOnly`; "true" restricts the post to teachers and admins
    pub teachers_only: Option<String>,
    /// Sent as `groupIds`: comma-separated group ids a PRIVATE post is shared with
    pub group_ids: Option<String>,
    /// Attachments (any field carrying a filename)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: Option<String>,
}

/// An attachment parsed out of the multipart request, validated but not yet
/// stored
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub filename: String,
    pub mimetype: String,
    pub data: Vec<u8>,
}

/// Validated input for post creation
#[derive(Debug)]
pub struct NewPostInput {
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub labels: Option<String>,
    pub video_link: Option<String>,
    pub teachers_only: bool,
    pub group_ids: Vec<Uuid>,
    pub attachments: Vec<NewAttachment>,
}

/// MIME types accepted for non-image attachments (.doc/.docx/.xls/.xlsx)
pub const ALLOWED_DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Extension fallback for clients that upload documents with a generic MIME
/// type
pub const ALLOWED_DOCUMENT_EXTENSIONS: &[&str] = &["doc", "docx", "xls", "xlsx"];

/// Attachment allow-list: any image, plus office documents by MIME type or
/// extension
pub fn is_attachment_allowed(mimetype: &str, filename: &str) -> bool {
    if mimetype.starts_with("image/") {
        return true;
    }
    if ALLOWED_DOCUMENT_MIME_TYPES.contains(&mimetype) {
        return true;
    }

    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_DOCUMENT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_are_allowed() {
        assert!(is_attachment_allowed("image/png", "photo.png"));
        assert!(is_attachment_allowed("image/webp", "whatever"));
    }

    #[test]
    fn office_documents_are_allowed_by_mime_type() {
        assert!(is_attachment_allowed("application/msword", "report"));
        assert!(is_attachment_allowed(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "sheet"
        ));
    }

    #[test]
    fn office_documents_are_allowed_by_extension_fallback() {
        assert!(is_attachment_allowed("application/octet-stream", "report.docx"));
        assert!(is_attachment_allowed("application/octet-stream", "table.XLS"));
    }

    #[test]
    fn other_types_are_rejected() {
        assert!(!is_attachment_allowed("application/pdf", "file.pdf"));
        assert!(!is_attachment_allowed("text/html", "page.html"));
        assert!(!is_attachment_allowed("application/octet-stream", "binary.exe"));
        assert!(!is_attachment_allowed("application/octet-stream", "noext"));
    }
}
