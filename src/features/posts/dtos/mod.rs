mod post_dto;

pub use post_dto::{
    is_attachment_allowed, CommentFeedDto, CreatePostDto, DeletePostQuery, FeedQuery,
    NewAttachment, NewPostInput, PostFeedDto, ALLOWED_DOCUMENT_EXTENSIONS,
    ALLOWED_DOCUMENT_MIME_TYPES,
};
