use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::features::comments::handlers::comment_handler;
use crate::features::comments::services::CommentService;

/// Create routes for the comments feature (all require authentication)
pub fn routes(service: Arc<CommentService>) -> Router {
    Router::new()
        .route(
            "/api/comments",
            get(comment_handler::list_comments).post(comment_handler::create_comment),
        )
        .route(
            "/api/comments/{id}",
            delete(comment_handler::delete_comment),
        )
        .with_state(service)
}
