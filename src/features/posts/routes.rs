use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::features::posts::handlers::post_handler;
use crate::features::posts::services::PostService;
use crate::shared::constants::MAX_TOTAL_UPLOAD_BYTES;

/// Create routes for the posts feature (all require authentication)
pub fn routes(service: Arc<PostService>) -> Router {
    Router::new()
        .route(
            "/api/posts",
            get(post_handler::get_posts)
                .post(post_handler::create_post)
                .delete(post_handler::delete_post),
        )
        // Attachments may total 100 MB; leave headroom for the form fields
        .layer(DefaultBodyLimit::max(MAX_TOTAL_UPLOAD_BYTES + 1024 * 1024))
        .with_state(service)
}
