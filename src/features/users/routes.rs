use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::features::users::handlers::user_handler;
use crate::features::users::services::UserService;
use crate::shared::constants::MAX_TOTAL_UPLOAD_BYTES;

/// Create routes for the users feature (all require authentication)
pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users", get(user_handler::get_user))
        .route("/api/users/ofGroup", get(user_handler::users_of_group))
        .route(
            "/api/users/upload-profile-picture",
            post(user_handler::upload_profile_picture)
                .layer(DefaultBodyLimit::max(MAX_TOTAL_UPLOAD_BYTES + 1024 * 1024)),
        )
        .route(
            "/api/users/remove-profile-picture",
            delete(user_handler::remove_profile_picture),
        )
        .with_state(service)
}
