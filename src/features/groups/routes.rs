use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::features::groups::handlers::group_handler;
use crate::features::groups::services::GroupService;

/// Create routes for the groups feature (all require authentication)
pub fn routes(service: Arc<GroupService>) -> Router {
    Router::new()
        .route("/api/groups/all", get(group_handler::list_groups))
        .route("/api/groups/ofUser", get(group_handler::groups_of_user))
        .route("/api/groups/create", post(group_handler::create_group))
        .route("/api/groups", delete(group_handler::delete_group))
        .route(
            "/api/groups/users-to-group",
            post(group_handler::add_users_to_group),
        )
        .route(
            "/api/groups/users-from-group",
            delete(group_handler::remove_user_from_group),
        )
        .with_state(service)
}
