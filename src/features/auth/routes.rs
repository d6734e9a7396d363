use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::auth::handlers::auth_handler;
use crate::features::auth::services::AuthService;

/// Public auth routes (no session required)
pub fn public_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/signup", post(auth_handler::signup))
        .route("/api/auth/login", post(auth_handler::login))
        .route("/api/auth/google", get(auth_handler::google_login))
        .route(
            "/api/auth/google/callback",
            get(auth_handler::google_callback),
        )
        .with_state(service)
}

/// Protected auth routes (require a valid session)
pub fn protected_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/me", get(auth_handler::get_me))
        .route("/api/auth/logout", post(auth_handler::logout))
        .route(
            "/api/auth/change-username",
            post(auth_handler::change_username),
        )
        .route(
            "/api/auth/change-password",
            post(auth_handler::change_password),
        )
        .with_state(service)
}
