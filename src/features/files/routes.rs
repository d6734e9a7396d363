use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::files::handlers::file_handler;
use crate::modules::storage::LocalStore;

/// Create routes for stored file retrieval (all require authentication)
pub fn routes(store: Arc<LocalStore>) -> Router {
    Router::new()
        .route("/api/files", get(file_handler::get_upload))
        .route(
            "/api/files/profile-picture",
            get(file_handler::get_profile_picture),
        )
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    fn server(dir: &tempfile::TempDir) -> TestServer {
        let config = StorageConfig {
            uploads_dir: dir.path().join("uploads"),
            profile_pictures_dir: dir.path().join("profilePictures"),
        };
        let store = Arc::new(LocalStore::new(&config).unwrap());
        TestServer::new(routes(store)).unwrap()
    }

    #[tokio::test]
    async fn serves_a_stored_upload() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir);
        std::fs::write(dir.path().join("uploads/pic.png"), b"png-bytes").unwrap();

        let response = server
            .get("/api/files")
            .add_query_param("filename", "pic.png")
            .await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), &b"png-bytes"[..]);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn traversal_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir);
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let response = server
            .get("/api/files")
            .add_query_param("filename", "../secret.txt")
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir);

        let response = server
            .get("/api/files/profile-picture")
            .add_query_param("filename", "ghost.png")
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
