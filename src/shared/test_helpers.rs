#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
use crate::features::auth::models::AuthenticatedUser;
#[cfg(test)]
use crate::features::users::models::Role;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
pub fn create_test_user(username: &str, role: Role) -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{}@example.com", username.replace(' ', ".")),
        role,
        password_set: true,
        profile_picture: None,
    }
}

#[cfg(test)]
pub fn create_admin_user() -> AuthenticatedUser {
    create_test_user("admin", Role::Admin)
}

#[cfg(test)]
async fn inject_admin_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_admin_user());
    next.run(request).await
}

#[cfg(test)]
#[allow(dead_code)]
pub fn with_admin_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_admin_middleware))
}
