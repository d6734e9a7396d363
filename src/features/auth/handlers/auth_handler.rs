use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{AppendHeaders, Redirect},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    ChangePasswordDto, ChangeUsernameDto, GoogleCallbackQuery, GoogleLoginQuery, LoginDto,
    MeResponseDto, SessionResponseDto, SignupDto,
};
use crate::features::auth::models::{AuthenticatedUser, SessionToken};
use crate::features::auth::services::AuthService;
use crate::features::users::dtos::UserResponseDto;
use crate::shared::constants::SESSION_COOKIE;
use crate::shared::types::ApiResponse;

type SetCookie = AppendHeaders<[(header::HeaderName, String); 1]>;

fn session_cookie(token: &str, max_age_secs: u64) -> SetCookie {
    AppendHeaders([(
        header::SET_COOKIE,
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, token, max_age_secs
        ),
    )])
}

fn clear_session_cookie() -> SetCookie {
    AppendHeaders([(
        header::SET_COOKIE,
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE),
    )])
}

/// Create a local account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupDto,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error or email/username already taken")
    ),
    tag = "auth"
)]
pub async fn signup(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<SignupDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.signup(dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user),
            Some("User created".to_string()),
            None,
        )),
    ))
}

/// Log in with local credentials and establish a session
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Session established", body = ApiResponse<SessionResponseDto>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<LoginDto>,
) -> Result<(SetCookie, Json<ApiResponse<SessionResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (user, session) = service.login(dto).await?;

    let cookie = session_cookie(&session.token, service.session_ttl_secs());
    let response = SessionResponseDto {
        token: session.token,
        expires_at: session.expires_at,
        user: user.into(),
    };

    Ok((
        cookie,
        Json(ApiResponse::success(Some(response), None, None)),
    ))
}

/// Current session's user summary
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = ApiResponse<MeResponseDto>),
        (status = 401, description = "Authentication required")
    ),
    tag = "auth",
    security(("session_token" = []))
)]
pub async fn get_me(user: AuthenticatedUser) -> Result<Json<ApiResponse<MeResponseDto>>> {
    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}

/// Revoke the current session and clear the cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Authentication required")
    ),
    tag = "auth",
    security(("session_token" = []))
)]
pub async fn logout(
    State(service): State<Arc<AuthService>>,
    token: SessionToken,
) -> Result<(SetCookie, Json<ApiResponse<()>>)> {
    service.logout(&token.0).await?;

    Ok((
        clear_session_cookie(),
        Json(ApiResponse::success(
            None,
            Some("Logged out successfully".to_string()),
            None,
        )),
    ))
}

/// Change the authenticated user's username
#[utoipa::path(
    post,
    path = "/api/auth/change-username",
    request_body = ChangeUsernameDto,
    responses(
        (status = 200, description = "Username changed"),
        (status = 400, description = "Old username mismatch or no-op change"),
        (status = 409, description = "Username already taken"),
        (status = 401, description = "Authentication required")
    ),
    tag = "auth",
    security(("session_token" = []))
)]
pub async fn change_username(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<ChangeUsernameDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.change_username(&user, dto).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Username changed".to_string()),
        None,
    )))
}

/// Change the authenticated user's password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed"),
        (status = 403, description = "Invalid old password or externally-authenticated account"),
        (status = 401, description = "Authentication required")
    ),
    tag = "auth",
    security(("session_token" = []))
)]
pub async fn change_password(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<ChangePasswordDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.change_password(&user, dto).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Password changed".to_string()),
        None,
    )))
}

/// Start the Google sign-in flow
#[utoipa::path(
    get,
    path = "/api/auth/google",
    params(GoogleLoginQuery),
    responses(
        (status = 307, description = "Redirect to the Google consent screen"),
    ),
    tag = "auth"
)]
pub async fn google_login(
    State(service): State<Arc<AuthService>>,
    Query(query): Query<GoogleLoginQuery>,
) -> Result<Redirect> {
    let url = service.google_login_url(query.role.as_deref()).await?;
    Ok(Redirect::temporary(&url))
}

/// Google sign-in callback: establishes a session and redirects to the
/// frontend
#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    params(GoogleCallbackQuery),
    responses(
        (status = 303, description = "Session established, redirect to the frontend"),
        (status = 401, description = "Unknown state or rejected code")
    ),
    tag = "auth"
)]
pub async fn google_callback(
    State(service): State<Arc<AuthService>>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Result<(SetCookie, Redirect)> {
    let session = service.google_callback(&query.code, &query.state).await?;

    Ok((
        session_cookie(&session.token, service.session_ttl_secs()),
        Redirect::to(service.frontend_url()),
    ))
}
