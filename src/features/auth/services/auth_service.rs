use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::auth::clients::{GoogleAuthClient, GoogleUserInfo};
use crate::features::auth::dtos::{ChangePasswordDto, ChangeUsernameDto, LoginDto, SignupDto};
use crate::features::auth::models::{AuthenticatedUser, Session};
use crate::features::auth::services::SessionService;
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::models::{Role, User};

/// Service for account lifecycle and credential verification
pub struct AuthService {
    pool: PgPool,
    sessions: Arc<SessionService>,
    google: Arc<GoogleAuthClient>,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        sessions: Arc<SessionService>,
        google: Arc<GoogleAuthClient>,
        frontend_url: String,
    ) -> Self {
        Self {
            pool,
            sessions,
            google,
            frontend_url,
        }
    }

    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub fn session_ttl_secs(&self) -> u64 {
        self.sessions.ttl_secs()
    }

    /// Create a local account. Duplicate email or username is rejected up
    /// front with a single message, matching the signup form's UX.
    pub async fn signup(&self, dto: SignupDto) -> Result<UserResponseDto> {
        let email_taken = self.get_user_by_email(&dto.email).await?.is_some();
        let username_taken = self.get_user_by_name(&dto.username).await?.is_some();
        if email_taken || username_taken {
            return Err(AppError::BadRequest(
                "A user with this email or username already exists".to_string(),
            ));
        }

        let hashed = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&hashed)
        .bind(dto.role)
        .fetch_one(&self.pool)
        .await?;

        info!("User created: {}", user.username);
        Ok(user.into())
    }

    /// Verify local credentials and establish a session.
    ///
    /// Absent user, missing local password (Google account) and hash
    /// mismatch all collapse into one generic failure; the caller never
    /// learns which check failed.
    pub async fn login(&self, dto: LoginDto) -> Result<(AuthenticatedUser, Session)> {
        let Some(user) = self.get_user_by_email(&dto.email).await? else {
            return Err(invalid_credentials());
        };

        let Some(stored_hash) = user.password.as_deref() else {
            return Err(invalid_credentials());
        };

        let matches = bcrypt::verify(&dto.password, stored_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !matches {
            return Err(invalid_credentials());
        }

        let session = self.sessions.create(&user.email).await?;
        info!("User logged in: {}", user.username);
        Ok((user.into(), session))
    }

    /// Revoke the given session token
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.sessions.delete(token).await
    }

    /// Change the authenticated user's username
    pub async fn change_username(
        &self,
        user: &AuthenticatedUser,
        dto: ChangeUsernameDto,
    ) -> Result<()> {
        if user.username != dto.old_username {
            return Err(AppError::BadRequest(
                "The old username does not match".to_string(),
            ));
        }

        let new_username = validate_new_username(&dto.old_username, &dto.new_username)?;

        if self.get_user_by_name(&new_username).await?.is_some() {
            return Err(AppError::Conflict(
                "The requested username is already taken".to_string(),
            ));
        }

        sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
            .bind(&new_username)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        info!("Username changed: {} -> {}", user.username, new_username);
        Ok(())
    }

    /// Change the authenticated user's password.
    ///
    /// Externally-authenticated accounts have no local password and are
    /// rejected outright.
    pub async fn change_password(
        &self,
        user: &AuthenticatedUser,
        dto: ChangePasswordDto,
    ) -> Result<()> {
        if !user.password_set {
            return Err(AppError::Forbidden(
                "Password change is not available for externally-authenticated accounts"
                    .to_string(),
            ));
        }

        let stored_hash = sqlx::query_scalar::<_, Option<String>>(
            "SELECT password FROM users WHERE id = $1",
        )
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await?
        .flatten()
        .ok_or_else(|| {
            AppError::Forbidden(
                "Password change is not available for externally-authenticated accounts"
                    .to_string(),
            )
        })?;

        let matches = bcrypt::verify(&dto.old_password, &stored_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !matches {
            return Err(AppError::Forbidden("Invalid old password".to_string()));
        }

        let hashed = bcrypt::hash(&dto.new_password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(&hashed)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        info!("Password changed for {}", user.username);
        Ok(())
    }

    /// Start a Google sign-in: persist a pending state and return the
    /// consent-screen URL to redirect to.
    pub async fn google_login_url(&self, requested_role: Option<&str>) -> Result<String> {
        // TEACHER is the only role a first-time Google sign-in may request
        let role = match requested_role {
            Some("TEACHER") => Role::Teacher,
            _ => Role::Student,
        };

        // Drop long-abandoned states while we are here
        sqlx::query("DELETE FROM oauth_states WHERE created_at < NOW() - INTERVAL '1 hour'")
            .execute(&self.pool)
            .await?;

        let state = new_oauth_state();
        sqlx::query("INSERT INTO oauth_states (state, role) VALUES ($1, $2)")
            .bind(&state)
            .bind(role)
            .execute(&self.pool)
            .await?;

        Ok(self.google.authorize_url(&state))
    }

    /// Complete a Google sign-in: consume the state, exchange the code,
    /// find or create the account and establish a session.
    pub async fn google_callback(&self, code: &str, state: &str) -> Result<Session> {
        let role = self.consume_oauth_state(state).await?;

        let access_token = self.google.exchange_code(code).await?;
        let userinfo = self.google.fetch_userinfo(&access_token).await?;

        let email = userinfo.email.clone().ok_or_else(|| {
            AppError::Unauthorized("The Google account did not return an email address".to_string())
        })?;

        let user = match self.get_user_by_email(&email).await? {
            Some(user) => user,
            None => self.create_google_user(&userinfo, &email, role).await?,
        };

        let session = self.sessions.create(&user.email).await?;
        info!("Google sign-in completed for {}", user.username);
        Ok(session)
    }

    async fn consume_oauth_state(&self, state: &str) -> Result<Role> {
        let role = sqlx::query_scalar::<_, Role>(
            r#"
            DELETE FROM oauth_states
            WHERE state = $1 AND created_at > NOW() - INTERVAL '10 minutes'
            RETURNING role
            "#,
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        role.ok_or_else(|| AppError::Unauthorized("Unknown or expired sign-in state".to_string()))
    }

    async fn create_google_user(
        &self,
        userinfo: &GoogleUserInfo,
        email: &str,
        role: Role,
    ) -> Result<User> {
        let base = google_base_username(userinfo, email);
        let username = self.generate_unique_username(&base).await?;

        // NULL password marks the account as externally-authenticated
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, role)
            VALUES ($1, $2, NULL, $3)
            RETURNING *
            "#,
        )
        .bind(&username)
        .bind(email)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        info!("Google account created: {}", user.username);
        Ok(user)
    }

    /// Resolve username collisions with numeric suffixes: `name`, `name_1`,
    /// `name_2`, ...
    async fn generate_unique_username(&self, base: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            let candidate = username_candidate(base, attempt);
            if self.get_user_by_name(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}

/// Random state parameter for the OAuth round trip
fn new_oauth_state() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Trimmed, non-empty new username that differs from the old one
fn validate_new_username(old: &str, new: &str) -> Result<String> {
    let trimmed = new.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(
            "The new username must not be empty".to_string(),
        ));
    }
    if trimmed == old.trim() {
        return Err(AppError::BadRequest(
            "The new username must differ from the old one".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Attempt 0 is the base name itself, attempt n appends `_n`
fn username_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}_{}", base, attempt)
    }
}

/// Base username for a first-time Google sign-in: display name, then the
/// local part of the email, then a fixed fallback
fn google_base_username(userinfo: &GoogleUserInfo, email: &str) -> String {
    if let Some(name) = userinfo.name.as_deref() {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    match email.split('@').next() {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => "google_user".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_username_is_trimmed() {
        assert_eq!(validate_new_username("anna", "  bela  ").unwrap(), "bela");
    }

    #[test]
    fn new_username_must_not_be_empty() {
        assert!(matches!(
            validate_new_username("anna", "   "),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn new_username_must_differ_from_old() {
        assert!(matches!(
            validate_new_username("anna", "anna"),
            Err(AppError::BadRequest(_))
        ));
        // Equality after trimming also counts as a no-op change
        assert!(matches!(
            validate_new_username("anna", " anna "),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn username_candidates_use_numeric_suffixes() {
        assert_eq!(username_candidate("anna", 0), "anna");
        assert_eq!(username_candidate("anna", 1), "anna_1");
        assert_eq!(username_candidate("anna", 2), "anna_2");
    }

    #[test]
    fn google_base_username_prefers_display_name() {
        let info = GoogleUserInfo {
            email: Some("jdoe@gmail.com".to_string()),
            name: Some("John Doe".to_string()),
        };
        assert_eq!(google_base_username(&info, "jdoe@gmail.com"), "John Doe");
    }

    #[test]
    fn google_base_username_falls_back_to_email_local_part() {
        let info = GoogleUserInfo {
            email: Some("jdoe@gmail.com".to_string()),
            name: None,
        };
        assert_eq!(google_base_username(&info, "jdoe@gmail.com"), "jdoe");

        let blank_name = GoogleUserInfo {
            email: Some("jdoe@gmail.com".to_string()),
            name: Some("   ".to_string()),
        };
        assert_eq!(google_base_username(&blank_name, "jdoe@gmail.com"), "jdoe");
    }

    #[test]
    fn new_oauth_state_is_random_hex() {
        let state = new_oauth_state();
        assert_eq!(state.len(), 32);
        assert_ne!(state, new_oauth_state());
    }
}
