use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::PgPool;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::{AuthenticatedUser, Session};
use crate::features::users::models::User;

/// Service for server-side sessions.
///
/// A session maps an opaque random token to the user's email; the full user
/// record is re-resolved from the email on every request so role or profile
/// changes take effect immediately.
pub struct SessionService {
    pool: PgPool,
    ttl_secs: u64,
}

impl SessionService {
    pub fn new(pool: PgPool, ttl_secs: u64) -> Self {
        Self { pool, ttl_secs }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Create a new session for the given principal email
    pub async fn create(&self, user_email: &str) -> Result<Session> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::seconds(self.ttl_secs as i64);

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_email, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&token)
        .bind(user_email)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        debug!("Session created for {}", user_email);
        Ok(session)
    }

    /// Resolve a session token to the authenticated user.
    ///
    /// Unknown and expired tokens are both a single generic Unauthorized.
    pub async fn resolve(&self, token: &str) -> Result<AuthenticatedUser> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM sessions s
            JOIN users u ON u.email = s.user_email
            WHERE s.token = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        user.map(AuthenticatedUser::from)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))
    }

    /// Revoke a session. Revoking an unknown token is a no-op.
    pub async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
