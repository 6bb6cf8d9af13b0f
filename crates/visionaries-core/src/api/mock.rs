//! In-process stand-in for the auth API.
//!
//! Used while the real backend is unavailable (`use_mock_data` in the
//! config). Accepts any non-empty credentials after a simulated network
//! delay and hands out random opaque tokens.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

use crate::auth::AuthTokens;
use crate::models::{Credentials, Role, User};

use super::{AuthBackend, BackendError, LoginResponse};

/// Simulated network delay, matching what the mobile app shipped with.
pub const DEFAULT_MOCK_DELAY_MS: u64 = 800;

/// Lifetime of tokens issued by the mock.
const MOCK_TOKEN_LIFETIME_MINUTES: i64 = 60;

const TOKEN_LENGTH: usize = 32;

pub struct MockBackend {
    delay: Duration,
    token_lifetime: chrono::Duration,
    fail_refresh: bool,
    issued_refresh_tokens: Mutex<HashSet<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_MOCK_DELAY_MS))
    }
}

impl MockBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            token_lifetime: chrono::Duration::minutes(MOCK_TOKEN_LIFETIME_MINUTES),
            fail_refresh: false,
            issued_refresh_tokens: Mutex::new(HashSet::new()),
        }
    }

    /// Issue tokens with a custom lifetime (handy for exercising refresh).
    pub fn with_token_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Reject every refresh, as a revoked refresh token would.
    pub fn with_failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    fn random_token(prefix: &str) -> String {
        let body: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        format!("{}_{}", prefix, body)
    }

    fn issue_tokens(&self) -> AuthTokens {
        let tokens = AuthTokens {
            access_token: Self::random_token("mock_access"),
            refresh_token: Self::random_token("mock_refresh"),
            expires_at: Utc::now() + self.token_lifetime,
        };
        self.issued_refresh_tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(tokens.refresh_token.clone());
        tokens
    }

    /// Fixture users pick their role from the email local part
    /// (`teacher@...`, `driver.bob@...`); anything else is a student.
    fn role_for_email(email: &str) -> Role {
        let local = email.split('@').next().unwrap_or_default();
        let tag = local.split(['.', '+', '_', '-']).next().unwrap_or_default();
        tag.parse().unwrap_or(Role::Student)
    }

    fn fixture_user(email: &str) -> User {
        let role = Self::role_for_email(email);
        let now = Utc::now();
        User {
            id: format!("usr_{}", role.as_str()),
            email: email.to_string(),
            first_name: "Demo".to_string(),
            last_name: role.display_name().to_string(),
            role,
            profile_image: None,
            phone: None,
            created_at: now - chrono::Duration::days(30),
            last_login_at: Some(now),
        }
    }

    async fn simulate_delay(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError> {
        self.simulate_delay().await;

        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(BackendError::Rejected("Invalid credentials".to_string()));
        }

        debug!(email = %credentials.email, "Mock login accepted");
        Ok(LoginResponse {
            user: Self::fixture_user(&credentials.email),
            tokens: self.issue_tokens(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, BackendError> {
        self.simulate_delay().await;

        if self.fail_refresh {
            return Err(BackendError::Rejected("Refresh token revoked".to_string()));
        }

        let known = self
            .issued_refresh_tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(refresh_token);
        if !known {
            return Err(BackendError::Rejected("Invalid refresh token".to_string()));
        }

        Ok(self.issue_tokens())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> MockBackend {
        MockBackend::new(Duration::ZERO)
    }

    #[test]
    fn test_role_for_email() {
        assert_eq!(MockBackend::role_for_email("teacher@school.edu"), Role::Teacher);
        assert_eq!(MockBackend::role_for_email("driver.bob@school.edu"), Role::Driver);
        assert_eq!(MockBackend::role_for_email("Admin+ops@school.edu"), Role::Admin);
        assert_eq!(MockBackend::role_for_email("jane@school.edu"), Role::Student);
        assert_eq!(MockBackend::role_for_email(""), Role::Student);
    }

    #[tokio::test]
    async fn test_login_requires_email_and_password() {
        let backend = instant();
        let err = backend.login(&Credentials::new("", "pw")).await.unwrap_err();
        assert_eq!(err, BackendError::Rejected("Invalid credentials".to_string()));
        assert!(backend.login(&Credentials::new("a@b.com", "")).await.is_err());

        let ok = backend
            .login(&Credentials::new("parent@b.com", "pw"))
            .await
            .expect("mock login succeeds");
        assert_eq!(ok.user.role, Role::Parent);
        assert!(!ok.tokens.is_expired());
        assert_ne!(ok.tokens.access_token, ok.tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let backend = instant();
        let login = backend
            .login(&Credentials::new("a@b.com", "pw"))
            .await
            .expect("mock login succeeds");

        let refreshed = backend
            .refresh(&login.tokens.refresh_token)
            .await
            .expect("issued refresh token is accepted");
        assert_ne!(refreshed.refresh_token, login.tokens.refresh_token);

        // Refresh tokens are single use
        let reuse = backend.refresh(&login.tokens.refresh_token).await;
        assert!(matches!(reuse, Err(BackendError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_failing_refresh() {
        let backend = instant().with_failing_refresh();
        let login = backend
            .login(&Credentials::new("a@b.com", "pw"))
            .await
            .expect("mock login succeeds");
        assert!(backend.refresh(&login.tokens.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_custom_token_lifetime() {
        let backend = instant().with_token_lifetime(chrono::Duration::minutes(3));
        let login = backend
            .login(&Credentials::new("a@b.com", "pw"))
            .await
            .expect("mock login succeeds");
        assert!(login.tokens.needs_refresh());
    }
}
