//! HTTP client for the school's REST authentication API.
//!
//! This module provides `HttpBackend`, the [`AuthBackend`] used when mock
//! data is switched off. Every endpoint wraps its payload in the
//! [`ApiResponse`] envelope.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::AuthTokens;
use crate::models::Credentials;

use super::backend::RefreshResponse;
use super::{ApiError, ApiResponse, AuthBackend, BackendError, LoginResponse};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL of the production API.
pub const DEFAULT_BASE_URL: &str = "https://api.visionariesschool.edu";

/// HTTP request timeout in seconds.
/// 30s allows for slow mobile networks while still failing a hung login.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Auth backend talking to the real API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and decode the envelope, retrying on 429.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(&url)
                .header(header::ACCEPT, "application/json")
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if status.as_u16() == 429 && retries < MAX_RATE_LIMIT_RETRIES {
                retries += 1;
                warn!(url = %url, retries, backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            let text = response.text().await?;
            debug!(url = %url, status = %status, bytes = text.len(), "Auth API response");

            if status.is_success() {
                return serde_json::from_str(&text)
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()));
            }

            // Failed calls usually still carry the envelope with a readable reason.
            if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text) {
                if !envelope.success && (status.is_client_error() && status.as_u16() != 429) {
                    if let Some(reason) = envelope.error.or(envelope.message) {
                        return Ok(ApiResponse::failure(reason));
                    }
                }
            }
            return Err(ApiError::from_status(status, &text));
        }
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError> {
        let envelope: ApiResponse<LoginResponse> = self.post("auth/login", credentials).await?;
        envelope.into_result("Login failed")
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, BackendError> {
        let envelope: ApiResponse<RefreshResponse> = self
            .post("auth/refresh", &RefreshRequest { refresh_token })
            .await?;
        envelope.into_result("Token refresh failed").map(|r| r.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let backend = HttpBackend::new("https://api.example.edu/", Duration::from_secs(5))
            .expect("build client");
        assert_eq!(backend.base_url(), "https://api.example.edu");
        assert_eq!(backend.endpoint("auth/login"), "https://api.example.edu/auth/login");
        assert_eq!(backend.endpoint("/auth/refresh"), "https://api.example.edu/auth/refresh");
    }

    #[test]
    fn test_refresh_request_body() {
        let body = serde_json::to_string(&RefreshRequest { refresh_token: "rt-1" })
            .expect("serialize refresh request");
        assert_eq!(body, r#"{"refreshToken":"rt-1"}"#);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_failure() {
        // Port 9 (discard) on localhost is closed in test environments.
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2))
            .expect("build client");
        let err = backend
            .login(&Credentials::new("a@b.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
