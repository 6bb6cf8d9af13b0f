use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthTokens;
use crate::models::{Credentials, User};

/// Failure reported by an [`AuthBackend`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend answered and refused the request.
    #[error("{0}")]
    Rejected(String),

    /// The call did not complete, or the response could not be understood.
    #[error("{0}")]
    Transport(String),
}

/// Response envelope used by every endpoint of the school API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    /// Unwrap the envelope. `fallback` is the rejection message used when the
    /// backend reports failure without saying why.
    pub fn into_result(self, fallback: &str) -> Result<T, BackendError> {
        if !self.success {
            let reason = self
                .error
                .or(self.message)
                .unwrap_or_else(|| fallback.to_string());
            return Err(BackendError::Rejected(reason));
        }
        self.data
            .ok_or_else(|| BackendError::Transport("Response reported success but carried no data".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub tokens: AuthTokens,
}

/// Refresh responses carry at least the new token pair; the user record the
/// backend may echo back is ignored.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RefreshResponse {
    pub tokens: AuthTokens,
}

/// The two backend calls the session core depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError>;

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_failure_uses_error_then_message() {
        let resp: ApiResponse<LoginResponse> =
            serde_json::from_str(r#"{"success":false,"error":"Invalid credentials"}"#)
                .expect("Failed to parse envelope test JSON");
        assert_eq!(
            resp.into_result("Login failed").unwrap_err(),
            BackendError::Rejected("Invalid credentials".to_string())
        );

        let resp: ApiResponse<LoginResponse> =
            serde_json::from_str(r#"{"success":false,"message":"Account locked"}"#)
                .expect("Failed to parse envelope test JSON");
        assert_eq!(
            resp.into_result("Login failed").unwrap_err(),
            BackendError::Rejected("Account locked".to_string())
        );

        let resp: ApiResponse<LoginResponse> = serde_json::from_str(r#"{"success":false}"#)
            .expect("Failed to parse envelope test JSON");
        assert_eq!(
            resp.into_result("Login failed").unwrap_err(),
            BackendError::Rejected("Login failed".to_string())
        );
    }

    #[test]
    fn test_envelope_success_without_data_is_transport_failure() {
        let resp: ApiResponse<LoginResponse> = serde_json::from_str(r#"{"success":true}"#)
            .expect("Failed to parse envelope test JSON");
        assert!(matches!(resp.into_result("Login failed"), Err(BackendError::Transport(_))));
    }

    #[test]
    fn test_parse_login_response() {
        let json = r#"{
            "success": true,
            "data": {
                "user": {
                    "id": "usr_001",
                    "email": "a@b.com",
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "role": "admin",
                    "createdAt": "2024-01-01T00:00:00Z"
                },
                "tokens": {
                    "accessToken": "at",
                    "refreshToken": "rt",
                    "expiresAt": 1900000000000
                }
            }
        }"#;
        let resp: ApiResponse<LoginResponse> =
            serde_json::from_str(json).expect("Failed to parse login test JSON");
        let login = resp.into_result("Login failed").expect("login envelope is a success");
        assert_eq!(login.user.role, crate::models::Role::Admin);
        assert_eq!(login.tokens.refresh_token, "rt");
    }

    #[test]
    fn test_refresh_envelope_without_data_field() {
        let resp: ApiResponse<RefreshResponse> =
            serde_json::from_str(r#"{"success":false,"error":"Refresh token revoked"}"#)
                .expect("Failed to parse refresh envelope JSON");
        assert!(resp.data.is_none());
        assert_eq!(
            resp.into_result("Token refresh failed").unwrap_err(),
            BackendError::Rejected("Refresh token revoked".to_string())
        );
    }

    #[test]
    fn test_refresh_response_ignores_user() {
        let json = r#"{"user":{"whatever":true},"tokens":{"accessToken":"a2","refreshToken":"r2","expiresAt":1900000000000}}"#;
        let resp: RefreshResponse = serde_json::from_str(json).expect("Failed to parse refresh test JSON");
        assert_eq!(resp.tokens.access_token, "a2");
    }
}
