use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// Buffer time before expiry to trigger refresh (5 minutes)
pub const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry; epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub expires_at: DateTime<Utc>,
}

impl AuthTokens {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check if the token will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }

    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES)
    }

    /// Remaining lifetime, never negative.
    pub fn time_until_expiry_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry_at(Utc::now()).num_minutes()
    }
}

/// Observable lifecycle state, derived from a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Refreshing,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticated => "authenticated",
            SessionState::Refreshing => "refreshing",
        }
    }
}

/// In-memory authentication state.
///
/// `loading` is set for the duration of a login or refresh call and
/// `refreshing` additionally marks the refresh case. Neither is persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub tokens: Option<AuthTokens>,
    pub loading: bool,
    pub refreshing: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn state(&self) -> SessionState {
        match (self.is_authenticated(), self.refreshing) {
            (false, _) => SessionState::Anonymous,
            (true, true) => SessionState::Refreshing,
            (true, false) => SessionState::Authenticated,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            tokens: self.tokens.clone(),
            authenticated: self.is_authenticated(),
        }
    }

    /// Adopt a persisted snapshot. The stored `authenticated` flag is not
    /// trusted; it is recomputed from `user`.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            user: snapshot.user,
            tokens: snapshot.tokens,
            loading: false,
            refreshing: false,
        }
    }

    /// Reset every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Persisted form of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub tokens: Option<AuthTokens>,
    pub authenticated: bool,
}
