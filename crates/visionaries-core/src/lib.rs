//! Core library for the Visionaries School client.
//!
//! Owns the authentication session (login, proactive token refresh, logout,
//! restore across restarts) and the role-to-navigation mapping. Front ends
//! observe the session through [`auth::SessionManager::subscribe`] and never
//! mutate it directly.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod store;

pub use api::{backend_from_config, AuthBackend, HttpBackend, MockBackend};
pub use auth::{
    AuthTokens, RefreshOutcome, RefreshScheduler, Session, SessionError, SessionManager,
    SessionState,
};
pub use config::Config;
pub use models::{Role, User};
pub use navigation::{is_screen_permitted, navigation_target_for_role};
pub use store::{store_from_config, SessionStore};
