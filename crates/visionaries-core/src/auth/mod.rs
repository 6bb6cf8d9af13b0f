//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session` / `AuthTokens`: in-memory session state and token expiry rules
//! - `SessionManager`: the single owner of the session (login, logout, refresh, restore)
//! - `RefreshScheduler`: background task polling token expiry once a minute
//!
//! Tokens are refreshed when they enter the 5 minute window before expiry.

pub mod error;
pub mod manager;
pub mod scheduler;
pub mod session;

pub use error::SessionError;
pub use manager::{RefreshOutcome, SessionManager};
pub use scheduler::RefreshScheduler;
pub use session::{AuthTokens, Session, SessionSnapshot, SessionState};
