//! Session lifecycle: login, logout, proactive refresh and restore.
//!
//! `SessionManager` is the only writer of the [`Session`]. Every transition
//! happens under a short synchronous lock and is published on a `watch`
//! channel before the durable store is touched, so observers and the store
//! never see state that memory does not already hold.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::AuthBackend;
use crate::models::{Credentials, Role};
use crate::store::SessionStore;

use super::{Session, SessionError, SessionState};

/// Result of one [`SessionManager::check_and_maybe_refresh`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No authenticated session (or no tokens yet); nothing to evaluate.
    Anonymous,
    /// Token is outside the refresh window.
    Fresh,
    /// Another login or refresh holds the in-flight flag.
    InFlight,
    /// Token had already expired; the session was cleared.
    Expired,
    /// Tokens were replaced.
    Refreshed,
    /// The refresh call failed; the session was cleared.
    LoggedOut,
    /// The session changed while the refresh was in flight; the response was dropped.
    Discarded,
}

struct Inner {
    session: Session,
    /// Bumped whenever the session is cleared or replaced wholesale.
    /// A backend response tagged with an older epoch is stale.
    epoch: u64,
}

enum Decision {
    Done(RefreshOutcome),
    Expired,
    Refresh { epoch: u64, refresh_token: String },
}

pub struct SessionManager {
    backend: Arc<dyn AuthBackend>,
    store: Arc<dyn SessionStore>,
    inner: Mutex<Inner>,
    events: watch::Sender<Session>,
    /// Serializes store writes so the last write always reflects current memory.
    persist_lock: tokio::sync::Mutex<()>,
}

/// Holds the in-flight flag for one login or refresh call and releases it on
/// drop, so a cancelled or panicking call never leaves `loading` stuck.
struct InFlightGuard<'a> {
    manager: &'a SessionManager,
    epoch: u64,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(manager: &'a SessionManager, epoch: u64) -> Self {
        Self {
            manager,
            epoch,
            armed: true,
        }
    }

    /// Called once the completion path has taken over the flag.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.manager.lock();
        if inner.epoch == self.epoch && inner.session.loading {
            debug!("Backend call abandoned, releasing in-flight flag");
            inner.session.loading = false;
            inner.session.refreshing = false;
            self.manager.publish(&inner.session);
        }
    }
}

impl SessionManager {
    pub fn new(backend: Arc<dyn AuthBackend>, store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = watch::channel(Session::default());
        Self {
            backend,
            store,
            inner: Mutex::new(Inner {
                session: Session::default(),
                epoch: 0,
            }),
            events,
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Must be called with the state lock held so notifications keep
    /// transition order.
    fn publish(&self, session: &Session) {
        self.events.send_replace(session.clone());
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().session.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_authenticated()
    }

    /// Receiver notified on every transition; holds a copy of the latest session.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.events.subscribe()
    }

    pub fn current_role(&self) -> Option<Role> {
        self.lock().session.user.as_ref().map(|u| u.role)
    }

    /// Landing route for the signed-in user, if any.
    pub fn navigation_target(&self) -> Option<&'static str> {
        self.current_role().map(|r| r.navigation_target())
    }

    /// False when nobody is signed in.
    pub fn can_access(&self, screen: &str) -> bool {
        self.current_role().is_some_and(|r| r.can_access(screen))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Adopt the persisted session, if any, without contacting the backend.
    ///
    /// An expired snapshot is still adopted; the next refresh check clears it.
    /// Read failures are logged and treated as "no session".
    pub async fn restore(&self) -> bool {
        let snapshot = match self.store.load().await {
            Ok(Some(snapshot)) if snapshot.user.is_some() => snapshot,
            Ok(_) => {
                debug!("No persisted session found");
                return false;
            }
            Err(e) => {
                let err = SessionError::from(e);
                warn!(error = %err, "Failed to read persisted session, starting anonymous");
                return false;
            }
        };

        let mut inner = self.lock();
        if inner.session.is_authenticated() || inner.session.loading {
            debug!("Session already active, ignoring persisted snapshot");
            return false;
        }
        inner.session = Session::from_snapshot(snapshot);
        inner.epoch += 1;
        self.publish(&inner.session);

        if let Some(ref user) = inner.session.user {
            info!(user_id = %user.id, role = %user.role, "Session restored");
        }
        true
    }

    /// Restore the persisted session and evaluate it right away, so an
    /// expired snapshot is cleared before anyone reads it.
    pub async fn resume(&self) -> RefreshOutcome {
        self.restore().await;
        self.check_and_maybe_refresh().await
    }

    /// Log in with the given credentials.
    ///
    /// Rejected with [`SessionError::Busy`] while another login or refresh is
    /// in flight. On failure the current session is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let credentials = Credentials::new(email, password);

        let epoch = {
            let mut inner = self.lock();
            if inner.session.loading {
                return Err(SessionError::Busy);
            }
            inner.session.loading = true;
            self.publish(&inner.session);
            inner.epoch
        };
        let mut guard = InFlightGuard::new(self, epoch);

        debug!(email = %credentials.email, "Sending login request");
        let result = self.backend.login(&credentials).await;

        let session = {
            let mut inner = self.lock();
            guard.disarm();

            if inner.epoch != epoch {
                warn!("Discarding login response: session changed while request was in flight");
                return Err(SessionError::Superseded);
            }

            inner.session.loading = false;
            match result {
                Ok(response) => {
                    inner.session.user = Some(response.user);
                    inner.session.tokens = Some(response.tokens);
                    inner.session.refreshing = false;
                    inner.epoch += 1;
                    self.publish(&inner.session);
                    inner.session.clone()
                }
                Err(e) => {
                    self.publish(&inner.session);
                    let err = SessionError::from_login(e);
                    error!(error = %err, "Login failed");
                    return Err(err);
                }
            }
        };

        self.persist_logged().await;

        if let Some(ref user) = session.user {
            info!(user_id = %user.id, role = %user.role, "Login successful");
        }
        Ok(session)
    }

    /// Clear the session and the persisted copy. Safe to call in any state,
    /// including while a login or refresh is in flight.
    pub async fn logout(&self) {
        let was_authenticated = self.clear_session();
        self.persist_logged().await;
        if was_authenticated {
            info!("Logged out");
        }
    }

    /// Periodic token evaluation. Never fails: expiry and refresh failures
    /// resolve to an anonymous session that observers pick up.
    pub async fn check_and_maybe_refresh(&self) -> RefreshOutcome {
        let now = Utc::now();

        let decision = {
            let mut inner = self.lock();
            let tokens = if inner.session.is_authenticated() {
                inner.session.tokens.clone()
            } else {
                None
            };

            match tokens {
                None => Decision::Done(RefreshOutcome::Anonymous),
                Some(_) if inner.session.loading => Decision::Done(RefreshOutcome::InFlight),
                Some(tokens) if tokens.is_expired_at(now) => {
                    inner.session.clear();
                    inner.epoch += 1;
                    self.publish(&inner.session);
                    Decision::Expired
                }
                Some(tokens) if tokens.needs_refresh_at(now) => {
                    inner.session.loading = true;
                    inner.session.refreshing = true;
                    self.publish(&inner.session);
                    Decision::Refresh {
                        epoch: inner.epoch,
                        refresh_token: tokens.refresh_token,
                    }
                }
                Some(_) => Decision::Done(RefreshOutcome::Fresh),
            }
        };

        match decision {
            Decision::Done(outcome) => {
                debug!(?outcome, "Token check");
                outcome
            }
            Decision::Expired => {
                self.persist_logged().await;
                info!("Session expired, logged out");
                RefreshOutcome::Expired
            }
            Decision::Refresh {
                epoch,
                refresh_token,
            } => self.refresh(epoch, &refresh_token).await,
        }
    }

    async fn refresh(&self, epoch: u64, refresh_token: &str) -> RefreshOutcome {
        let mut guard = InFlightGuard::new(self, epoch);

        debug!("Token inside refresh window, refreshing");
        let result = self.backend.refresh(refresh_token).await;

        let outcome = {
            let mut inner = self.lock();
            guard.disarm();

            if inner.epoch != epoch {
                warn!("Discarding refresh response: session changed while request was in flight");
                return RefreshOutcome::Discarded;
            }

            inner.session.loading = false;
            inner.session.refreshing = false;
            match result {
                Ok(tokens) => {
                    debug!(expires_at = %tokens.expires_at, "Tokens refreshed");
                    inner.session.tokens = Some(tokens);
                    self.publish(&inner.session);
                    RefreshOutcome::Refreshed
                }
                Err(e) => {
                    let err = SessionError::from_refresh(e);
                    warn!(error = %err, "Token refresh failed, logging out");
                    inner.session.clear();
                    inner.epoch += 1;
                    self.publish(&inner.session);
                    RefreshOutcome::LoggedOut
                }
            }
        };

        self.persist_logged().await;
        outcome
    }

    /// Reset the in-memory session; returns whether a user was signed in.
    fn clear_session(&self) -> bool {
        let mut inner = self.lock();
        let was_authenticated = inner.session.is_authenticated();
        let changed = inner.session != Session::default();
        inner.session.clear();
        inner.epoch += 1;
        if changed {
            self.publish(&inner.session);
        }
        was_authenticated
    }

    /// Write the current in-memory session to the store, or clear the store
    /// when nobody is signed in.
    async fn persist(&self) -> Result<(), SessionError> {
        let _permit = self.persist_lock.lock().await;
        let snapshot = self.lock().session.snapshot();

        if snapshot.user.is_none() {
            self.store.clear().await?;
        } else {
            self.store.save(&snapshot).await?;
        }
        Ok(())
    }

    /// Store failures never roll back memory.
    async fn persist_logged(&self) {
        if let Err(e) = self.persist().await {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
