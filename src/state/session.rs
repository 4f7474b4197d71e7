//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `SessionStore` exists per application instance. It is built at
//! bootstrap and handed to route guards and views; nothing reaches it through
//! globals, so tests build isolated stores.
//!
//! Every session mutation funnels through this type: `restore`, `login`,
//! `logout`, and the API client's "credential rejected" event, which lands in
//! [`AuthListener::on_unauthenticated`] and is turned into a `logout` plus a
//! single hard redirect to the sign-in view.
//!
//! STATE MACHINE
//! =============
//! `Initializing` → `Unauthenticated` | `Authenticated` (restore, once)
//! `Unauthenticated` → `Authenticated` (login)
//! `Authenticated` → `Unauthenticated` (logout or rejected credential)

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use super::capabilities::Capabilities;
use crate::navigation::{Navigator, Route};
use crate::net::types::{Credentials, GENERIC_LOGIN_FAILURE, Identity, LoginResponse, login_failure_message};
use crate::net::{ApiClient, AuthApi, AuthListener};
use crate::storage::{SessionStorage, StorageKey, StoredSession};

/// Where the session currently stands. The identity only exists while
/// authenticated.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    /// Persisted storage has not been read yet.
    #[default]
    Initializing,
    Unauthenticated,
    Authenticated(Identity),
}

impl SessionState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Initializing | Self::Unauthenticated => None,
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::of(self.identity())
    }
}

/// Result of [`SessionStore::login`]. Failures are values, not errors, so
/// callers can show the message and let the user retry.
#[derive(Clone, Debug, PartialEq)]
pub enum LoginOutcome {
    Success(Identity),
    Failure { message: String },
}

impl LoginOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    fn failure(message: impl Into<String>) -> Self {
        Self::Failure { message: message.into() }
    }
}

pub struct SessionStore {
    auth: AuthApi,
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
    // Cleared by the first rejected credential, re-set by a successful login.
    redirect_armed: AtomicBool,
}

impl SessionStore {
    /// Build the store and subscribe it to the client's rejected-credential
    /// event. The store shares the client's storage.
    #[must_use]
    pub fn new(client: Arc<ApiClient>, navigator: Arc<dyn Navigator>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::Initializing);
        let store = Arc::new(Self {
            auth: AuthApi::new(Arc::clone(&client)),
            storage: Arc::clone(client.storage()),
            navigator,
            state,
            redirect_armed: AtomicBool::new(true),
        });
        let listener = Arc::downgrade(&store);
        client.subscribe(listener);
        store
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Restore the session from persisted storage. Runs once; later calls
    /// return the current state untouched.
    ///
    /// A non-empty access token plus a parseable stored identity counts as a
    /// session. The token is not validated against the backend; the first
    /// request that gets a 401 ends the session instead.
    pub fn restore(&self) -> SessionState {
        if !self.state.borrow().is_loading() {
            return self.state();
        }

        let token = self.storage.access_token();
        let stored_user = self.storage.get(StorageKey::User);
        let next = match (token, stored_user) {
            (Some(_), Some(raw)) => match Identity::from_json(&raw) {
                Ok(identity) => SessionState::Authenticated(identity),
                Err(e) => {
                    tracing::warn!(error = %e, "stored identity unparseable; clearing session");
                    self.clear_storage();
                    SessionState::Unauthenticated
                }
            },
            _ => {
                self.clear_storage();
                SessionState::Unauthenticated
            }
        };

        match next.identity() {
            Some(identity) => tracing::info!(username = %identity.username, "session restored"),
            None => tracing::debug!("no stored session"),
        }
        self.state.send_replace(next.clone());
        next
    }

    /// Sign in. Never fails with an error: rejection, transport failure and
    /// malformed responses all come back as [`LoginOutcome::Failure`].
    ///
    /// Any previous session is dropped first: a stale bearer on the login call
    /// would be rejected with a 401 before the credentials are checked.
    pub async fn login(&self, credentials: &Credentials) -> LoginOutcome {
        self.logout();
        let response = match self.auth.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(username = %credentials.username, error = %e, "login rejected");
                let message = e.body().map_or_else(|| GENERIC_LOGIN_FAILURE.to_owned(), login_failure_message);
                return LoginOutcome::failure(message);
            }
        };

        let payload: LoginResponse = match response.json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "login response malformed");
                return LoginOutcome::failure(GENERIC_LOGIN_FAILURE);
            }
        };
        if payload.access.is_empty() {
            tracing::warn!("login response carried an empty access token");
            return LoginOutcome::failure(GENERIC_LOGIN_FAILURE);
        }
        let identity: Identity = match serde_json::from_value(payload.user.clone()) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "login response user malformed");
                return LoginOutcome::failure(GENERIC_LOGIN_FAILURE);
            }
        };

        let record = StoredSession { access_token: payload.access, refresh_token: payload.refresh, user: payload.user.to_string() };
        if let Err(e) = self.storage.write_session(&record) {
            tracing::error!(error = %e, "failed to persist session");
            return LoginOutcome::failure(format!("Could not save session: {e}"));
        }

        self.redirect_armed.store(true, Ordering::SeqCst);
        self.state.send_replace(SessionState::Authenticated(identity.clone()));
        tracing::info!(username = %identity.username, user_type = ?identity.user_type, "logged in");
        LoginOutcome::Success(identity)
    }

    /// Sign out: clear persisted state and the identity. Idempotent.
    pub fn logout(&self) {
        self.clear_storage();
        let changed = self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Unauthenticated) {
                false
            } else {
                *state = SessionState::Unauthenticated;
                true
            }
        });
        if changed {
            tracing::info!("logged out");
        }
    }

    fn clear_storage(&self) {
        if let Err(e) = self.storage.clear() {
            tracing::error!(error = %e, "failed to clear session storage");
        }
    }

    // =========================================================================
    // DERIVED STATE
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.state.borrow().capabilities()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.capabilities().is_authenticated
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.capabilities().is_admin
    }

    #[must_use]
    pub fn is_farm_user(&self) -> bool {
        self.capabilities().is_farm_user
    }

    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.capabilities().is_superuser
    }

    /// Watch session changes; route guards re-evaluate on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl AuthListener for SessionStore {
    fn on_unauthenticated(&self) {
        self.logout();
        if self.redirect_armed.swap(false, Ordering::SeqCst) {
            self.navigator.hard_redirect(Route::Login);
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("state", &*self.state.borrow()).finish_non_exhaustive()
    }
}
