//! Route access policies.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected view (and every CLI command) declares an [`AccessPolicy`].
//! The guard maps the current [`SessionState`] plus that policy to a
//! [`GuardOutcome`]: hold while the session is still being restored, send the
//! user somewhere else, or let the view render.
//!
//! DESIGN
//! ======
//! `evaluate` is a pure function so the decision table is testable without a
//! store. `RouteGuard` wraps it around a `watch::Receiver` so callers
//! re-evaluate whenever the session changes instead of deciding once.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use tokio::sync::watch;

use crate::navigation::Route;
use crate::state::SessionState;

/// Who may see a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessPolicy {
    AnyAuthenticated,
    /// Admin-level staff: admins, agronomists and superusers.
    AdminOrSuperuser,
    SuperuserOnly,
    FarmUserOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session restore has not finished; show a spinner.
    Loading,
    Redirect(Route),
    Render,
}

/// Decide what a route guarded by `policy` shows for `state`.
#[must_use]
pub fn evaluate(state: &SessionState, policy: AccessPolicy) -> GuardOutcome {
    let caps = match state {
        SessionState::Initializing => return GuardOutcome::Loading,
        SessionState::Unauthenticated => return GuardOutcome::Redirect(Route::Login),
        SessionState::Authenticated(_) => state.capabilities(),
    };

    match policy {
        AccessPolicy::SuperuserOnly if !caps.is_superuser => GuardOutcome::Redirect(Route::Dashboard),
        AccessPolicy::AdminOrSuperuser if !caps.is_staff() => {
            if caps.is_farm_user {
                GuardOutcome::Redirect(Route::FarmUserDashboard)
            } else {
                GuardOutcome::Redirect(Route::Login)
            }
        }
        AccessPolicy::FarmUserOnly if !caps.is_farm_user => GuardOutcome::Redirect(Route::Dashboard),
        _ => GuardOutcome::Render,
    }
}

/// A policy bound to a session feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteGuard {
    policy: AccessPolicy,
}

impl RouteGuard {
    #[must_use]
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(self) -> AccessPolicy {
        self.policy
    }

    /// Outcome for the state the receiver currently holds.
    #[must_use]
    pub fn current(self, session: &watch::Receiver<SessionState>) -> GuardOutcome {
        evaluate(&session.borrow(), self.policy)
    }

    /// Wait for the next session change and re-evaluate. Returns `None` once
    /// the session store is gone.
    pub async fn next_outcome(self, session: &mut watch::Receiver<SessionState>) -> Option<GuardOutcome> {
        session.changed().await.ok()?;
        let outcome = evaluate(&session.borrow_and_update(), self.policy);
        tracing::debug!(policy = ?self.policy, ?outcome, "route guard re-evaluated");
        Some(outcome)
    }

    /// Wait until session restore has finished, then decide.
    pub async fn settle(self, session: &mut watch::Receiver<SessionState>) -> GuardOutcome {
        if let Ok(state) = session.wait_for(|state| !state.is_loading()).await {
            return evaluate(&state, self.policy);
        }
        evaluate(&session.borrow(), self.policy)
    }
}
