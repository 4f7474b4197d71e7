//! Application routing table.
//!
//! Each path carries the access policy its view is guarded by. Paths use
//! `:farmId` for the farm-scoped views; the captured id must be numeric.
//! `/` and anything unknown fall back to the sign-in view.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use crate::guard::AccessPolicy::{AdminOrSuperuser, AnyAuthenticated, FarmUserOnly, SuperuserOnly};
use crate::guard::{self, AccessPolicy, GuardOutcome};
use crate::navigation::Route;
use crate::state::SessionState;

const FARM_ID: &str = ":farmId";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Guarded(AccessPolicy),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteDef {
    pub pattern: &'static str,
    pub access: Access,
}

const fn public(pattern: &'static str) -> RouteDef {
    RouteDef { pattern, access: Access::Public }
}

const fn guarded(pattern: &'static str, policy: AccessPolicy) -> RouteDef {
    RouteDef { pattern, access: Access::Guarded(policy) }
}

pub const ROUTES: &[RouteDef] = &[
    public("/login"),
    guarded("/dashboard", AnyAuthenticated),
    guarded("/profile", AnyAuthenticated),
    guarded("/farms", AnyAuthenticated),
    guarded("/daily-tasks", AnyAuthenticated),
    guarded("/crop-stage", AnyAuthenticated),
    guarded("/calendar", AnyAuthenticated),
    guarded("/spray-schedule", AnyAuthenticated),
    guarded("/fertigation", AnyAuthenticated),
    guarded("/worker-tasks", AnyAuthenticated),
    guarded("/issue-reports", AnyAuthenticated),
    guarded("/expenditure", AnyAuthenticated),
    guarded("/sale-stage", AnyAuthenticated),
    guarded("/farm-notifications", AnyAuthenticated),
    guarded("/create-user", AdminOrSuperuser),
    guarded("/create-farm", AdminOrSuperuser),
    guarded("/notifications", AdminOrSuperuser),
    guarded("/admin/notification-manager", AdminOrSuperuser),
    guarded("/farm-user-management", AdminOrSuperuser),
    guarded("/user-management", SuperuserOnly),
    guarded("/farm-user-dashboard", FarmUserOnly),
    guarded("/my-farms", FarmUserOnly),
    guarded("/farm/:farmId/dashboard", FarmUserOnly),
    guarded("/farm/:farmId/daily-tasks", FarmUserOnly),
    guarded("/farm/:farmId/crop-stages", FarmUserOnly),
    guarded("/farm/:farmId/spray-schedules", FarmUserOnly),
    guarded("/farm/:farmId/fertigations", FarmUserOnly),
    guarded("/farm/:farmId/workers", FarmUserOnly),
    guarded("/farm/:farmId/worker-tasks", FarmUserOnly),
    guarded("/farm/:farmId/issue-reports", FarmUserOnly),
    guarded("/farm/:farmId/expenditures", FarmUserOnly),
    guarded("/farm/:farmId/sales", FarmUserOnly),
    guarded("/farm/:farmId/notifications", FarmUserOnly),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: RouteDef,
    pub farm_id: Option<u64>,
}

impl RouteMatch {
    /// What the view shows for `state`. Public views always render.
    #[must_use]
    pub fn outcome(&self, state: &SessionState) -> GuardOutcome {
        match self.route.access {
            Access::Public => GuardOutcome::Render,
            Access::Guarded(policy) => guard::evaluate(state, policy),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Matched(RouteMatch),
    Fallback(Route),
}

/// Match `path` against the table. A query string, fragment and trailing
/// slash are ignored.
#[must_use]
pub fn resolve(path: &str) -> Resolution {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    let segments: Vec<&str> = path.split('/').skip(1).collect();

    for route in ROUTES {
        if let Some(farm_id) = match_pattern(route.pattern, &segments) {
            return Resolution::Matched(RouteMatch { route: *route, farm_id });
        }
    }
    tracing::debug!(path, "no route matched; falling back to sign-in");
    Resolution::Fallback(Route::Login)
}

// `Some(farm_id)` on a match; the inner option is the captured id, if any.
#[allow(clippy::option_option)]
fn match_pattern(pattern: &str, segments: &[&str]) -> Option<Option<u64>> {
    let parts: Vec<&str> = pattern.split('/').skip(1).collect();
    if parts.len() != segments.len() {
        return None;
    }
    let mut farm_id = None;
    for (part, segment) in parts.iter().zip(segments) {
        if *part == FARM_ID {
            farm_id = Some(segment.parse::<u64>().ok()?);
        } else if part != segment {
            return None;
        }
    }
    Some(farm_id)
}
