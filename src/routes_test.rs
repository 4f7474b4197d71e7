use super::*;

use crate::test_support::{admin, farm_user};

fn matched(path: &str) -> RouteMatch {
    match resolve(path) {
        Resolution::Matched(m) => m,
        Resolution::Fallback(route) => panic!("{path} fell back to {route}"),
    }
}

#[test]
fn every_pattern_is_unique() {
    let mut patterns: Vec<&str> = ROUTES.iter().map(|r| r.pattern).collect();
    patterns.sort_unstable();
    patterns.dedup();
    assert_eq!(patterns.len(), ROUTES.len());
}

#[test]
fn login_is_public() {
    let m = matched("/login");
    assert_eq!(m.route.access, Access::Public);
    assert_eq!(m.outcome(&SessionState::Unauthenticated), GuardOutcome::Render);
}

#[test]
fn policies_follow_the_table() {
    assert_eq!(matched("/dashboard").route.access, Access::Guarded(AccessPolicy::AnyAuthenticated));
    assert_eq!(matched("/admin/notification-manager").route.access, Access::Guarded(AccessPolicy::AdminOrSuperuser));
    assert_eq!(matched("/user-management").route.access, Access::Guarded(AccessPolicy::SuperuserOnly));
    assert_eq!(matched("/my-farms").route.access, Access::Guarded(AccessPolicy::FarmUserOnly));
}

#[test]
fn farm_scoped_route_captures_id() {
    let m = matched("/farm/42/spray-schedules");
    assert_eq!(m.farm_id, Some(42));
    assert_eq!(m.route.pattern, "/farm/:farmId/spray-schedules");
    assert_eq!(matched("/farms").farm_id, None);
}

#[test]
fn non_numeric_farm_id_falls_back() {
    assert_eq!(resolve("/farm/abc/dashboard"), Resolution::Fallback(Route::Login));
}

#[test]
fn root_and_unknown_paths_fall_back_to_login() {
    assert_eq!(resolve("/"), Resolution::Fallback(Route::Login));
    assert_eq!(resolve(""), Resolution::Fallback(Route::Login));
    assert_eq!(resolve("/nowhere"), Resolution::Fallback(Route::Login));
    assert_eq!(resolve("/farm/1"), Resolution::Fallback(Route::Login));
}

#[test]
fn query_and_trailing_slash_are_ignored() {
    assert_eq!(matched("/dashboard/").route.pattern, "/dashboard");
    assert_eq!(matched("/farms?page=2#top").route.pattern, "/farms");
}

#[test]
fn outcome_applies_the_route_policy() {
    let farm = SessionState::Authenticated(farm_user());
    let staff = SessionState::Authenticated(admin());

    assert_eq!(matched("/create-farm").outcome(&farm), GuardOutcome::Redirect(Route::FarmUserDashboard));
    assert_eq!(matched("/create-farm").outcome(&staff), GuardOutcome::Render);
    assert_eq!(matched("/farm/3/sales").outcome(&staff), GuardOutcome::Redirect(Route::Dashboard));
    assert_eq!(matched("/profile").outcome(&SessionState::Initializing), GuardOutcome::Loading);
}
