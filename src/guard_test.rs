use super::*;
use serde_json::json;

use crate::test_support::{admin, agronomist, farm_user, identity, superuser};

fn signed_in(identity: crate::net::types::Identity) -> SessionState {
    SessionState::Authenticated(identity)
}

// =============================================================================
// DECISION TABLE
// =============================================================================

#[test]
fn restoring_session_shows_loading_for_every_policy() {
    for policy in [
        AccessPolicy::AnyAuthenticated,
        AccessPolicy::AdminOrSuperuser,
        AccessPolicy::SuperuserOnly,
        AccessPolicy::FarmUserOnly,
    ] {
        assert_eq!(evaluate(&SessionState::Initializing, policy), GuardOutcome::Loading);
    }
}

#[test]
fn signed_out_redirects_to_login() {
    assert_eq!(evaluate(&SessionState::Unauthenticated, AccessPolicy::AnyAuthenticated), GuardOutcome::Redirect(Route::Login));
    assert_eq!(evaluate(&SessionState::Unauthenticated, AccessPolicy::SuperuserOnly), GuardOutcome::Redirect(Route::Login));
}

#[test]
fn farm_user_on_admin_route_goes_to_farm_dashboard() {
    assert_eq!(
        evaluate(&signed_in(farm_user()), AccessPolicy::AdminOrSuperuser),
        GuardOutcome::Redirect(Route::FarmUserDashboard)
    );
}

#[test]
fn admin_on_farm_user_route_goes_to_dashboard() {
    assert_eq!(evaluate(&signed_in(admin()), AccessPolicy::FarmUserOnly), GuardOutcome::Redirect(Route::Dashboard));
}

#[test]
fn admin_on_superuser_route_goes_to_dashboard() {
    assert_eq!(evaluate(&signed_in(admin()), AccessPolicy::SuperuserOnly), GuardOutcome::Redirect(Route::Dashboard));
}

#[test]
fn superuser_renders_admin_and_superuser_routes() {
    assert_eq!(evaluate(&signed_in(superuser()), AccessPolicy::AdminOrSuperuser), GuardOutcome::Render);
    assert_eq!(evaluate(&signed_in(superuser()), AccessPolicy::SuperuserOnly), GuardOutcome::Render);
}

#[test]
fn agronomist_counts_as_staff() {
    assert_eq!(evaluate(&signed_in(agronomist()), AccessPolicy::AdminOrSuperuser), GuardOutcome::Render);
    assert_eq!(evaluate(&signed_in(agronomist()), AccessPolicy::SuperuserOnly), GuardOutcome::Redirect(Route::Dashboard));
}

#[test]
fn unknown_role_on_admin_route_goes_to_login() {
    let visitor = identity(json!({ "username": "v", "user_type": "visitor" }));
    assert_eq!(evaluate(&signed_in(visitor.clone()), AccessPolicy::AdminOrSuperuser), GuardOutcome::Redirect(Route::Login));
    assert_eq!(evaluate(&signed_in(visitor), AccessPolicy::AnyAuthenticated), GuardOutcome::Render);
}

#[test]
fn farm_user_renders_farm_routes() {
    assert_eq!(evaluate(&signed_in(farm_user()), AccessPolicy::FarmUserOnly), GuardOutcome::Render);
    assert_eq!(evaluate(&signed_in(farm_user()), AccessPolicy::AnyAuthenticated), GuardOutcome::Render);
}

// =============================================================================
// REACTIVITY
// =============================================================================

#[tokio::test]
async fn guard_follows_session_changes() {
    let (tx, mut rx) = watch::channel(SessionState::Initializing);
    let guard = RouteGuard::new(AccessPolicy::AdminOrSuperuser);
    assert_eq!(guard.current(&rx), GuardOutcome::Loading);

    tx.send_replace(signed_in(admin()));
    assert_eq!(guard.next_outcome(&mut rx).await, Some(GuardOutcome::Render));

    tx.send_replace(SessionState::Unauthenticated);
    assert_eq!(guard.next_outcome(&mut rx).await, Some(GuardOutcome::Redirect(Route::Login)));

    drop(tx);
    assert_eq!(guard.next_outcome(&mut rx).await, None);
}

#[tokio::test]
async fn settle_waits_for_restore() {
    let (tx, mut rx) = watch::channel(SessionState::Initializing);
    let guard = RouteGuard::new(AccessPolicy::FarmUserOnly);

    let waiter = tokio::spawn(async move { guard.settle(&mut rx).await });
    tokio::task::yield_now().await;
    tx.send_replace(signed_in(farm_user()));

    assert_eq!(waiter.await.unwrap(), GuardOutcome::Render);
}
