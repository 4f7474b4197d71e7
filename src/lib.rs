//! Client core for the farm management backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every consumer (the `farmdesk` binary, or any embedding front end) goes
//! through three pieces:
//!
//! - [`net::ApiClient`]: one configured HTTP entry point that attaches the
//!   stored bearer token per request and turns a 401 into an
//!   "unauthenticated" event.
//! - [`state::SessionStore`]: owns the session (identity + loading flag),
//!   restores it from [`storage`], and performs login/logout.
//! - [`guard`]: derives render/redirect decisions from session state and a
//!   declared [`guard::AccessPolicy`].
//!
//! Dependency order, leaves first: `config` → `storage` → `net` → `state` →
//! `guard` / `routes`.

pub mod config;
pub mod guard;
pub mod navigation;
pub mod net;
pub mod routes;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;
