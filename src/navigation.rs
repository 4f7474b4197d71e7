//! Navigation targets and the hard-redirect seam.

use std::fmt;

/// The cross-cutting navigation targets the session core redirects to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    FarmUserDashboard,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::FarmUserDashboard => "/farm-user-dashboard",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Performs a full navigation that discards in-memory client state.
///
/// In a browser this is a `location.href` assignment; the CLI reports that
/// the user has to sign in again.
pub trait Navigator: Send + Sync {
    fn hard_redirect(&self, route: Route);
}
