//! Authorization predicates in one place.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views and commands consume these booleans instead of re-deriving access
//! from raw identity fields.

#[cfg(test)]
#[path = "capabilities_test.rs"]
mod capabilities_test;

use crate::net::types::{Identity, UserType};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub is_agronomist: bool,
    pub is_farm_user: bool,
    pub is_superuser: bool,
}

impl Capabilities {
    /// Derive capabilities for the current identity; `None` grants nothing.
    #[must_use]
    pub fn of(identity: Option<&Identity>) -> Self {
        let Some(identity) = identity else {
            return Self::default();
        };
        Self {
            is_authenticated: true,
            is_admin: identity.is_user_type(&UserType::Admin),
            is_agronomist: identity.is_user_type(&UserType::Agronomist),
            is_farm_user: identity.is_user_type(&UserType::FarmUser),
            is_superuser: identity.is_superuser,
        }
    }

    /// Admin-level staff: legacy admins, agronomists and superusers.
    #[must_use]
    pub fn is_staff(self) -> bool {
        self.is_admin || self.is_agronomist || self.is_superuser
    }

    /// Create admins, list all users, reset passwords.
    #[must_use]
    pub fn can_manage_users(self) -> bool {
        self.is_superuser
    }

    #[must_use]
    pub fn can_manage_farm_users(self) -> bool {
        self.is_staff()
    }

    #[must_use]
    pub fn can_manage_farms(self) -> bool {
        self.is_staff()
    }
}
