//! Wire DTOs for the auth endpoints.
//!
//! DESIGN
//! ======
//! Farm entities (crop stages, fertigations, tasks, ...) stay opaque
//! `serde_json::Value` payloads. Only the identity has a typed shape because
//! role flags are derived from it; unknown fields are kept in `extra` so
//! re-serializing an identity does not drop anything the backend sent.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const GENERIC_LOGIN_FAILURE: &str = "Login failed";

/// Account kind as reported by the backend's `user_type` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserType {
    Admin,
    Agronomist,
    FarmUser,
    /// Any value this client does not know, preserved verbatim.
    Other(String),
}

impl UserType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Agronomist => "agronomist",
            Self::FarmUser => "farm_user",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for UserType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "admin" => Self::Admin,
            "agronomist" => Self::Agronomist,
            "farm_user" => Self::FarmUser,
            _ => Self::Other(raw),
        }
    }
}

impl From<UserType> for String {
    fn from(kind: UserType) -> Self {
        match kind {
            UserType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user's profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub is_superuser: bool,
    /// Fields this client does not interpret (`created_at`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    /// Parse a stored identity. Anything other than a JSON object is rejected.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the value is not a parseable identity.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    #[must_use]
    pub fn is_user_type(&self, kind: &UserType) -> bool {
        self.user_type.as_ref() == Some(kind)
    }

    /// `"First Last"` when either name is set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() { self.username.clone() } else { full }
    }
}

/// Body of `POST /auth/login/`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("username", &self.username).field("password", &"<redacted>").finish()
    }
}

/// Successful login payload. `user` is kept raw so it can be persisted as received.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: Value,
}

/// Best-effort human-readable message from a login error body.
///
/// Uses `non_field_errors[0]` when present, otherwise [`GENERIC_LOGIN_FAILURE`].
#[must_use]
pub fn login_failure_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("non_field_errors"))
        .and_then(|errors| errors.get(0))
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map_or_else(|| GENERIC_LOGIN_FAILURE.to_owned(), str::to_owned)
}
