//! Persisted session storage.
//!
//! DESIGN
//! ======
//! Three keys survive restarts: `access_token`, `refresh_token` and `user`
//! (the JSON identity). Credential and identity are only ever written
//! together through [`SessionStorage::write_session`], so a crash can no
//! longer leave a token without its identity or the reverse.
//!
//! Readers (the API client on every request, the session store on restore)
//! go through [`SessionStorage::get`] and always see the latest value.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// One persisted storage entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    User,
}

impl StorageKey {
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::User];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::User => "user",
        }
    }
}

/// The credential + identity record written on login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    /// JSON-serialized identity.
    pub user: String,
}

impl StoredSession {
    pub(crate) fn entries(&self) -> [(StorageKey, &str); 3] {
        [
            (StorageKey::AccessToken, self.access_token.as_str()),
            (StorageKey::RefreshToken, self.refresh_token.as_str()),
            (StorageKey::User, self.user.as_str()),
        ]
    }
}

/// Errors produced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key/value store backing the session. Writes go through
/// [`SessionStorage::write_session`] only, so the credential and the identity
/// never land separately.
pub trait SessionStorage: Send + Sync {
    /// Read one entry.
    fn get(&self, key: StorageKey) -> Option<String>;

    /// Replace all three entries in a single write.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the record.
    fn write_session(&self, session: &StoredSession) -> Result<(), StorageError>;

    /// Remove every entry. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot remove persisted data.
    fn clear(&self) -> Result<(), StorageError>;

    /// The stored access token, if present and non-empty.
    fn access_token(&self) -> Option<String> {
        self.get(StorageKey::AccessToken).filter(|token| !token.is_empty())
    }
}
