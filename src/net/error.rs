//! Errors returned by API calls.

/// Errors produced by [`super::ApiClient`] and the resource call groups.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend rejected the credential. The session has already been
    /// reset by the time the caller sees this.
    #[error("not authenticated")]
    Unauthenticated { body: String },

    /// Any other non-2xx status, body passed through unmodified.
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    /// A 2xx body did not have the expected shape.
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The resource has no such endpoint; nothing was sent.
    #[error("{resource} does not support {operation}")]
    Unsupported { operation: &'static str, resource: &'static str },

    /// A request body could not be built (unreadable upload, bad mime type).
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the backend responded.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::Unsupported { .. } | Self::InvalidBody(_) => None,
        }
    }

    /// Response body carried by the error, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated { body } | Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
