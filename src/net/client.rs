//! The single HTTP entry point for backend calls.
//!
//! DESIGN
//! ======
//! - The access token is read from [`SessionStorage`] immediately before
//!   each send. Nothing is captured at construction, so a login or logout
//!   takes effect on the very next request.
//! - A 401 is never handled by the caller. The client notifies its
//!   [`AuthListener`]s (the session store) which reset the session; the call
//!   still fails with [`ApiError::Unauthenticated`] so the caller stops.
//! - Every other response is handed back untouched: no retry, no cache, no
//!   body transformation.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::{Arc, Mutex, Weak};

use reqwest::header::HeaderMap;
use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use crate::storage::SessionStorage;

/// Query-string pairs, appended in order.
pub type Query = Vec<(String, String)>;

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Form),
}

/// One backend call: method, path relative to the base URL, query and body.
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Query,
    body: RequestBody,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Query::new(), body: RequestBody::Empty }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query.extend(query);
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    #[must_use]
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}

/// A 2xx backend response, unmodified.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Decode the body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode the body as loose JSON. An empty body (e.g. `204`) is `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if a non-empty body is not JSON.
    pub fn value(&self) -> Result<Value, ApiError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        self.json()
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Receives the client's "credential rejected" event.
pub trait AuthListener: Send + Sync {
    fn on_unauthenticated(&self);
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    storage: Arc<dyn SessionStorage>,
    listeners: Mutex<Vec<Weak<dyn AuthListener>>>,
}

impl ApiClient {
    /// Build a client for `base_url` (e.g. `http://127.0.0.1:8000/api`).
    #[must_use]
    pub fn new(base_url: impl Into<String>, storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, storage)
    }

    /// Build a client around a preconfigured `reqwest::Client`.
    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>, storage: Arc<dyn SessionStorage>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url, storage, listeners: Mutex::new(Vec::new()) }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Register a listener for rejected credentials. Held weakly, so a dropped
    /// listener simply stops receiving events.
    pub fn subscribe(&self, listener: Weak<dyn AuthListener>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        listeners.retain(|existing| existing.strong_count() > 0);
        listeners.push(listener);
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Send one request with the current bearer token attached.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Network`] if no response arrived
    /// - [`ApiError::Unauthenticated`] on 401, after listeners were notified
    /// - [`ApiError::Status`] for any other non-2xx status
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let ApiRequest { method, path, query, body } = request;
        let mut builder = self.http.request(method.clone(), self.url(&path));
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = self.storage.access_token() {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        tracing::debug!(%method, %path, "api request");
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        tracing::debug!(%method, %path, status = status.as_u16(), "api response");

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, %path, "credential rejected; resetting session");
            self.handle_unauthenticated();
            return Err(ApiError::Unauthenticated { body: String::from_utf8_lossy(&body).into_owned() });
        }
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), body: String::from_utf8_lossy(&body).into_owned() });
        }
        Ok(ApiResponse { status: status.as_u16(), headers, body })
    }

    fn handle_unauthenticated(&self) {
        let live: Vec<Arc<dyn AuthListener>> = {
            let mut listeners = self.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            listeners.retain(|listener| listener.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        // Nobody owns the session; the credential still must not survive.
        if live.is_empty() {
            if let Err(e) = self.storage.clear() {
                tracing::error!(error = %e, "failed to clear rejected credential");
            }
            return;
        }
        for listener in live {
            listener.on_unauthenticated();
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}
