//! Shared fixtures for unit tests.

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::navigation::{Navigator, Route};
use crate::net::ApiClient;
use crate::net::types::Identity;
use crate::storage::MemoryStorage;

/// Navigator that records every redirect instead of performing it.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<Route> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn hard_redirect(&self, route: Route) {
        self.redirects.lock().unwrap().push(route);
    }
}

pub fn memory_client(base_url: &str) -> (Arc<ApiClient>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let client = Arc::new(ApiClient::new(base_url, storage.clone()));
    (client, storage)
}

pub fn identity(value: serde_json::Value) -> Identity {
    serde_json::from_value(value).unwrap()
}

pub fn farm_user() -> Identity {
    identity(json!({ "id": 7, "username": "grower", "user_type": "farm_user", "is_superuser": false }))
}

pub fn admin() -> Identity {
    identity(json!({ "id": 2, "username": "boss", "user_type": "admin", "is_superuser": false }))
}

pub fn agronomist() -> Identity {
    identity(json!({ "id": 3, "username": "agro", "user_type": "agronomist", "is_superuser": false }))
}

pub fn superuser() -> Identity {
    identity(json!({ "id": 1, "username": "root", "user_type": "agronomist", "is_superuser": true }))
}
