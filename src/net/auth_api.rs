//! `/auth/...` call group.

#[cfg(test)]
#[path = "auth_api_test.rs"]
mod auth_api_test;

use std::sync::Arc;

use serde_json::Value;

use super::client::{ApiClient, ApiRequest, ApiResponse};
use super::error::ApiError;
use super::types::Credentials;

#[derive(Clone, Debug)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// `POST /auth/login/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn login(&self, credentials: &Credentials) -> Result<ApiResponse, ApiError> {
        let body = serde_json::to_value(credentials)?;
        self.client.send(ApiRequest::post("/auth/login/").json(body)).await
    }

    /// `GET /auth/profile/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn profile(&self) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::get("/auth/profile/")).await
    }

    /// `PUT /auth/profile/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn update_profile(&self, user: Value) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::put("/auth/profile/").json(user)).await
    }

    /// `POST /auth/change-password/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn change_password(&self, passwords: Value) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::post("/auth/change-password/").json(passwords)).await
    }

    /// `POST /auth/create-farm-user/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn create_farm_user(&self, user: Value) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::post("/auth/create-farm-user/").json(user)).await
    }

    /// `GET /auth/farm-users/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn farm_users(&self) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::get("/auth/farm-users/")).await
    }

    /// `GET /auth/farm-users/{id}/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn farm_user(&self, user_id: u64) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::get(farm_user_path(user_id))).await
    }

    /// `PUT /auth/farm-users/{id}/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn update_farm_user(&self, user_id: u64, user: Value) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::put(farm_user_path(user_id)).json(user)).await
    }

    /// `DELETE /auth/farm-users/{id}/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn delete_farm_user(&self, user_id: u64) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::delete(farm_user_path(user_id))).await
    }

    // Superuser-only endpoints.

    /// `POST /auth/reset-password/{id}/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn reset_user_password(&self, user_id: u64, passwords: Value) -> Result<ApiResponse, ApiError> {
        let path = format!("/auth/reset-password/{user_id}/");
        self.client.send(ApiRequest::post(path).json(passwords)).await
    }

    /// `GET /auth/all-users/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn all_users(&self) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::get("/auth/all-users/")).await
    }

    /// `GET /auth/admins/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn admins(&self) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::get("/auth/admins/")).await
    }

    /// `POST /auth/create-admin/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn create_admin(&self, user: Value) -> Result<ApiResponse, ApiError> {
        self.client.send(ApiRequest::post("/auth/create-admin/").json(user)).await
    }
}

fn farm_user_path(user_id: u64) -> String {
    format!("/auth/farm-users/{user_id}/")
}
