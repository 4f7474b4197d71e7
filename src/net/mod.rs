//! Backend access: the API client, its call groups and wire types.

pub mod auth_api;
pub mod client;
pub mod error;
pub mod farm_api;
pub mod sequence;
pub mod types;

pub use auth_api::AuthApi;
pub use client::{ApiClient, ApiRequest, ApiResponse, AuthListener, Query};
pub use error::ApiError;
pub use farm_api::{FarmApi, FarmResource, Scope, Upload};
pub use sequence::QueryGeneration;
