//! `/farms/...` call group.
//!
//! DESIGN
//! ======
//! Farm records (tasks, crop stages, fertigations, ...) share one URL shape,
//! so they are addressed as a [`FarmResource`] inside a [`Scope`]:
//!
//! - `Scope::Global`   → `/farms/<segment>/`        (legacy admin endpoints)
//! - `Scope::Farm(id)` → `/farms/<id>/<segment>/`   (per-farm, isolated data)
//!
//! Payloads are opaque JSON. Operations a resource does not expose fail with
//! [`ApiError::Unsupported`] before anything is sent.

#[cfg(test)]
#[path = "farm_api_test.rs"]
mod farm_api_test;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value, json};

use super::client::{ApiClient, ApiRequest, ApiResponse, Query};
use super::error::ApiError;

// =============================================================================
// RESOURCES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FarmResource {
    DailyTasks,
    Notifications,
    SprayIrrigationLogs,
    CropStages,
    Fertigations,
    SpraySchedules,
    Workers,
    WorkerTasks,
    IssueReports,
    Expenditures,
    Sales,
}

impl FarmResource {
    pub const ALL: [Self; 11] = [
        Self::DailyTasks,
        Self::Notifications,
        Self::SprayIrrigationLogs,
        Self::CropStages,
        Self::Fertigations,
        Self::SpraySchedules,
        Self::Workers,
        Self::WorkerTasks,
        Self::IssueReports,
        Self::Expenditures,
        Self::Sales,
    ];

    /// URL path segment, also the name accepted by [`FromStr`].
    #[must_use]
    pub fn segment(self) -> &'static str {
        match self {
            Self::DailyTasks => "daily-tasks",
            Self::Notifications => "notifications",
            Self::SprayIrrigationLogs => "spray-irrigation-logs",
            Self::CropStages => "crop-stages",
            Self::Fertigations => "fertigations",
            Self::SpraySchedules => "spray-schedules",
            Self::Workers => "workers",
            Self::WorkerTasks => "worker-tasks",
            Self::IssueReports => "issue-reports",
            Self::Expenditures => "expenditures",
            Self::Sales => "sales",
        }
    }

    /// Whether `/<segment>/<id>/` exists (get, update, delete).
    #[must_use]
    pub fn has_item_routes(self) -> bool {
        !matches!(self, Self::DailyTasks | Self::Notifications | Self::SprayIrrigationLogs)
    }

    /// Whether the global scope exposes `/<segment>/analytics/`.
    #[must_use]
    pub fn has_analytics(self) -> bool {
        matches!(self, Self::Fertigations | Self::SpraySchedules | Self::WorkerTasks | Self::Expenditures | Self::Sales)
    }
}

impl fmt::Display for FarmResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown farm resource '{0}'")]
pub struct UnknownResource(pub String);

impl FromStr for FarmResource {
    type Err = UnknownResource;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|resource| resource.segment() == wanted)
            .ok_or_else(|| UnknownResource(raw.to_owned()))
    }
}

/// Where a record lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Global,
    Farm(u64),
}

#[must_use]
pub fn collection_path(scope: Scope, resource: FarmResource) -> String {
    match scope {
        Scope::Global => format!("/farms/{}/", resource.segment()),
        Scope::Farm(farm_id) => format!("/farms/{farm_id}/{}/", resource.segment()),
    }
}

#[must_use]
pub fn item_path(scope: Scope, resource: FarmResource, id: u64) -> String {
    format!("{}{id}/", collection_path(scope, resource))
}

/// A file to upload as one multipart part.
#[derive(Clone, Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl Upload {
    fn into_part(self) -> Result<Part, ApiError> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.mime {
            Some(mime) => part.mime_str(&mime).map_err(|e| ApiError::InvalidBody(e.to_string())),
            None => Ok(part),
        }
    }
}

/// Text fields of a JSON object as multipart parts; nulls are skipped.
fn form_from_fields(fields: &Map<String, Value>) -> Form {
    fields.iter().fold(Form::new(), |form, (name, value)| match value {
        Value::Null => form,
        Value::String(text) => form.text(name.clone(), text.clone()),
        other => form.text(name.clone(), other.to_string()),
    })
}

// =============================================================================
// CALL GROUP
// =============================================================================

#[derive(Clone, Debug)]
pub struct FarmApi {
    client: Arc<ApiClient>,
}

impl FarmApi {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.client.send(request).await
    }

    // ----- farms ------------------------------------------------------------

    /// `GET /farms/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn list_farms(&self) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get("/farms/")).await
    }

    /// `POST /farms/create/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn create_farm(&self, farm: Value) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::post("/farms/create/").json(farm)).await
    }

    /// `GET /farms/{id}/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn farm(&self, farm_id: u64) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get(format!("/farms/{farm_id}/"))).await
    }

    /// `PUT /farms/{id}/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn update_farm(&self, farm_id: u64, farm: Value) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::put(format!("/farms/{farm_id}/")).json(farm)).await
    }

    /// `DELETE /farms/{id}/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn delete_farm(&self, farm_id: u64) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::delete(format!("/farms/{farm_id}/"))).await
    }

    /// `GET /farms/my-farms/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn my_farms(&self) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get("/farms/my-farms/")).await
    }

    /// `GET /farms/dashboard/`, the farm user's overview across assigned farms.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn farm_user_dashboard(&self) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get("/farms/dashboard/")).await
    }

    /// `GET /farms/my-notifications/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn my_notifications(&self, query: Query) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get("/farms/my-notifications/").query(query)).await
    }

    /// `GET /farms/{id}/dashboard/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn farm_dashboard(&self, farm_id: u64) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get(format!("/farms/{farm_id}/dashboard/"))).await
    }

    /// `GET /farms/worker-dashboard/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn worker_dashboard_summary(&self) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get("/farms/worker-dashboard/")).await
    }

    /// `GET /farms/admin/notifications/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn admin_notifications(&self) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get("/farms/admin/notifications/")).await
    }

    /// `POST /farms/admin/notifications/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn send_admin_notification(&self, notification: Value) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::post("/farms/admin/notifications/").json(notification)).await
    }

    // ----- records ----------------------------------------------------------

    /// `GET <collection>`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn list(&self, scope: Scope, resource: FarmResource, query: Query) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get(collection_path(scope, resource)).query(query)).await
    }

    /// `POST <collection>`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn create(&self, scope: Scope, resource: FarmResource, record: Value) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::post(collection_path(scope, resource)).json(record)).await
    }

    /// `GET <collection>{id}/`
    ///
    /// # Errors
    ///
    /// [`ApiError::Unsupported`] for resources without item routes; otherwise
    /// propagates [`ApiError`] from the client.
    pub async fn get(&self, scope: Scope, resource: FarmResource, id: u64) -> Result<ApiResponse, ApiError> {
        require_item_routes(resource, "get")?;
        self.send(ApiRequest::get(item_path(scope, resource, id))).await
    }

    /// `PUT <collection>{id}/`
    ///
    /// # Errors
    ///
    /// [`ApiError::Unsupported`] for resources without item routes; otherwise
    /// propagates [`ApiError`] from the client.
    pub async fn update(&self, scope: Scope, resource: FarmResource, id: u64, record: Value) -> Result<ApiResponse, ApiError> {
        require_item_routes(resource, "update")?;
        self.send(ApiRequest::put(item_path(scope, resource, id)).json(record)).await
    }

    /// `DELETE <collection>{id}/`
    ///
    /// # Errors
    ///
    /// [`ApiError::Unsupported`] for resources without item routes; otherwise
    /// propagates [`ApiError`] from the client.
    pub async fn delete(&self, scope: Scope, resource: FarmResource, id: u64) -> Result<ApiResponse, ApiError> {
        require_item_routes(resource, "delete")?;
        self.send(ApiRequest::delete(item_path(scope, resource, id))).await
    }

    /// `GET /farms/<segment>/analytics/`
    ///
    /// # Errors
    ///
    /// [`ApiError::Unsupported`] for resources without analytics; otherwise
    /// propagates [`ApiError`] from the client.
    pub async fn analytics(&self, resource: FarmResource, query: Query) -> Result<ApiResponse, ApiError> {
        if !resource.has_analytics() {
            return Err(ApiError::Unsupported { operation: "analytics", resource: resource.segment() });
        }
        let path = format!("{}analytics/", collection_path(Scope::Global, resource));
        self.send(ApiRequest::get(path).query(query)).await
    }

    /// Mark notifications read: `PUT <notifications>` with `notification_ids`.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn mark_notifications_read(&self, scope: Scope, notification_ids: &[u64]) -> Result<ApiResponse, ApiError> {
        let path = collection_path(scope, FarmResource::Notifications);
        self.send(ApiRequest::put(path).json(json!({ "notification_ids": notification_ids }))).await
    }

    /// `DELETE /farms/notifications/` with a JSON body selecting what to drop.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn delete_notifications(&self, selection: Value) -> Result<ApiResponse, ApiError> {
        let path = collection_path(Scope::Global, FarmResource::Notifications);
        self.send(ApiRequest::delete(path).json(selection)).await
    }

    // ----- uploads and exports ----------------------------------------------

    /// Create an issue report as multipart form data with an optional photo
    /// sent as `photo_evidence`.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidBody`] if the photo's mime type is malformed;
    /// otherwise propagates [`ApiError`] from the client.
    pub async fn create_issue_report(&self, scope: Scope, fields: &Map<String, Value>, photo: Option<Upload>) -> Result<ApiResponse, ApiError> {
        let mut form = form_from_fields(fields);
        if let Some(photo) = photo {
            form = form.part("photo_evidence", photo.into_part()?);
        }
        let path = collection_path(scope, FarmResource::IssueReports);
        self.send(ApiRequest::post(path).multipart(form)).await
    }

    /// `POST /farms/crop-stages/import/` with the spreadsheet as `file`.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidBody`] if the mime type is malformed; otherwise
    /// propagates [`ApiError`] from the client.
    pub async fn import_crop_stages(&self, file: Upload) -> Result<ApiResponse, ApiError> {
        let form = Form::new().part("file", file.into_part()?);
        self.send(ApiRequest::post("/farms/crop-stages/import/").multipart(form)).await
    }

    /// `GET /farms/crop-stages/export/`; the body is the exported file.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn export_crop_stages(&self) -> Result<Vec<u8>, ApiError> {
        let response = self.send(ApiRequest::get("/farms/crop-stages/export/")).await?;
        Ok(response.into_bytes())
    }

    // ----- fertigation schedule ---------------------------------------------

    /// `GET /farms/fertigations/schedule/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn fertigation_schedule(&self, query: Query) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get("/farms/fertigations/schedule/").query(query)).await
    }

    /// `POST /farms/fertigations/schedule/`
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the client.
    pub async fn create_fertigation_schedule(&self, schedule: Value) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::post("/farms/fertigations/schedule/").json(schedule)).await
    }
}

fn require_item_routes(resource: FarmResource, operation: &'static str) -> Result<(), ApiError> {
    if resource.has_item_routes() {
        Ok(())
    } else {
        Err(ApiError::Unsupported { operation, resource: resource.segment() })
    }
}
