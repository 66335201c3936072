use serde::Serialize;
use utoipa::ToSchema;

/// Body of `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" while no storage backend is installed.
    pub status: String,
}

impl HealthResponse {
    pub fn from_degraded(degraded: bool) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" }.to_string(),
        }
    }
}
