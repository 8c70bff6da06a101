use serde::Serialize;
use time::PrimitiveDateTime;
use utoipa::ToSchema;

use crate::dto::format_instant;

/// Health report returned by `/healthcheck`: overall status plus the
/// last completed scheduler pass.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    /// Completion instant of the last scheduler pass, wire format.
    /// Absent until the first pass has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "2024-03-08 05:00")]
    pub last_pass_at: Option<String>,
}

impl HealthResponse {
    /// Build the report from the degraded flag and the last pass instant.
    pub fn report(degraded: bool, last_pass: Option<PrimitiveDateTime>) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" }.to_owned(),
            last_pass_at: last_pass.map(format_instant),
        }
    }
}
