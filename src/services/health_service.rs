use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Build the health report, logging connectivity issues along the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_club_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::report(state.is_degraded().await, state.last_pass().await)
}
