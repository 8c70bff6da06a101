use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::SessionEntity, dto::format_instant};

/// Public projection of one materialized session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Stable identifier of the session.
    pub id: Uuid,
    /// Game this session belongs to.
    pub game_id: Uuid,
    /// Wall-clock instant of the session, wire format.
    pub scheduled_for: String,
}

impl From<SessionEntity> for SessionSummary {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            scheduled_for: format_instant(value.scheduled_for),
        }
    }
}
