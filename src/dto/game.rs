use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::GameEntity,
    dto::{format_instant, format_system_time},
    scheduling::recurrence::RecurrenceKind,
};

/// Payload used to register a new game and its recurrence rule.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    /// Display name of the game.
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Repetition pattern; `none` registers a one-off game.
    pub recurrence: RecurrenceKind,
    /// First intended session, local wall-clock time.
    #[schema(example = "2024-03-08 19:30")]
    pub first_session_at: String,
}

/// Public projection of a game and its recurrence rule.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    /// Stable identifier of the game.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Player who created the game.
    pub host_id: Uuid,
    /// Repetition pattern.
    pub recurrence: RecurrenceKind,
    /// Anchor instant of the recurrence rule, wire format.
    pub first_session_at: String,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl From<GameEntity> for GameSummary {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            host_id: value.host_id,
            recurrence: value.recurrence.kind,
            first_session_at: format_instant(value.recurrence.anchor),
            created_at: format_system_time(value.created_at),
        }
    }
}
