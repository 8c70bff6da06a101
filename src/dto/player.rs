use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::PlayerEntity;

/// Payload used by a verified caller to register as a club player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterPlayerRequest {
    /// Display name shown to other players.
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// Public projection of a player profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Stable identifier of the player.
    pub id: Uuid,
    /// Telegram identity the player authenticates as.
    pub telegram_id: i64,
    /// Display name.
    pub name: String,
    /// Whether the player may create and manage games.
    pub host: bool,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            telegram_id: value.telegram_id,
            name: value.name,
            host: value.host,
        }
    }
}
