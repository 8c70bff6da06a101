use std::time::SystemTime;

use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::scheduling::recurrence::RecurrenceRule;

/// Registered club member shared across layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Primary key of the player.
    pub id: Uuid,
    /// Numeric Telegram user id the player authenticates as; unique.
    pub telegram_id: i64,
    /// Display name taken from the registration request.
    pub name: String,
    /// Whether this player may create and manage games.
    pub host: bool,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
}

/// Recurring (or one-off) poker game owned by a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name of the game.
    pub name: String,
    /// Player who created the game.
    pub host_id: Uuid,
    /// How and when the game repeats.
    pub recurrence: RecurrenceRule,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    pub updated_at: SystemTime,
}

/// One concrete, dated session of a game.
///
/// Written by the recurrence engine (or the first-session seed at game
/// creation) and never mutated afterwards; `(game_id, scheduled_for)` is
/// unique, enforced by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntity {
    /// Primary key of the session.
    pub id: Uuid,
    /// Game this session belongs to.
    pub game_id: Uuid,
    /// Wall-clock instant in the operating offset.
    pub scheduled_for: PrimitiveDateTime,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
}
