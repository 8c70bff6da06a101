#[cfg(test)]
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::collections::BTreeSet;

use futures::future::BoxFuture;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::dao::models::{GameEntity, PlayerEntity, SessionEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for players, games, and sessions.
pub trait ClubStore: Send + Sync {
    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_player_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Games whose recurrence kind is not `none`, i.e. the scheduler's
    /// working set.
    fn list_recurring_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Delete a game together with all of its sessions.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// Instants of the game's sessions scheduled strictly after `after`.
    fn future_session_instants(
        &self,
        game_id: Uuid,
        after: PrimitiveDateTime,
    ) -> BoxFuture<'static, StorageResult<BTreeSet<PrimitiveDateTime>>>;
    /// Bulk-insert sessions at the given instants, skipping instants the
    /// uniqueness constraint rejects; returns the number actually written.
    fn insert_sessions(
        &self,
        game_id: Uuid,
        instants: Vec<PrimitiveDateTime>,
    ) -> BoxFuture<'static, StorageResult<usize>>;
    /// Full session records scheduled after `after`, ascending.
    fn upcoming_sessions(
        &self,
        game_id: Uuid,
        after: PrimitiveDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
