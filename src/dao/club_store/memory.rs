//! In-memory [`ClubStore`] test double shared by driver, service, and
//! router tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use futures::FutureExt;
use futures::future::BoxFuture;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::dao::{
    club_store::ClubStore,
    models::{GameEntity, PlayerEntity, SessionEntity},
    storage::{StorageError, StorageResult},
};
use crate::scheduling::recurrence::RecurrenceKind;

/// Fully in-process store; cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    players: Mutex<Vec<PlayerEntity>>,
    games: Mutex<Vec<GameEntity>>,
    sessions: Mutex<HashMap<Uuid, BTreeSet<PrimitiveDateTime>>>,
    failing_games: Mutex<HashSet<Uuid>>,
}

impl MemoryStore {
    /// Seed a player without going through the trait.
    pub fn add_player(&self, player: PlayerEntity) {
        self.inner.players.lock().unwrap().push(player);
    }

    /// Make every session operation on `game_id` fail.
    pub fn fail_game(&self, game_id: Uuid) {
        self.inner.failing_games.lock().unwrap().insert(game_id);
    }

    /// Stored session instants of a game, ascending.
    pub fn stored(&self, game_id: Uuid) -> BTreeSet<PrimitiveDateTime> {
        self.inner
            .sessions
            .lock()
            .unwrap()
            .get(&game_id)
            .cloned()
            .unwrap_or_default()
    }

    fn fail_check(&self, game_id: Uuid) -> StorageResult<()> {
        if self.inner.failing_games.lock().unwrap().contains(&game_id) {
            return Err(StorageError::conflict("induced failure".into()));
        }
        Ok(())
    }
}

impl ClubStore for MemoryStore {
    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        async move {
            let mut players = store.inner.players.lock().unwrap();
            if let Some(existing) = players.iter_mut().find(|p| p.id == player.id) {
                *existing = player;
            } else {
                players.push(player);
            }
            Ok(())
        }
        .boxed()
    }

    fn find_player_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        async move {
            let players = store.inner.players.lock().unwrap();
            Ok(players
                .iter()
                .find(|p| p.telegram_id == telegram_id)
                .cloned())
        }
        .boxed()
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        async move {
            let mut games = store.inner.games.lock().unwrap();
            if let Some(existing) = games.iter_mut().find(|g| g.id == game.id) {
                *existing = game;
            } else {
                games.push(game);
            }
            Ok(())
        }
        .boxed()
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        async move {
            let games = store.inner.games.lock().unwrap();
            Ok(games.iter().find(|g| g.id == id).cloned())
        }
        .boxed()
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        async move { Ok(store.inner.games.lock().unwrap().clone()) }.boxed()
    }

    fn list_recurring_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        async move {
            let games = store.inner.games.lock().unwrap();
            Ok(games
                .iter()
                .filter(|g| g.recurrence.kind != RecurrenceKind::None)
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        async move {
            store.inner.games.lock().unwrap().retain(|g| g.id != id);
            store.inner.sessions.lock().unwrap().remove(&id);
            Ok(())
        }
        .boxed()
    }

    fn future_session_instants(
        &self,
        game_id: Uuid,
        after: PrimitiveDateTime,
    ) -> BoxFuture<'static, StorageResult<BTreeSet<PrimitiveDateTime>>> {
        let result = self.fail_check(game_id).map(|()| {
            self.stored(game_id)
                .into_iter()
                .filter(|instant| *instant > after)
                .collect()
        });
        async move { result }.boxed()
    }

    fn insert_sessions(
        &self,
        game_id: Uuid,
        instants: Vec<PrimitiveDateTime>,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let result = self.fail_check(game_id).map(|()| {
            let mut guard = self.inner.sessions.lock().unwrap();
            let stored = guard.entry(game_id).or_default();
            // Mirrors the unique index: duplicates are skipped, not errors.
            instants
                .into_iter()
                .filter(|instant| stored.insert(*instant))
                .count()
        });
        async move { result }.boxed()
    }

    fn upcoming_sessions(
        &self,
        game_id: Uuid,
        after: PrimitiveDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let sessions = self
            .stored(game_id)
            .into_iter()
            .filter(|instant| *instant > after)
            .map(|instant| SessionEntity {
                id: Uuid::new_v4(),
                game_id,
                scheduled_for: instant,
                created_at: SystemTime::now(),
            })
            .collect();
        async move { Ok(sessions) }.boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        async { Ok(()) }.boxed()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        async { Ok(()) }.boxed()
    }
}
