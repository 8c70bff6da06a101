use std::{collections::BTreeSet, sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::doc,
    error::{ErrorKind, InsertManyError},
    options::IndexOptions,
};
use time::PrimitiveDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    connection::{MongoConfig, establish_connection},
    error::{MongoDaoError, MongoResult},
    models::{MongoGameDocument, MongoPlayerDocument, MongoSessionDocument, doc_id,
        encode_instant, uuid_as_binary},
};
use crate::dao::{
    club_store::ClubStore,
    models::{GameEntity, PlayerEntity, SessionEntity},
    storage::StorageResult,
};

const PLAYER_COLLECTION_NAME: &str = "players";
const GAME_COLLECTION_NAME: &str = "games";
const SESSION_COLLECTION_NAME: &str = "sessions";

/// MongoDB server error code for a rejected unique-index write.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoClubStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoClubStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // One profile per Telegram identity.
        let players = database.collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME);
        let player_index = IndexModel::builder()
            .keys(doc! {"telegram_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("player_telegram_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        players
            .create_index(player_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYER_COLLECTION_NAME,
                index: "telegram_id",
                source,
            })?;

        let games = database.collection::<MongoGameDocument>(GAME_COLLECTION_NAME);
        let game_index = IndexModel::builder()
            .keys(doc! {"recurrence_kind": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_recurrence_idx".to_owned()))
                    .build(),
            )
            .build();
        games
            .create_index(game_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "recurrence_kind",
                source,
            })?;

        // The occurrence-uniqueness invariant lives here: the same game can
        // never hold two sessions at the same instant, whatever the
        // in-process dedup concluded.
        let sessions = database.collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME);
        let session_index = IndexModel::builder()
            .keys(doc! {"game_id": 1, "scheduled_for": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("session_instant_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        sessions
            .create_index(session_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SESSION_COLLECTION_NAME,
                index: "game_id,scheduled_for",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn player_collection(&self) -> Collection<MongoPlayerDocument> {
        self.database()
            .await
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME)
    }

    async fn game_collection(&self) -> Collection<MongoGameDocument> {
        self.database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn session_collection(&self) -> Collection<MongoSessionDocument> {
        self.database()
            .await
            .collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME)
    }

    async fn save_player(&self, player: PlayerEntity) -> MongoResult<()> {
        let id = player.id;
        let document: MongoPlayerDocument = player.into();
        let collection = self.player_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SavePlayer { id, source })?;
        Ok(())
    }

    async fn find_player_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> MongoResult<Option<PlayerEntity>> {
        let collection = self.player_collection().await;
        let document = collection
            .find_one(doc! {"telegram_id": telegram_id})
            .await
            .map_err(|source| MongoDaoError::LoadPlayer {
                telegram_id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn save_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.try_into()?;
        let collection = self.game_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let collection = self.game_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;
        document.map(GameEntity::try_from).transpose()
    }

    async fn list_games(&self, recurring_only: bool) -> MongoResult<Vec<GameEntity>> {
        let filter = if recurring_only {
            doc! {"recurrence_kind": {"$ne": "none"}}
        } else {
            doc! {}
        };

        let collection = self.game_collection().await;
        let documents: Vec<MongoGameDocument> = collection
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        documents.into_iter().map(GameEntity::try_from).collect()
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<()> {
        let sessions = self.session_collection().await;
        sessions
            .delete_many(doc! {"game_id": uuid_as_binary(id)})
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;

        let games = self.game_collection().await;
        games
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;
        Ok(())
    }

    async fn load_sessions_after(
        &self,
        game_id: Uuid,
        after: PrimitiveDateTime,
    ) -> MongoResult<Vec<SessionEntity>> {
        let threshold = encode_instant(after)?;
        let collection = self.session_collection().await;
        let documents: Vec<MongoSessionDocument> = collection
            .find(doc! {
                "game_id": uuid_as_binary(game_id),
                "scheduled_for": {"$gt": threshold},
            })
            .sort(doc! {"scheduled_for": 1})
            .await
            .map_err(|source| MongoDaoError::LoadSessions { game_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadSessions { game_id, source })?;

        documents
            .into_iter()
            .map(SessionEntity::try_from)
            .collect()
    }

    async fn insert_sessions(
        &self,
        game_id: Uuid,
        instants: Vec<PrimitiveDateTime>,
    ) -> MongoResult<usize> {
        if instants.is_empty() {
            return Ok(0);
        }

        let documents: Vec<MongoSessionDocument> = instants
            .into_iter()
            .map(|instant| {
                MongoSessionDocument::try_from(SessionEntity {
                    id: Uuid::new_v4(),
                    game_id,
                    scheduled_for: instant,
                    created_at: SystemTime::now(),
                })
            })
            .collect::<MongoResult<_>>()?;

        let collection = self.session_collection().await;
        match collection.insert_many(&documents).ordered(false).await {
            Ok(outcome) => Ok(outcome.inserted_ids.len()),
            Err(err) => {
                // Unique-index rejections mean another pass (or a racing
                // instance) already wrote those instants; the surviving
                // inserts still count.
                if let ErrorKind::InsertMany(failure) = err.kind.as_ref() {
                    if duplicates_only(failure) {
                        let failed = failure.write_errors.as_ref().map_or(0, Vec::len);
                        return Ok(documents.len() - failed);
                    }
                }
                Err(MongoDaoError::InsertSessions {
                    game_id,
                    source: err,
                })
            }
        }
    }
}

fn duplicates_only(failure: &InsertManyError) -> bool {
    failure.write_concern_error.is_none()
        && failure
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().all(|error| error.code == DUPLICATE_KEY_CODE))
}

impl ClubStore for MongoClubStore {
    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_player(player).await.map_err(Into::into) })
    }

    fn find_player_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_player_by_telegram_id(telegram_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games(false).await.map_err(Into::into) })
    }

    fn list_recurring_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games(true).await.map_err(Into::into) })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn future_session_instants(
        &self,
        game_id: Uuid,
        after: PrimitiveDateTime,
    ) -> BoxFuture<'static, StorageResult<BTreeSet<PrimitiveDateTime>>> {
        let store = self.clone();
        Box::pin(async move {
            let sessions = store.load_sessions_after(game_id, after).await?;
            Ok(sessions
                .into_iter()
                .map(|session| session.scheduled_for)
                .collect())
        })
    }

    fn insert_sessions(
        &self,
        game_id: Uuid,
        instants: Vec<PrimitiveDateTime>,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_sessions(game_id, instants)
                .await
                .map_err(Into::into)
        })
    }

    fn upcoming_sessions(
        &self,
        game_id: Uuid,
        after: PrimitiveDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .load_sessions_after(game_id, after)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
