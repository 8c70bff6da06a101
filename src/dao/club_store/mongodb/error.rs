use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save player `{id}`")]
    SavePlayer {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load player by telegram id `{telegram_id}`")]
    LoadPlayer {
        telegram_id: i64,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game `{id}`")]
    SaveGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game `{id}`")]
    LoadGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete game `{id}`")]
    DeleteGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load sessions for game `{game_id}`")]
    LoadSessions {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert sessions for game `{game_id}`")]
    InsertSessions {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("stored instant `{value}` is not in the expected format")]
    CorruptInstant { value: String },
    #[error("failed to render an instant for storage")]
    EncodeInstant {
        #[source]
        source: time::error::Format,
    },
}
