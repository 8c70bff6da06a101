use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{GameEntity, PlayerEntity, SessionEntity},
    scheduling::recurrence::{RecurrenceKind, RecurrenceRule},
};

/// Session instants are stored as sortable wall-clock strings so the
/// compound uniqueness index and `$gt` range queries order them
/// chronologically.
const INSTANT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn encode_instant(instant: PrimitiveDateTime) -> MongoResult<String> {
    instant
        .format(INSTANT_FORMAT)
        .map_err(|source| MongoDaoError::EncodeInstant { source })
}

pub fn decode_instant(value: &str) -> MongoResult<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value, INSTANT_FORMAT).map_err(|_| MongoDaoError::CorruptInstant {
        value: value.to_owned(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    telegram_id: i64,
    name: String,
    host: bool,
    created_at: DateTime,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            telegram_id: value.telegram_id,
            name: value.name,
            host: value.host,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoPlayerDocument> for PlayerEntity {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            id: value.id,
            telegram_id: value.telegram_id,
            name: value.name,
            host: value.host,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    host_id: Uuid,
    recurrence_kind: RecurrenceKind,
    anchor: String,
    created_at: DateTime,
    updated_at: DateTime,
}

impl TryFrom<GameEntity> for MongoGameDocument {
    type Error = MongoDaoError;

    fn try_from(value: GameEntity) -> MongoResult<Self> {
        Ok(Self {
            id: value.id,
            name: value.name,
            host_id: value.host_id,
            recurrence_kind: value.recurrence.kind,
            anchor: encode_instant(value.recurrence.anchor)?,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        })
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> MongoResult<Self> {
        Ok(Self {
            id: value.id,
            name: value.name,
            host_id: value.host_id,
            recurrence: RecurrenceRule {
                kind: value.recurrence_kind,
                anchor: decode_instant(&value.anchor)?,
            },
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    pub game_id: Uuid,
    pub scheduled_for: String,
    created_at: DateTime,
}

impl TryFrom<SessionEntity> for MongoSessionDocument {
    type Error = MongoDaoError;

    fn try_from(value: SessionEntity) -> MongoResult<Self> {
        Ok(Self {
            id: value.id,
            game_id: value.game_id,
            scheduled_for: encode_instant(value.scheduled_for)?,
            created_at: DateTime::from_system_time(value.created_at),
        })
    }
}

impl TryFrom<MongoSessionDocument> for SessionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSessionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: value.id,
            game_id: value.game_id,
            scheduled_for: decode_instant(&value.scheduled_for)?,
            created_at: value.created_at.to_system_time(),
        })
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn instants_roundtrip_and_sort_lexicographically() {
        let earlier = datetime!(2024-03-08 19:30);
        let later = datetime!(2024-11-01 09:05);

        let encoded_earlier = encode_instant(earlier).unwrap();
        let encoded_later = encode_instant(later).unwrap();

        assert_eq!(decode_instant(&encoded_earlier).unwrap(), earlier);
        assert!(encoded_earlier < encoded_later);
    }

    #[test]
    fn corrupt_instant_is_reported() {
        assert!(matches!(
            decode_instant("next friday"),
            Err(MongoDaoError::CorruptInstant { .. })
        ));
    }
}
