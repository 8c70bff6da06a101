use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, PlayerEntity},
    dto::{game::{CreateGameRequest, GameSummary}, parse_instant},
    error::ServiceError,
    scheduling::recurrence::{self, RecurrenceRule},
    state::SharedState,
};

/// Register a new game owned by `host` and seed its first session.
pub async fn create_game(
    state: &SharedState,
    host: &PlayerEntity,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    let game = build_game(host.id, request)?;

    let store = state.require_club_store().await?;
    store.save_game(game.clone()).await?;

    // Seed the first session now so the game has a concrete date before
    // the next scheduler pass.
    let window = state.config().scheduling.first_occurrence_window_days;
    if let Some(instant) = recurrence::first_occurrence(&game.recurrence, window) {
        store.insert_sessions(game.id, vec![instant]).await?;
    }

    Ok(game.into())
}

/// All games known to the club.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_club_store().await?;
    let games = store.list_games().await?;
    Ok(games.into_iter().map(Into::into).collect())
}

/// One game by its identifier.
pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameSummary, ServiceError> {
    let store = state.require_club_store().await?;
    let Some(game) = store.find_game(id).await? else {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    };
    Ok(game.into())
}

/// Delete a game and all of its sessions. Only the owning host may do so.
pub async fn delete_game(
    state: &SharedState,
    host: &PlayerEntity,
    id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_club_store().await?;
    let Some(game) = store.find_game(id).await? else {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    };
    if game.host_id != host.id {
        return Err(ServiceError::Forbidden(
            "only the owning host can delete a game".into(),
        ));
    }
    store.delete_game(id).await?;
    Ok(())
}

fn build_game(host_id: Uuid, request: CreateGameRequest) -> Result<GameEntity, ServiceError> {
    let CreateGameRequest {
        name,
        recurrence,
        first_session_at,
    } = request;

    if name.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "game name must not be empty".into(),
        ));
    }

    let anchor = parse_instant(&first_session_at).map_err(|_| {
        ServiceError::InvalidInput(format!(
            "`{first_session_at}` is not a valid instant (expected `YYYY-MM-DD HH:MM`)"
        ))
    })?;

    let now = SystemTime::now();
    Ok(GameEntity {
        id: Uuid::new_v4(),
        name: name.trim().to_owned(),
        host_id,
        recurrence: RecurrenceRule {
            kind: recurrence,
            anchor,
        },
        created_at: now,
        updated_at: now,
    })
}
