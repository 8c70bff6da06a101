use uuid::Uuid;

use crate::{
    dto::session::SessionSummary,
    error::ServiceError,
    state::SharedState,
};

/// Upcoming sessions of a game, ascending.
pub async fn upcoming_sessions(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<SessionSummary>, ServiceError> {
    let store = state.require_club_store().await?;
    if store.find_game(game_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "game `{game_id}` not found"
        )));
    }

    let after = state.config().scheduling.local_now();
    let sessions = store.upcoming_sessions(game_id, after).await?;
    Ok(sessions.into_iter().map(Into::into).collect())
}
