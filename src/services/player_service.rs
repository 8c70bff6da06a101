use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    auth::verifier::VerifiedCaller,
    dao::models::PlayerEntity,
    dto::player::{PlayerSummary, RegisterPlayerRequest},
    error::ServiceError,
    state::SharedState,
};

/// Register the verified caller as a club player.
///
/// Registration is idempotent: a caller who already has a profile gets it
/// back unchanged. New players never start with the host role; that is
/// granted out-of-band.
pub async fn register(
    state: &SharedState,
    caller: VerifiedCaller,
    request: RegisterPlayerRequest,
) -> Result<PlayerSummary, ServiceError> {
    let name = request.name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "player name must not be empty".into(),
        ));
    }

    let store = state.require_club_store().await?;
    if let Some(existing) = store
        .find_player_by_telegram_id(caller.telegram_id)
        .await?
    {
        return Ok(existing.into());
    }

    let player = PlayerEntity {
        id: Uuid::new_v4(),
        telegram_id: caller.telegram_id,
        name,
        host: false,
        created_at: SystemTime::now(),
    };
    store.save_player(player.clone()).await?;
    Ok(player.into())
}
