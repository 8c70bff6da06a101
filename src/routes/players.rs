use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    auth::{guard, verifier::VerifiedCaller},
    dao::models::PlayerEntity,
    dto::player::{PlayerSummary, RegisterPlayerRequest},
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Routes handling player registration and profile lookup.
pub fn router(state: SharedState) -> Router<SharedState> {
    // Registration only needs a verified identity; the profile route also
    // needs that identity to be on record.
    let registration = Router::new()
        .route("/players", post(register))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_identity,
        ));

    let profile = Router::new()
        .route("/players/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_player,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            guard::require_identity,
        ));

    registration.merge(profile)
}

/// Register the verified caller as a club player.
#[utoipa::path(
    post,
    path = "/players",
    tag = "players",
    params(("x-telegram-init-data" = String, Header, description = "Signed init-data payload issued by the identity provider")),
    request_body = RegisterPlayerRequest,
    responses(
        (status = 200, description = "Player registered (or already on record)", body = PlayerSummary),
        (status = 400, description = "Malformed payload or input"),
        (status = 401, description = "Payload rejected"),
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Extension(caller): Extension<VerifiedCaller>,
    Valid(Json(payload)): Valid<Json<RegisterPlayerRequest>>,
) -> Result<Json<PlayerSummary>, AppError> {
    let summary = player_service::register(&state, caller, payload).await?;
    Ok(Json(summary))
}

/// Return the caller's own profile.
#[utoipa::path(
    get,
    path = "/players/me",
    tag = "players",
    params(("x-telegram-init-data" = String, Header, description = "Signed init-data payload issued by the identity provider")),
    responses(
        (status = 200, description = "The caller's profile", body = PlayerSummary),
        (status = 404, description = "Caller not registered"),
    )
)]
pub async fn me(
    Extension(profile): Extension<PlayerEntity>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(profile.into()))
}
