use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::get,
};
use uuid::Uuid;

use crate::{
    auth::guard,
    dto::{game::GameSummary, session::SessionSummary},
    error::AppError,
    services::{game_service, session_service},
    state::SharedState,
};

/// Read-only game and session routes available to every registered player.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/sessions", get(list_game_sessions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_player,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            guard::require_identity,
        ))
}

/// List all games known to the club.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    params(("x-telegram-init-data" = String, Header, description = "Signed init-data payload issued by the identity provider")),
    responses((status = 200, description = "All games", body = [GameSummary]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(game_service::list_games(&state).await?))
}

/// Retrieve a game by its identifier.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("x-telegram-init-data" = String, Header, description = "Signed init-data payload issued by the identity provider"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "The game", body = GameSummary),
        (status = 404, description = "No such game"),
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::get_game(&state, id).await?))
}

/// List the upcoming sessions of a game, ascending.
#[utoipa::path(
    get,
    path = "/games/{id}/sessions",
    tag = "games",
    params(("x-telegram-init-data" = String, Header, description = "Signed init-data payload issued by the identity provider"),
    ("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Upcoming sessions", body = [SessionSummary]),
        (status = 404, description = "No such game"),
    )
)]
pub async fn list_game_sessions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    Ok(Json(session_service::upcoming_sessions(&state, id).await?))
}
