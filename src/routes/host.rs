use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    auth::guard,
    dao::models::PlayerEntity,
    dto::game::{CreateGameRequest, GameSummary},
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Host-only management endpoints for creating and removing games.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/host/games", post(create_game))
        .route("/host/games/{id}", delete(delete_game))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_host,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            guard::require_identity,
        ))
}

/// Register a new game with its recurrence rule and seed the first session.
#[utoipa::path(
    post,
    path = "/host/games",
    tag = "host",
    params(("x-telegram-init-data" = String, Header, description = "Signed init-data payload issued by the identity provider")),
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = GameSummary),
        (status = 403, description = "Caller lacks the host role"),
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Extension(host): Extension<PlayerEntity>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::create_game(&state, &host, payload).await?;
    Ok(Json(summary))
}

/// Delete a game and all of its sessions.
#[utoipa::path(
    delete,
    path = "/host/games/{id}",
    tag = "host",
    params(("x-telegram-init-data" = String, Header, description = "Signed init-data payload issued by the identity provider"),
    ("id" = String, Path, description = "Identifier of the game to delete")),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 403, description = "Caller is not the owning host"),
        (status = 404, description = "No such game"),
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Extension(host): Extension<PlayerEntity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, &host, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
