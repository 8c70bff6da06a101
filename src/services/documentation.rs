use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Poker Nights Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::players::register,
        crate::routes::players::me,
        crate::routes::games::list_games,
        crate::routes::games::get_game,
        crate::routes::games::list_game_sessions,
        crate::routes::host::create_game,
        crate::routes::host::delete_game,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::player::RegisterPlayerRequest,
            crate::dto::player::PlayerSummary,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::GameSummary,
            crate::dto::session::SessionSummary,
            crate::scheduling::recurrence::RecurrenceKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "players", description = "Player registration and profiles"),
        (name = "games", description = "Game and session lookups"),
        (name = "host", description = "Host-only game management"),
    )
)]
pub struct ApiDoc;
