/// OpenAPI documentation generation.
pub mod documentation;
/// Game creation, lookup, and deletion, including first-session seeding.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Player registration and profile lookup.
pub mod player_service;
/// Read access to materialized sessions.
pub mod session_service;
/// Storage reconnection loop driving degraded mode.
pub mod storage_supervisor;
