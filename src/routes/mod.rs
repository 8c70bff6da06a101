use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub mod games;
pub mod health;
pub mod host;
pub mod players;

/// Compose all route trees, wiring in shared state and the Swagger UI.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(players::router(state.clone()))
        .merge(games::router(state.clone()))
        .merge(host::router(state.clone()))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::SystemTime;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
    use hmac::{Hmac, Mac};
    use serde_json::Value;
    use sha2::Sha256;
    use time::OffsetDateTime;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::guard::INIT_DATA_HEADER;
    use crate::config::AppConfig;
    use crate::dao::club_store::memory::MemoryStore;
    use crate::dao::models::PlayerEntity;
    use crate::state::AppState;

    const BOT_TOKEN: &str = "7654321:AAtestBotTokenForUnitTestsOnly";

    async fn setup() -> (MemoryStore, SharedState, Router<()>) {
        let state = AppState::new(AppConfig::default(), BOT_TOKEN.into());
        let store = MemoryStore::default();
        state.set_club_store(Arc::new(store.clone())).await;
        let app = router(state.clone());
        (store, state, app)
    }

    /// Sign an init-data payload the way the identity provider does.
    fn signed_init_data(telegram_id: i64) -> String {
        let auth_date = OffsetDateTime::now_utc().unix_timestamp().to_string();
        let user = format!(r#"{{"id":{telegram_id},"first_name":"Ana"}}"#);
        let pairs = [("auth_date", auth_date.as_str()), ("user", user.as_str())];

        let mut sorted = pairs;
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let check_string = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut key_mac = Hmac::<Sha256>::new_from_slice(b"WebAppData").unwrap();
        key_mac.update(BOT_TOKEN.as_bytes());
        let signing_key = key_mac.finalize().into_bytes();

        let mut mac = Hmac::<Sha256>::new_from_slice(&signing_key).unwrap();
        mac.update(check_string.as_bytes());
        let hash = hex::encode(mac.finalize().into_bytes());

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            serializer.append_pair(key, value);
        }
        serializer.append_pair("hash", &hash);
        serializer.finish()
    }

    fn player(telegram_id: i64, host: bool) -> PlayerEntity {
        PlayerEntity {
            id: Uuid::new_v4(),
            telegram_id,
            name: "Ana".into(),
            host,
            created_at: SystemTime::now(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_init_data_header_is_a_bad_request() {
        let (_store, _state, app) = setup().await;

        let response = app
            .oneshot(Request::get("/games").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tampered_payload_gets_a_generic_unauthorized_body() {
        let (_store, _state, app) = setup().await;

        let tampered = signed_init_data(42).replace("Ana", "Eve");
        let response = app
            .oneshot(
                Request::get("/games")
                    .header(INIT_DATA_HEADER, tampered)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        // The body must not say whether the signature or the freshness
        // check failed.
        assert_eq!(body_json(response).await["message"], "unauthorized");
    }

    #[tokio::test]
    async fn unregistered_caller_is_not_found_on_player_routes() {
        let (_store, _state, app) = setup().await;

        let response = app
            .oneshot(
                Request::get("/games")
                    .header(INIT_DATA_HEADER, signed_init_data(99))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("player not registered")
        );
    }

    #[tokio::test]
    async fn non_host_is_forbidden_on_host_routes() {
        let (store, _state, app) = setup().await;
        store.add_player(player(42, false));

        let response = app
            .oneshot(
                Request::post("/host/games")
                    .header(INIT_DATA_HEADER, signed_init_data(42))
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"name":"friday night","recurrence":"weekly","first_session_at":"2024-03-08 19:30"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("host role required")
        );
    }

    #[tokio::test]
    async fn host_can_create_a_game_with_a_seeded_session() {
        let (store, _state, app) = setup().await;
        store.add_player(player(7, true));

        let response = app
            .oneshot(
                Request::post("/host/games")
                    .header(INIT_DATA_HEADER, signed_init_data(7))
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"name":"friday night","recurrence":"weekly","first_session_at":"2024-03-08 19:30"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let game_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

        // The anchor is a Friday, so the first seeded session is the
        // anchor itself.
        assert_eq!(store.stored(game_id).len(), 1);
    }

    #[tokio::test]
    async fn healthcheck_reports_the_last_scheduler_pass() {
        let (_store, state, app) = setup().await;

        let response = app
            .clone()
            .oneshot(Request::get("/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body.get("last_pass_at").is_none());

        crate::scheduling::driver::run_pass(&state).await;

        let response = app
            .oneshot(Request::get("/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["last_pass_at"].is_string());
    }
}
