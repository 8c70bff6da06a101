//! Request gates: identity verification, then role authorization.
//!
//! The gates are ordinary middleware layered in front of a route subtree:
//! the identity gate attaches a [`VerifiedCaller`] extension, the role
//! gates require it and attach the persisted profile. Each request is
//! verified independently; there is no session state.

use axum::{
    body::Body,
    extract::State,
    http::{Extensions, Request},
    middleware::Next,
    response::Response,
};
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    auth::verifier::{self, AuthError, VerifiedCaller},
    dao::models::PlayerEntity,
    error::{AppError, ServiceError},
    state::SharedState,
};

/// Header carrying the raw init-data payload on every request.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Identity gate: verify the signed payload and attach the caller.
///
/// Malformed or missing payloads are the client's fault (400); signature
/// and freshness failures are unauthorized (401) with a deliberately
/// generic body — the distinguishing detail goes to the log only.
pub async fn require_identity(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let raw = req
        .headers()
        .get(INIT_DATA_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::BadRequest(format!("missing `{INIT_DATA_HEADER}` header"))
        })?;

    let policy = state.config().auth.freshness_policy();
    match verifier::verify(raw, state.bot_token(), OffsetDateTime::now_utc(), &policy) {
        Ok(caller) => {
            req.extensions_mut().insert(caller);
            Ok(next.run(req).await)
        }
        Err(err @ AuthError::MalformedPayload(_)) => {
            warn!(error = %err, "rejected unusable init data");
            Err(AppError::BadRequest("malformed init data".into()))
        }
        Err(err) => {
            warn!(error = %err, "rejected init data");
            Err(AppError::Unauthorized)
        }
    }
}

/// Role gate: the verified caller must be a registered player.
pub async fn require_player(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let profile = lookup_profile(&state, req.extensions()).await?;
    req.extensions_mut().insert(profile);
    Ok(next.run(req).await)
}

/// Role gate: the verified caller must be a registered player with the
/// host role.
pub async fn require_host(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let profile = lookup_profile(&state, req.extensions()).await?;
    if !profile.host {
        warn!(telegram_id = profile.telegram_id, "non-host rejected from host route");
        return Err(AppError::Forbidden("host role required".into()));
    }
    req.extensions_mut().insert(profile);
    Ok(next.run(req).await)
}

/// Resolve the persisted profile for the caller the identity gate
/// attached. Precondition: the identity gate already ran.
async fn lookup_profile(
    state: &SharedState,
    extensions: &Extensions,
) -> Result<PlayerEntity, AppError> {
    let caller = extensions
        .get::<VerifiedCaller>()
        .copied()
        .ok_or_else(|| {
            AppError::Internal("role gate reached without the identity gate".into())
        })?;

    let store = state
        .require_club_store()
        .await
        .map_err(AppError::from)?;
    let profile = store
        .find_player_by_telegram_id(caller.telegram_id)
        .await
        .map_err(ServiceError::from)?;

    profile.ok_or_else(|| AppError::NotFound("player not registered".into()))
}
