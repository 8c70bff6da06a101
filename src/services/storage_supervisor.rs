//! Keeps the club store connected and drives the degraded flag.
//!
//! The only storage-critical background work here is one batch per day,
//! so supervision is unhurried: probe the store on the configured
//! cadence, flip into degraded mode on the first failed probe, attempt a
//! bounded number of in-place reconnects, and only when those are
//! exhausted tear the connection down and rebuild it from scratch.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    config::StorageConfig,
    dao::{club_store::ClubStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Run the supervisor until the process exits. `connect` builds a fresh
/// store; it is called again whenever the current one is lost for good.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ClubStore>, StorageError>> + Send,
{
    let policy = state.config().storage.clone();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match connect().await {
            Ok(store) => {
                info!("club store connected");
                state.set_club_store(store.clone()).await;
                backoff = INITIAL_BACKOFF;

                watch_store(&state, store.as_ref(), &policy).await;
                warn!("club store lost; rebuilding the connection");
            }
            Err(err) => {
                warn!(error = %err, "club store connection failed");
            }
        }

        sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Probe the store on the configured cadence, toggling the degraded flag
/// as its health changes. Returns once in-place recovery has failed and
/// the connection must be rebuilt.
async fn watch_store(state: &SharedState, store: &dyn ClubStore, policy: &StorageConfig) {
    loop {
        sleep(policy.health_poll).await;

        if store.health_check().await.is_ok() {
            if state.is_degraded().await {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false).await;
            }
            continue;
        }

        warn!("storage health probe failed; entering degraded mode");
        state.update_degraded(true).await;

        if recover(store, policy).await {
            info!("storage reconnected; leaving degraded mode");
            state.update_degraded(false).await;
        } else {
            warn!(
                attempts = policy.max_reconnect_attempts,
                "in-place reconnects exhausted"
            );
            return;
        }
    }
}

/// Try to reconnect the existing store a bounded number of times.
async fn recover(store: &dyn ClubStore, policy: &StorageConfig) -> bool {
    let mut delay = INITIAL_BACKOFF;

    for attempt in 1..=policy.max_reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_BACKOFF);
            }
        }
    }

    false
}
