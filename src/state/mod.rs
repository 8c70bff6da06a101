//! Central application state shared across requests and background tasks.

use std::sync::Arc;

use time::PrimitiveDateTime;
use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::club_store::ClubStore, error::ServiceError};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing the database handle, the loaded
/// configuration, and the bot secret used to verify inbound payloads.
pub struct AppState {
    club_store: RwLock<Option<Arc<dyn ClubStore>>>,
    degraded: watch::Sender<bool>,
    last_pass: RwLock<Option<PrimitiveDateTime>>,
    config: AppConfig,
    bot_token: String,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig, bot_token: String) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            club_store: RwLock::new(None),
            degraded: degraded_tx,
            last_pass: RwLock::new(None),
            config,
            bot_token,
        })
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Secret the identity provider's signatures are derived from.
    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn club_store(&self) -> Option<Arc<dyn ClubStore>> {
        let guard = self.club_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain a handle to the current store or fail with a degraded-mode
    /// error.
    pub async fn require_club_store(&self) -> Result<Arc<dyn ClubStore>, ServiceError> {
        self.club_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_club_store(&self, store: Arc<dyn ClubStore>) {
        {
            let mut guard = self.club_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.club_store.read().await;
        guard.is_none() || *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag.
    pub async fn update_degraded(&self, value: bool) {
        let _ = self.degraded.send(value);
    }

    /// Record the completion instant of a scheduler pass.
    pub async fn record_pass(&self, instant: PrimitiveDateTime) {
        let mut guard = self.last_pass.write().await;
        *guard = Some(instant);
    }

    /// Completion instant of the most recent scheduler pass, if any ran.
    pub async fn last_pass(&self) -> Option<PrimitiveDateTime> {
        *self.last_pass.read().await
    }
}
