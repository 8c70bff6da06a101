//! Application-level configuration: scheduling constants and the
//! authentication freshness policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::{info, warn};

use crate::{auth::verifier::FreshnessPolicy, scheduling::recurrence::MaterializationPolicy};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "POKER_NIGHTS_BACK_CONFIG_PATH";

/// Days of calendar lookahead the daily scheduler pass covers.
const DEFAULT_LOOKAHEAD_DAYS: u16 = 14;
/// Upper bound on future sessions stored per game.
const DEFAULT_MAX_FUTURE_SESSIONS: usize = 10;
/// Local hour (operating offset) at which the daily pass fires.
const DEFAULT_SCHEDULER_HOUR: u8 = 5;
/// Days scanned when seeding the first session of a new game.
const DEFAULT_FIRST_OCCURRENCE_WINDOW_DAYS: u16 = 30;
/// Maximum accepted age of a signed identity payload.
const DEFAULT_AUTH_FRESHNESS_SECS: u64 = 30 * 60;
/// Tolerance for payloads stamped slightly in the future.
const DEFAULT_AUTH_CLOCK_SKEW_SECS: u64 = 30;

/// Interval between storage health probes. The only storage-critical
/// task is a daily batch, so probing is deliberately unhurried.
const DEFAULT_STORAGE_POLL_SECS: u64 = 30;
/// In-place reconnect attempts after a failed probe before the
/// supervisor rebuilds the connection from scratch.
const DEFAULT_STORAGE_RECONNECT_ATTEMPTS: u32 = 3;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Scheduler and recurrence-engine constants.
    pub scheduling: SchedulingConfig,
    /// Authentication freshness constants.
    pub auth: AuthConfig,
    /// Storage supervision cadence and retry limits.
    pub storage: StorageConfig,
}

/// Constants driving the daily materialization pass.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    /// Number of calendar days (starting today) evaluated per pass.
    pub lookahead_days: u16,
    /// Cap on stored-future plus newly materialized sessions per game.
    pub max_future_sessions: usize,
    /// Hour of day, in the operating offset, at which the pass runs.
    pub run_at_hour: u8,
    /// Fixed operating UTC offset all date arithmetic happens in.
    pub utc_offset: UtcOffset,
    /// Window scanned by the first-session seed at game creation.
    pub first_occurrence_window_days: u16,
}

impl SchedulingConfig {
    /// Cap policy handed to the recurrence engine.
    pub fn policy(&self) -> MaterializationPolicy {
        MaterializationPolicy {
            max_future_sessions: self.max_future_sessions,
        }
    }

    /// Current wall-clock date and time in the operating offset.
    pub fn local_now(&self) -> PrimitiveDateTime {
        let now = OffsetDateTime::now_utc().to_offset(self.utc_offset);
        PrimitiveDateTime::new(now.date(), now.time())
    }
}

/// Constants bounding how old or skewed a signed payload may be.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Maximum payload age before rejection.
    pub freshness: Duration,
    /// Accepted forward clock skew.
    pub clock_skew: Duration,
}

impl AuthConfig {
    /// Freshness policy handed to the verifier.
    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy {
            max_age: self.freshness,
            clock_skew: self.clock_skew,
        }
    }
}

/// Cadence and retry limits of the storage supervisor.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Interval between storage health probes.
    pub health_poll: Duration,
    /// Reconnect attempts after a failed probe before giving up on the
    /// current connection.
    pub max_reconnect_attempts: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheduling: SchedulingConfig {
                lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
                max_future_sessions: DEFAULT_MAX_FUTURE_SESSIONS,
                run_at_hour: DEFAULT_SCHEDULER_HOUR,
                utc_offset: UtcOffset::UTC,
                first_occurrence_window_days: DEFAULT_FIRST_OCCURRENCE_WINDOW_DAYS,
            },
            auth: AuthConfig {
                freshness: Duration::from_secs(DEFAULT_AUTH_FRESHNESS_SECS),
                clock_skew: Duration::from_secs(DEFAULT_AUTH_CLOCK_SKEW_SECS),
            },
            storage: StorageConfig {
                health_poll: Duration::from_secs(DEFAULT_STORAGE_POLL_SECS),
                max_reconnect_attempts: DEFAULT_STORAGE_RECONNECT_ATTEMPTS,
            },
        }
    }
}

/// JSON representation of the configuration file located at
/// [`DEFAULT_CONFIG_PATH`]. Every section and field is optional.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    scheduling: RawScheduling,
    #[serde(default)]
    auth: RawAuth,
    #[serde(default)]
    storage: RawStorage,
}

#[derive(Debug, Default, Deserialize)]
struct RawScheduling {
    lookahead_days: Option<u16>,
    max_future_sessions: Option<usize>,
    run_at_hour: Option<u8>,
    utc_offset_hours: Option<i8>,
    first_occurrence_window_days: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuth {
    freshness_secs: Option<u64>,
    clock_skew_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStorage {
    health_poll_secs: Option<u64>,
    max_reconnect_attempts: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();

        let utc_offset = match raw.scheduling.utc_offset_hours {
            Some(hours) => UtcOffset::from_hms(hours, 0, 0).unwrap_or_else(|_| {
                warn!(hours, "invalid utc_offset_hours in config; using UTC");
                UtcOffset::UTC
            }),
            None => defaults.scheduling.utc_offset,
        };

        Self {
            scheduling: SchedulingConfig {
                lookahead_days: raw
                    .scheduling
                    .lookahead_days
                    .unwrap_or(defaults.scheduling.lookahead_days),
                max_future_sessions: raw
                    .scheduling
                    .max_future_sessions
                    .unwrap_or(defaults.scheduling.max_future_sessions),
                run_at_hour: raw
                    .scheduling
                    .run_at_hour
                    .unwrap_or(defaults.scheduling.run_at_hour)
                    .min(23),
                utc_offset,
                first_occurrence_window_days: raw
                    .scheduling
                    .first_occurrence_window_days
                    .unwrap_or(defaults.scheduling.first_occurrence_window_days),
            },
            auth: AuthConfig {
                freshness: raw
                    .auth
                    .freshness_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.auth.freshness),
                clock_skew: raw
                    .auth
                    .clock_skew_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.auth.clock_skew),
            },
            storage: StorageConfig {
                health_poll: raw
                    .storage
                    .health_poll_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.storage.health_poll),
                max_reconnect_attempts: raw
                    .storage
                    .max_reconnect_attempts
                    .unwrap_or(defaults.storage.max_reconnect_attempts),
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
