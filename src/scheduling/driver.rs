//! Daily materialization pass: walks every recurring game, asks the
//! recurrence engine what is missing on the lookahead window, and persists
//! the result in one bulk write per game.
//!
//! The driver is stateless across runs; re-running it on the same day is
//! harmless because the engine dedups against stored instants and the
//! storage layer enforces occurrence uniqueness anyway.

use std::time::Duration as StdDuration;

use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    config::SchedulingConfig,
    dao::{club_store::ClubStore, models::GameEntity, storage::StorageResult},
    scheduling::recurrence::{self, MaterializationPolicy},
    state::SharedState,
};

/// Run the scheduler forever, firing one pass per day at the configured
/// hour in the operating offset.
pub async fn run(state: SharedState) {
    loop {
        let scheduling = &state.config().scheduling;
        let now = OffsetDateTime::now_utc().to_offset(scheduling.utc_offset);
        let delay = delay_until_next_run(now, scheduling.run_at_hour);
        info!(seconds = delay.as_secs(), "scheduler sleeping until next pass");
        sleep(delay).await;

        run_pass(&state).await;
    }
}

/// One pass over all recurring games. Skipped entirely in degraded mode;
/// a single game's failure never aborts the batch.
pub async fn run_pass(state: &SharedState) {
    if state.is_degraded().await {
        warn!("storage degraded; skipping scheduler pass");
        return;
    }
    let Some(store) = state.club_store().await else {
        warn!("storage unavailable; skipping scheduler pass");
        return;
    };

    let scheduling = state.config().scheduling.clone();
    let now_local = scheduling.local_now();

    let games = match store.list_recurring_games().await {
        Ok(games) => games,
        Err(err) => {
            warn!(error = %err, "failed to load recurring games; skipping scheduler pass");
            return;
        }
    };

    let materialized =
        materialize_all(store.as_ref(), &games, now_local, &scheduling).await;
    state.record_pass(now_local).await;
    info!(
        games = games.len(),
        sessions = materialized,
        "scheduler pass finished"
    );
}

/// Materialize sessions for each game in turn, isolating per-game
/// failures. Returns the total number of sessions written.
pub(crate) async fn materialize_all(
    store: &dyn ClubStore,
    games: &[GameEntity],
    now_local: PrimitiveDateTime,
    scheduling: &SchedulingConfig,
) -> usize {
    let policy = scheduling.policy();
    let mut total = 0;

    for game in games {
        match materialize_game(store, game, now_local, scheduling.lookahead_days, &policy).await
        {
            Ok(count) => total += count,
            Err(err) => {
                warn!(game = %game.id, error = %err, "session materialization failed; continuing with next game");
            }
        }
    }

    total
}

/// Materialize one game: load its stored future instants, run the engine
/// over the lookahead window, and bulk-insert whatever is new.
async fn materialize_game(
    store: &dyn ClubStore,
    game: &GameEntity,
    now_local: PrimitiveDateTime,
    lookahead_days: u16,
    policy: &MaterializationPolicy,
) -> StorageResult<usize> {
    let existing = store.future_session_instants(game.id, now_local).await?;
    let candidates = lookahead(now_local.date(), lookahead_days);
    let accepted = recurrence::materialize(&game.recurrence, &existing, candidates, policy);

    if accepted.is_empty() {
        return Ok(0);
    }

    let inserted = store.insert_sessions(game.id, accepted).await?;
    info!(game = %game.id, sessions = inserted, "materialized sessions");
    Ok(inserted)
}

/// The next `days` calendar dates starting at `today`, ascending.
fn lookahead(today: Date, days: u16) -> impl Iterator<Item = Date> {
    (0..days).filter_map(move |offset| today.checked_add(Duration::days(i64::from(offset))))
}

/// How long to sleep until the next daily run at `hour` o'clock.
fn delay_until_next_run(now: OffsetDateTime, hour: u8) -> StdDuration {
    let run_time = Time::from_hms(hour, 0, 0).unwrap_or(Time::MIDNIGHT);
    let today_run = now.replace_time(run_time);
    let next_run = if today_run > now {
        today_run
    } else {
        today_run + Duration::days(1)
    };
    (next_run - now).unsigned_abs()
}
