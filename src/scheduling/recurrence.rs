//! Pure recurrence computation: which candidate dates become concrete
//! sessions for a game, given its rule and what already exists.
//!
//! Everything in this module is side-effect free; the driver owns storage
//! access and clock handling.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, PrimitiveDateTime};

/// How a game repeats, anchored to its first intended session.
///
/// `None` marks a one-off game: the scheduler never materializes anything
/// for it, but [`first_occurrence`] still yields the anchor so the single
/// session can be seeded at creation time. Unknown values arriving from
/// storage or clients deserialize to `None` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    /// Every day from the anchor onward.
    Daily,
    /// Every week on the anchor's weekday.
    Weekly,
    /// Every second week on the anchor's weekday.
    Fortnightly,
    /// Every month on the anchor's day-of-month. Months without that day
    /// are skipped, never clamped.
    Monthly,
    /// One-off game, no recurrence.
    #[serde(other)]
    None,
}

/// A game's recurrence policy: the kind plus the first intended session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// Repetition pattern.
    pub kind: RecurrenceKind,
    /// First intended session; its date anchors qualification, its time
    /// of day is stamped onto every produced occurrence.
    pub anchor: PrimitiveDateTime,
}

/// Bounds injected into [`materialize`] so tests can exercise the cap
/// directly instead of poking at a global.
#[derive(Debug, Clone, Copy)]
pub struct MaterializationPolicy {
    /// Upper bound on stored-future plus newly accepted sessions per game.
    pub max_future_sessions: usize,
}

/// Decide whether `day` is a valid occurrence date for a rule anchored on
/// `anchor`. Dates before the anchor never qualify.
fn qualifies(kind: RecurrenceKind, anchor: Date, day: Date) -> bool {
    if day < anchor {
        return false;
    }
    match kind {
        RecurrenceKind::None => false,
        RecurrenceKind::Daily => true,
        RecurrenceKind::Weekly => day.weekday() == anchor.weekday(),
        RecurrenceKind::Fortnightly => (day - anchor).whole_days() % 14 == 0,
        RecurrenceKind::Monthly => day.day() == anchor.day(),
    }
}

/// Select the candidate dates that become new session instants.
///
/// Candidates must be supplied in ascending order; the result is then
/// ascending as well. Instants already present in `existing`, or produced
/// earlier in the same call, are skipped. Once `existing` plus the accepted
/// instants reach the policy cap, the remaining candidates are not
/// evaluated — they would all be rejected anyway.
pub fn materialize(
    rule: &RecurrenceRule,
    existing: &BTreeSet<PrimitiveDateTime>,
    candidates: impl IntoIterator<Item = Date>,
    policy: &MaterializationPolicy,
) -> Vec<PrimitiveDateTime> {
    if rule.kind == RecurrenceKind::None {
        return Vec::new();
    }

    let mut accepted = Vec::new();
    let mut total = existing.len();

    for day in candidates {
        if total >= policy.max_future_sessions {
            break;
        }
        if !qualifies(rule.kind, rule.anchor.date(), day) {
            continue;
        }
        let instant = PrimitiveDateTime::new(day, rule.anchor.time());
        if existing.contains(&instant) || accepted.contains(&instant) {
            continue;
        }
        accepted.push(instant);
        total += 1;
    }

    accepted
}

/// Find the first qualifying instant within `window_days` days of the
/// anchor, used once at game creation to seed the initial session.
///
/// For a one-off game the anchor itself is the answer. Returns `None` only
/// when no date in the window qualifies (a recurring rule whose pattern
/// never lands inside the window). Does not consult the materialization
/// cap.
pub fn first_occurrence(rule: &RecurrenceRule, window_days: u16) -> Option<PrimitiveDateTime> {
    if rule.kind == RecurrenceKind::None {
        return Some(rule.anchor);
    }

    let anchor = rule.anchor.date();
    (0..window_days).find_map(|offset| {
        let day = anchor.checked_add(Duration::days(i64::from(offset)))?;
        qualifies(rule.kind, anchor, day)
            .then(|| PrimitiveDateTime::new(day, rule.anchor.time()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn rule(kind: RecurrenceKind, anchor: PrimitiveDateTime) -> RecurrenceRule {
        RecurrenceRule { kind, anchor }
    }

    fn policy(max: usize) -> MaterializationPolicy {
        MaterializationPolicy {
            max_future_sessions: max,
        }
    }

    fn days(from: Date, count: i64) -> Vec<Date> {
        (0..count).map(|offset| from + Duration::days(offset)).collect()
    }

    #[test]
    fn one_off_games_materialize_nothing() {
        let rule = rule(RecurrenceKind::None, datetime!(2024-03-01 19:00));
        let result = materialize(
            &rule,
            &BTreeSet::new(),
            days(date!(2024 - 03 - 01), 30),
            &policy(10),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn weekly_rule_hits_exactly_the_anchor_weekday() {
        // 2024-03-01 is a Friday; a 7-day window holds exactly one Friday.
        let rule = rule(RecurrenceKind::Weekly, datetime!(2024-03-01 19:30));
        let result = materialize(
            &rule,
            &BTreeSet::new(),
            days(date!(2024 - 03 - 04), 7),
            &policy(10),
        );
        assert_eq!(result, vec![datetime!(2024-03-08 19:30)]);
    }

    #[test]
    fn daily_rule_skips_days_before_the_anchor() {
        let rule = rule(RecurrenceKind::Daily, datetime!(2024-03-05 18:00));
        let result = materialize(
            &rule,
            &BTreeSet::new(),
            days(date!(2024 - 03 - 03), 5),
            &policy(10),
        );
        assert_eq!(
            result,
            vec![
                datetime!(2024-03-05 18:00),
                datetime!(2024-03-06 18:00),
                datetime!(2024-03-07 18:00),
            ]
        );
    }

    #[test]
    fn fortnightly_rule_skips_the_in_between_week() {
        let rule = rule(RecurrenceKind::Fortnightly, datetime!(2024-03-01 20:00));
        let result = materialize(
            &rule,
            &BTreeSet::new(),
            days(date!(2024 - 03 - 01), 29),
            &policy(10),
        );
        assert_eq!(
            result,
            vec![
                datetime!(2024-03-01 20:00),
                datetime!(2024-03-15 20:00),
                datetime!(2024-03-29 20:00),
            ]
        );
    }

    #[test]
    fn monthly_rule_on_the_31st_skips_short_months() {
        let rule = rule(RecurrenceKind::Monthly, datetime!(2024-01-31 19:00));
        // April has 30 days: nothing qualifies in the whole month.
        let result = materialize(
            &rule,
            &BTreeSet::new(),
            days(date!(2024 - 04 - 01), 30),
            &policy(10),
        );
        assert!(result.is_empty());

        // May has a 31st again.
        let result = materialize(
            &rule,
            &BTreeSet::new(),
            days(date!(2024 - 05 - 01), 31),
            &policy(10),
        );
        assert_eq!(result, vec![datetime!(2024-05-31 19:00)]);
    }

    #[test]
    fn cap_counts_existing_sessions() {
        let rule = rule(RecurrenceKind::Daily, datetime!(2024-03-01 19:00));
        let existing: BTreeSet<_> =
            [datetime!(2024-03-01 19:00), datetime!(2024-03-02 19:00)]
                .into_iter()
                .collect();
        // Four qualifying candidates, cap of three with two already stored:
        // only the earliest new one fits.
        let result = materialize(
            &rule,
            &existing,
            days(date!(2024 - 03 - 03), 4),
            &policy(3),
        );
        assert_eq!(result, vec![datetime!(2024-03-03 19:00)]);
    }

    #[test]
    fn cap_already_reached_accepts_nothing() {
        let rule = rule(RecurrenceKind::Daily, datetime!(2024-03-01 19:00));
        let existing: BTreeSet<_> = (0..5)
            .map(|offset| datetime!(2024-03-01 19:00) + Duration::days(offset))
            .collect();
        let result = materialize(
            &rule,
            &existing,
            days(date!(2024 - 03 - 06), 10),
            &policy(3),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn materialize_is_idempotent() {
        let rule = rule(RecurrenceKind::Weekly, datetime!(2024-03-01 19:00));
        let candidates = days(date!(2024 - 03 - 01), 28);
        let first = materialize(&rule, &BTreeSet::new(), candidates.clone(), &policy(10));
        assert!(!first.is_empty());

        let existing: BTreeSet<_> = first.into_iter().collect();
        let second = materialize(&rule, &existing, candidates, &policy(10));
        assert!(second.is_empty());
    }

    #[test]
    fn results_are_ascending_and_respect_the_cap() {
        let rule = rule(RecurrenceKind::Daily, datetime!(2024-03-01 19:00));
        let existing: BTreeSet<_> = [datetime!(2024-03-02 19:00)].into_iter().collect();
        let result = materialize(
            &rule,
            &existing,
            days(date!(2024 - 03 - 01), 20),
            &policy(6),
        );

        assert!(result.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(existing.len() + result.len() <= 6);
        // The instant already stored is not produced again.
        assert!(!result.contains(&datetime!(2024-03-02 19:00)));
    }

    #[test]
    fn first_occurrence_of_a_one_off_is_the_anchor() {
        let rule = rule(RecurrenceKind::None, datetime!(2024-03-09 21:00));
        assert_eq!(first_occurrence(&rule, 30), Some(datetime!(2024-03-09 21:00)));
    }

    #[test]
    fn first_occurrence_of_a_recurring_rule_is_the_anchor_date() {
        let rule = rule(RecurrenceKind::Monthly, datetime!(2024-01-31 19:00));
        assert_eq!(first_occurrence(&rule, 30), Some(datetime!(2024-01-31 19:00)));
    }

    #[test]
    fn unknown_kind_deserializes_to_none() {
        let kind: RecurrenceKind = serde_json::from_str("\"quarterly\"").unwrap();
        assert_eq!(kind, RecurrenceKind::None);
    }

    #[test]
    fn kinds_roundtrip_through_serde() {
        for (kind, text) in [
            (RecurrenceKind::Daily, "\"daily\""),
            (RecurrenceKind::Weekly, "\"weekly\""),
            (RecurrenceKind::Fortnightly, "\"fortnightly\""),
            (RecurrenceKind::Monthly, "\"monthly\""),
        ] {
            assert_eq!(serde_json::to_string(&kind).unwrap(), text);
            assert_eq!(serde_json::from_str::<RecurrenceKind>(text).unwrap(), kind);
        }
    }
}
