//! Session scheduling: the pure recurrence engine and the daily driver task.

/// Daily materialization pass over all recurring games.
pub mod driver;
/// Pure recurrence computation (qualification, dedup, cap).
pub mod recurrence;
