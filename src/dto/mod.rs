use std::time::SystemTime;

use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

pub mod game;
pub mod health;
pub mod player;
pub mod session;

/// Wire format for session/anchor instants: local wall-clock time in the
/// operating offset, minute resolution.
const WIRE_INSTANT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Render an instant in the wire format.
pub(crate) fn format_instant(instant: PrimitiveDateTime) -> String {
    instant
        .format(WIRE_INSTANT_FORMAT)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an instant from the wire format.
pub(crate) fn parse_instant(value: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(value, WIRE_INSTANT_FORMAT)
}

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn wire_instants_roundtrip() {
        let instant = datetime!(2024-03-08 19:30);
        assert_eq!(format_instant(instant), "2024-03-08 19:30");
        assert_eq!(parse_instant("2024-03-08 19:30").unwrap(), instant);
    }

    #[test]
    fn garbage_instants_fail_to_parse() {
        assert!(parse_instant("friday at eight").is_err());
        assert!(parse_instant("2024-03-08").is_err());
    }
}
