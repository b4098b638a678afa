use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TimeParseError {
    #[error("invalid time format, expected MM/DD HH:MM")]
    Format,
    #[error("that wall-clock time doesn't exist in {0}")]
    Nonexistent(Tz),
}

/// Resolve a stored timezone preference. Unset or unrecognised names degrade
/// to UTC, never an error.
pub(crate) fn resolve_timezone(stored: Option<&str>) -> Tz {
    stored
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

/// Turn a user-supplied `MM/DD HH:MM` wall-clock string into a UTC instant.
///
/// The year is taken from `now` as seen in `tz`, the naive time is then
/// localised in `tz` and converted to UTC. An ambiguous wall-clock time
/// (DST fall-back) resolves to its earlier occurrence.
pub(crate) fn resolve_instant(
    tz: Tz,
    input: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, TimeParseError> {
    let year = now.with_timezone(&tz).year();
    let naive = NaiveDateTime::parse_from_str(
        &format!("{} {}", year, input.trim()),
        "%Y %m/%d %H:%M",
    )
    .map_err(|_| TimeParseError::Format)?;

    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .ok_or(TimeParseError::Nonexistent(tz))?;

    Ok(local.with_timezone(&Utc))
}
