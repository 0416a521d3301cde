use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Canonical storage format for wall-clock timestamps.
pub const WALL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Parses an ISO-8601-ish date-time into a wall-clock timestamp.
///
/// Accepted inputs, in order of preference:
/// - `2026-08-07T14:30:00` (optionally with fractional seconds)
/// - `2026-08-07T14:30` (no seconds, as emitted by `datetime-local` inputs)
/// - `2026-08-07` (midnight)
/// - RFC 3339 with an offset or `Z`; the offset is dropped and the written
///   wall-clock component is kept.
pub fn parse_wall_time(raw: &str) -> anyhow::Result<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }

    Err(anyhow!("could not parse date-time: {raw}"))
}

pub fn format_wall_time(dt: NaiveDateTime) -> String {
    dt.format(WALL_FORMAT).to_string()
}

/// Whole-day difference between `due` and `now`, floored toward negative
/// infinity. A due date one hour in the past is day `-1`, not day `0`.
pub fn day_delta(due: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (due - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Serde adapter storing wall-clock timestamps in `WALL_FORMAT` while
/// reading any of the formats `parse_wall_time` accepts.
pub mod wall_time_serde {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_wall_time(*dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_wall_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> NaiveDateTime {
        parse_wall_time(raw).expect("test timestamp")
    }

    #[test]
    fn parses_common_forms() {
        assert_eq!(at("2026-08-07T14:30:00"), at("2026-08-07T14:30"));
        assert_eq!(at("2026-08-07"), at("2026-08-07T00:00:00"));
        assert_eq!(at("2026-08-07T14:30:00.250").time().to_string(), "14:30:00.250");
    }

    #[test]
    fn rfc3339_keeps_the_written_wall_clock() {
        assert_eq!(at("2026-08-07T14:30:00Z"), at("2026-08-07T14:30:00"));
        assert_eq!(at("2026-08-07T14:30:00+05:00"), at("2026-08-07T14:30:00"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_wall_time("soon").is_err());
        assert!(parse_wall_time("2026-13-01T00:00").is_err());
    }

    #[test]
    fn day_delta_floors_toward_negative_infinity() {
        let now = at("2026-08-07T12:00:00");
        assert_eq!(day_delta(at("2026-08-07T13:00:00"), now), 0);
        assert_eq!(day_delta(at("2026-08-07T11:00:00"), now), -1);
        assert_eq!(day_delta(at("2026-08-08T12:00:00"), now), 1);
        assert_eq!(day_delta(at("2026-08-14T12:00:00"), now), 7);
        assert_eq!(day_delta(at("2026-08-14T11:59:00"), now), 6);
    }

    #[test]
    fn storage_format_round_trips() {
        let dt = at("2026-08-07T09:05:00");
        assert_eq!(format_wall_time(dt), "2026-08-07T09:05:00");
        assert_eq!(at(&format_wall_time(dt)), dt);
    }
}
