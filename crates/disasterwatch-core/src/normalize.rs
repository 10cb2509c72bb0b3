//! Mapping of raw alert records onto the canonical [`Event`] shape.
//!
//! The same contract applies to snapshot entries and push messages:
//!
//! | Canonical | Wire | Default |
//! |-----------|------|---------|
//! | `id` | `_id` | none, the record is rejected |
//! | `type` | `disaster_type` | `Unknown` |
//! | `place` | `location_text` | `Unknown Location` |
//! | `severity` | `severity` | `Low` |
//! | `time` | `timestamp` | now |
//! | `lat`, `lon` | `location.coordinates[1]`, `[0]` | `null` |
//!
//! Empty strings count as missing.

use chrono::{DateTime, Utc};
use disasterwatch_types::{Event, EventId, GeoPoint, RawEvent, Severity};
use serde_json::Value;

/// Category label used when the record carries none.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Place label used when the record carries none.
pub const UNKNOWN_PLACE: &str = "Unknown Location";

/// Reasons a raw record cannot become an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The record has no `_id`, so it cannot be keyed or deleted.
    #[error("alert record has no _id")]
    MissingId,
}

/// Normalize a raw record, stamping missing timestamps with `now`.
pub fn normalize(raw: &RawEvent, now: DateTime<Utc>) -> Result<Event, NormalizeError> {
    let id = non_empty(raw.id.as_deref()).ok_or(NormalizeError::MissingId)?;
    let point = raw.location.as_ref().and_then(point_geometry);

    Ok(Event {
        id: EventId::from(id),
        event_type: non_empty(raw.disaster_type.as_deref())
            .unwrap_or(UNKNOWN_TYPE)
            .to_owned(),
        place: non_empty(raw.location_text.as_deref())
            .unwrap_or(UNKNOWN_PLACE)
            .to_owned(),
        severity: Severity::from_wire(non_empty(raw.severity.as_deref())),
        time: non_empty(raw.timestamp.as_deref())
            .and_then(parse_timestamp)
            .unwrap_or(now),
        lat: point.map(|p| p.lat),
        lon: point.map(|p| p.lon),
    })
}

/// Extract a point from a `GeoJSON`-style geometry.
///
/// The geometry must be an object whose `coordinates` array starts with a
/// finite longitude and latitude. A `type` other than `Point`, when present,
/// disqualifies it.
pub fn point_geometry(location: &Value) -> Option<GeoPoint> {
    let object = location.as_object()?;
    if let Some(kind) = object.get("type").and_then(Value::as_str) {
        if !kind.eq_ignore_ascii_case("point") {
            return None;
        }
    }
    let coordinates = object.get("coordinates")?.as_array()?;
    let lon = coordinates.first()?.as_f64()?;
    let lat = coordinates.get(1)?.as_f64()?;
    (lat.is_finite() && lon.is_finite()).then_some(GeoPoint::new(lat, lon))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(timestamp = raw, error = %e, "unparsable alert timestamp, using now");
            None
        }
    }
}
