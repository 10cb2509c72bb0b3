//! Core entity structs: the canonical event, its wire record, and the
//! account payloads exchanged with the backend.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::enums::{Role, Severity};
use crate::ids::{EventId, UserId};

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A WGS84 point in `[lat, lon]` order (map order, not `GeoJSON` order).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Construct a point.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A disaster event in canonical form.
///
/// Produced by normalizing either a snapshot record or a push message. Events
/// without coordinates stay in the list and the counts but never get a map
/// marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Backend-assigned key; unique within the feed.
    pub id: EventId,
    /// Category label such as `Flood` or `Earthquake`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Free-text location description.
    pub place: String,
    /// Severity bucket.
    pub severity: Severity,
    /// Time of occurrence or report.
    pub time: DateTime<Utc>,
    /// Latitude, if the source carried a point geometry.
    pub lat: Option<f64>,
    /// Longitude, if the source carried a point geometry.
    pub lon: Option<f64>,
}

impl Event {
    /// The event's map position, when both coordinates are known.
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

/// An alert record exactly as the backend sends it, on both the REST list
/// endpoint and the `new_event` push channel.
///
/// Every field is optional so a sparse record still decodes; normalization
/// substitutes defaults. A field of the wrong JSON type reads as missing
/// instead of failing the whole record. `location` is kept as raw JSON
/// because its geometry is only trusted once it has been checked to be a
/// point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Database key. Numbers and `{"$oid": ...}` objects read as their
    /// string form.
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "lenient_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Category label.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub disaster_type: Option<String>,
    /// Human-readable place name.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
    /// Severity label.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// RFC 3339 timestamp. Integer epoch milliseconds are converted.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
    /// `GeoJSON`-style geometry, `{ "type": "Point", "coordinates": [lon, lat] }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<serde_json::Value>,
}

fn lenient_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(key)) => Some(key),
        Some(Value::Number(key)) => Some(key.to_string()),
        Some(Value::Object(map)) => match map.get("$oid") {
            Some(Value::String(key)) => Some(key.clone()),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(millis)) => millis
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Deserialize an optional role label, treating anything unknown as
/// [`Role::User`].
fn lenient_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Role, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(Role::from_wire(raw.as_deref()))
}

/// The signed-in user's profile as returned by the auth endpoints and kept in
/// session storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserProfile {
    /// Account key.
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    /// Login email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Account role; unknown labels read as `user`.
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Role,
}

/// A row of the administrative user table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account key.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub fullname: Option<String>,
    /// Login email.
    #[serde(default)]
    pub email: Option<String>,
    /// Account role; unknown labels read as `user`.
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Role,
}

impl UserRecord {
    /// Avatar initial: the first letter of the full name, or `U`.
    pub fn initial(&self) -> char {
        self.fullname
            .as_deref()
            .and_then(|name| name.chars().next())
            .map_or('U', |c| c.to_uppercase().next().unwrap_or(c))
    }
}

/// Successful body of `POST /api/auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer credential for authenticated calls.
    #[serde(default)]
    pub token: String,
    /// The signed-in user's profile.
    #[serde(default)]
    pub user: UserProfile,
}

/// Error body returned by the backend on a non-2xx response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Human-readable reason, when the backend provides one.
    #[serde(default)]
    pub message: Option<String>,
}
