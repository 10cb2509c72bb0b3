//! Enumeration types for the DisasterWatch dashboard.
//!
//! Severity buckets drive filtering, colouring and counting; roles gate the
//! admin-only affordances.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use crate::error::TypesError;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity bucket of a disaster event.
///
/// Exactly three buckets exist. Every normalized event lands in one of them,
/// so the per-bucket counts always sum to the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Life-threatening; triggers the audible alert.
    High,
    /// Significant but contained.
    Medium,
    /// Minor, or severity not reported.
    Low,
}

impl Severity {
    /// All buckets, highest first.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Canonical label as sent by the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Map a wire value onto a bucket.
    ///
    /// Missing values default to [`Severity::Low`]. Matching is
    /// case-insensitive; anything outside the three labels also falls back
    /// to `Low` so the event still counts toward exactly one bucket.
    pub fn from_wire(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or(Self::Low)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(TypesError::UnknownSeverity(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity filter
// ---------------------------------------------------------------------------

/// The active list/map filter: everything, or a single severity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SeverityFilter {
    /// Identity filter.
    #[default]
    All,
    /// Only events in the given bucket.
    Only(Severity),
}

impl SeverityFilter {
    /// Whether an event of the given severity passes this filter.
    pub fn matches(self, severity: Severity) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == severity,
        }
    }
}

impl fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.pad("all"),
            Self::Only(severity) => f.pad(severity.as_str()),
        }
    }
}

impl FromStr for SeverityFilter {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed
            .parse::<Severity>()
            .map(Self::Only)
            .map_err(|_unknown| TypesError::UnknownFilter(s.to_owned()))
    }
}

impl From<Severity> for SeverityFilter {
    fn from(severity: Severity) -> Self {
        Self::Only(severity)
    }
}

impl Serialize for SeverityFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeverityFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role carried in the signed-in user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    /// Regular account; read-only dashboard.
    #[default]
    User,
    /// Administrator; may delete events, manage users and export reports.
    Admin,
}

impl Role {
    /// Map a wire value onto a role. Anything but `admin` is least privilege.
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some(r) if r.trim().eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::User,
        }
    }

    /// Wire label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether this role unlocks the admin affordances.
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_defaults_to_low() {
        assert_eq!(Severity::from_wire(None), Severity::Low);
        assert_eq!(Severity::from_wire(Some("")), Severity::Low);
        assert_eq!(Severity::from_wire(Some("catastrophic")), Severity::Low);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!(Severity::from_wire(Some("High")), Severity::High);
        assert_eq!(Severity::from_wire(Some("MEDIUM")), Severity::Medium);
        assert_eq!(Severity::from_wire(Some(" low ")), Severity::Low);
    }

    #[test]
    fn filter_parsing_and_display() {
        assert_eq!("all".parse::<SeverityFilter>().ok(), Some(SeverityFilter::All));
        assert_eq!(
            "high".parse::<SeverityFilter>().ok(),
            Some(SeverityFilter::Only(Severity::High))
        );
        assert!("severe".parse::<SeverityFilter>().is_err());
        assert_eq!(SeverityFilter::Only(Severity::Medium).to_string(), "Medium");
        assert_eq!(SeverityFilter::All.to_string(), "all");
    }

    #[test]
    fn filter_matches() {
        assert!(SeverityFilter::All.matches(Severity::Low));
        assert!(SeverityFilter::Only(Severity::High).matches(Severity::High));
        assert!(!SeverityFilter::Only(Severity::High).matches(Severity::Medium));
    }

    #[test]
    fn filter_serde_uses_labels() {
        let json = serde_json::to_string(&SeverityFilter::Only(Severity::Low)).ok();
        assert_eq!(json.as_deref(), Some("\"Low\""));
        let back: Option<SeverityFilter> = serde_json::from_str("\"all\"").ok();
        assert_eq!(back, Some(SeverityFilter::All));
    }

    #[test]
    fn role_is_least_privilege_by_default() {
        assert_eq!(Role::from_wire(None), Role::User);
        assert_eq!(Role::from_wire(Some("superuser")), Role::User);
        assert_eq!(Role::from_wire(Some("Admin")), Role::Admin);
        assert!(Role::Admin.is_admin());
        assert!(!Role::default().is_admin());
    }
}
