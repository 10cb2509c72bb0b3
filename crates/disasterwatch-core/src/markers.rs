//! Map marker derivation.
//!
//! Markers are a pure projection of the filtered event list: one circle per
//! event that has coordinates, sized and coloured by severity.

use disasterwatch_types::{Event, EventId, GeoPoint, Severity};
use serde::Serialize;

use crate::config::Theme;

/// Visual style of a severity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    /// Fill colour as a `#RRGGBB` hex string.
    pub fill: &'static str,
    /// Circle radius in pixels.
    pub radius: u8,
}

/// Style for a severity bucket.
pub const fn style_for(severity: Severity) -> MarkerStyle {
    match severity {
        Severity::High => MarkerStyle {
            fill: "#EA4335",
            radius: 12,
        },
        Severity::Medium => MarkerStyle {
            fill: "#FBBC05",
            radius: 10,
        },
        Severity::Low => MarkerStyle {
            fill: "#4285F4",
            radius: 8,
        },
    }
}

/// A circle marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    /// The event this marker stands for.
    pub event_id: EventId,
    /// Marker position.
    pub point: GeoPoint,
    /// Fill and size.
    pub style: MarkerStyle,
    /// Outline colour (depends on the theme).
    pub outline: &'static str,
    /// Popup contents.
    pub popup: Popup,
}

/// Text shown when a marker is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Popup {
    /// Event category, shown as the heading.
    pub title: String,
    /// Place description.
    pub place: String,
    /// `Severity: High` style line.
    pub severity_line: String,
}

impl Popup {
    fn for_event(event: &Event) -> Self {
        Self {
            title: event.event_type.to_uppercase(),
            place: event.place.clone(),
            severity_line: format!("Severity: {}", event.severity),
        }
    }
}

/// Build markers for the given events, skipping those without coordinates.
/// Order follows the input.
pub fn markers<'a, I>(events: I, theme: Theme) -> Vec<Marker>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .filter_map(|event| {
            event.point().map(|point| Marker {
                event_id: event.id.clone(),
                point,
                style: style_for(event.severity),
                outline: theme.marker_outline(),
                popup: Popup::for_event(event),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn event(id: &str, severity: Severity, point: Option<(f64, f64)>) -> Event {
        Event {
            id: EventId::from(id),
            event_type: String::from("Cyclone"),
            place: String::from("Odisha coast"),
            severity,
            time: Utc::now(),
            lat: point.map(|p| p.0),
            lon: point.map(|p| p.1),
        }
    }

    #[test]
    fn styles_scale_with_severity() {
        assert_eq!(style_for(Severity::High).radius, 12);
        assert_eq!(style_for(Severity::Medium).radius, 10);
        assert_eq!(style_for(Severity::Low).radius, 8);
        assert_eq!(style_for(Severity::High).fill, "#EA4335");
    }

    #[test]
    fn events_without_coordinates_get_no_marker() {
        let events = [
            event("a", Severity::High, Some((19.8, 85.8))),
            event("b", Severity::Low, None),
            event("c", Severity::Medium, Some((20.1, 86.0))),
        ];
        let built = markers(&events, Theme::Light);
        let ids: Vec<&str> = built.iter().map(|m| m.event_id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn popup_describes_event() {
        let events = [event("a", Severity::High, Some((19.8, 85.8)))];
        let built = markers(&events, Theme::Dark);
        let popup = built.first().map(|m| m.popup.clone());
        assert_eq!(popup.as_ref().map(|p| p.title.as_str()), Some("CYCLONE"));
        assert_eq!(
            popup.as_ref().map(|p| p.severity_line.as_str()),
            Some("Severity: High")
        );
        assert_eq!(built.first().map(|m| m.outline), Some("#FFFFFF"));
    }
}
