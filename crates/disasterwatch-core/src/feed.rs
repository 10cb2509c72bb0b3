//! The event synchronization core.
//!
//! [`EventFeed`] owns the authoritative list of known disaster events. It
//! reconciles two independent sources, the one-shot REST snapshot and the
//! continuous push stream, and derives everything the presentation layers
//! show: the filtered list, the per-severity counts, the map markers and the
//! camera/audio side effects of a pushed event.
//!
//! # Invariants
//!
//! - Event ids are unique within the feed.
//! - The list is newest first: pushed events are prepended.
//! - The active filter never touches the underlying list; views are derived
//!   on demand and never cached.
//!
//! # State machine
//!
//! The feed starts [`FeedState::Uninitialized`] and becomes
//! [`FeedState::Ready`] when the first snapshot settles, whether it
//! succeeded or failed. It never goes back.
//!
//! The feed is plain data. It performs no I/O and holds no locks; the
//! controller owns it and drives it from a single task.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use disasterwatch_types::{Event, EventId, GeoPoint, RawEvent, Severity, SeverityFilter};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{MapConfig, Theme};
use crate::markers::{self, Marker};
use crate::normalize::{NormalizeError, normalize};

/// Externally visible lifecycle state of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    /// No snapshot has settled yet; views show a loading placeholder.
    #[default]
    Uninitialized,
    /// The first snapshot settled. The list may still be empty.
    Ready,
}

/// Aggregate counts over the unfiltered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FeedStats {
    /// Number of events in the feed.
    pub total: usize,
    /// Events in the `High` bucket.
    pub high: usize,
    /// Events in the `Medium` bucket.
    pub medium: usize,
    /// Events in the `Low` bucket.
    pub low: usize,
}

impl FeedStats {
    /// Count events per bucket.
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        events
            .into_iter()
            .fold(Self::default(), |mut stats, event| {
                stats.total = stats.total.saturating_add(1);
                let bucket = match event.severity {
                    Severity::High => &mut stats.high,
                    Severity::Medium => &mut stats.medium,
                    Severity::Low => &mut stats.low,
                };
                *bucket = bucket.saturating_add(1);
                stats
            })
    }

    /// Count for a single bucket.
    pub const fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Camera behaviour when flying to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlyTo {
    /// Target zoom level.
    pub zoom: u8,
    /// Animation duration.
    pub duration: Duration,
}

impl Default for FlyTo {
    fn default() -> Self {
        Self::from(&MapConfig::default())
    }
}

impl From<&MapConfig> for FlyTo {
    fn from(map: &MapConfig) -> Self {
        Self {
            zoom: map.fly_to_zoom,
            duration: Duration::from_millis(map.fly_duration_ms),
        }
    }
}

/// A request for the map viewport to move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMove {
    /// Where to centre the map, `[lat, lon]`.
    pub target: GeoPoint,
    /// Zoom level to end at.
    pub zoom: u8,
    /// Animation duration.
    pub duration: Duration,
}

/// A spoken/audible alert for a high-severity event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenAlert {
    /// The event that triggered the alert.
    pub event_id: EventId,
    /// Event category.
    pub event_type: String,
    /// Event place.
    pub place: String,
    /// The sentence to speak.
    pub text: String,
}

impl SpokenAlert {
    fn for_event(event: &Event) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            place: event.place.clone(),
            text: format!(
                "High severity {} reported at {}",
                event.event_type, event.place
            ),
        }
    }
}

/// Fire-and-forget consequences of a pushed event.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    /// Recentre the map on the event.
    Recenter(CameraMove),
    /// Announce the event audibly.
    Announce(SpokenAlert),
}

/// Outcome of applying a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotSummary {
    /// Records that became events.
    pub accepted: usize,
    /// Records dropped because they could not be normalized.
    pub rejected: usize,
    /// Records dropped because an earlier record had the same id.
    pub duplicates: usize,
}

/// An event removed ahead of the backend's confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    /// The removed event.
    pub event: Event,
    /// Its position before removal.
    pub index: usize,
}

/// The in-memory event collection plus its view settings.
#[derive(Debug, Clone, Default)]
pub struct EventFeed {
    /// All known events, newest first.
    events: Vec<Event>,
    /// Active severity filter.
    filter: SeverityFilter,
    /// Whether audible alerts are suppressed.
    muted: bool,
    /// Lifecycle state.
    state: FeedState,
    /// Camera behaviour for pushed and focused events.
    fly_to: FlyTo,
}

impl EventFeed {
    /// Create an empty, uninitialized feed.
    pub fn new(fly_to: FlyTo) -> Self {
        Self {
            fly_to,
            ..Self::default()
        }
    }

    /// Lifecycle state.
    pub const fn state(&self) -> FeedState {
        self.state
    }

    /// Whether the first snapshot has settled.
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, FeedState::Ready)
    }

    /// All events, newest first, ignoring the filter.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events, ignoring the filter.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the feed holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Look up an event by id.
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Active filter.
    pub const fn filter(&self) -> SeverityFilter {
        self.filter
    }

    /// Whether audible alerts are suppressed.
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    /// Suppress or re-enable audible alerts.
    pub const fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    // -----------------------------------------------------------------------
    // Sources
    // -----------------------------------------------------------------------

    /// Replace the whole collection with a snapshot.
    ///
    /// Server order is kept as given. Records that fail normalization are
    /// dropped and logged; a repeated id keeps its first occurrence. The feed
    /// becomes [`FeedState::Ready`].
    pub fn apply_snapshot(&mut self, records: &[RawEvent]) -> SnapshotSummary {
        self.apply_snapshot_at(records, Utc::now())
    }

    /// [`apply_snapshot`](Self::apply_snapshot) with an explicit clock.
    pub fn apply_snapshot_at(&mut self, records: &[RawEvent], now: DateTime<Utc>) -> SnapshotSummary {
        let mut summary = SnapshotSummary::default();
        let mut seen = HashSet::with_capacity(records.len());
        let mut events = Vec::with_capacity(records.len());

        for raw in records {
            match normalize(raw, now) {
                Ok(event) => {
                    if seen.insert(event.id.clone()) {
                        events.push(event);
                        summary.accepted = summary.accepted.saturating_add(1);
                    } else {
                        debug!(id = %event.id, "duplicate id in snapshot, keeping first");
                        summary.duplicates = summary.duplicates.saturating_add(1);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "dropping snapshot record");
                    summary.rejected = summary.rejected.saturating_add(1);
                }
            }
        }

        self.events = events;
        self.state = FeedState::Ready;
        summary
    }

    /// Record that the snapshot request failed. The collection is left as it
    /// was and the feed becomes [`FeedState::Ready`], so the loading
    /// placeholder is never shown indefinitely.
    pub const fn snapshot_failed(&mut self) {
        self.state = FeedState::Ready;
    }

    /// Apply one pushed event.
    ///
    /// The event is normalized and prepended. An existing event with the same
    /// id is replaced as a whole, so ids stay unique. Returns the side effects
    /// to dispatch: a recentre when the event has coordinates, and an
    /// announcement when it is `High` and alerts are not muted.
    pub fn on_push(&mut self, raw: &RawEvent) -> Result<Vec<SideEffect>, NormalizeError> {
        self.on_push_at(raw, Utc::now())
    }

    /// [`on_push`](Self::on_push) with an explicit clock.
    pub fn on_push_at(
        &mut self,
        raw: &RawEvent,
        now: DateTime<Utc>,
    ) -> Result<Vec<SideEffect>, NormalizeError> {
        let event = normalize(raw, now)?;

        if let Some(pos) = self.position(&event.id) {
            debug!(id = %event.id, "pushed event replaces existing entry");
            self.events.remove(pos);
        }

        let mut effects = Vec::new();
        if let Some(camera) = self.camera_for(&event) {
            effects.push(SideEffect::Recenter(camera));
        }
        if event.severity == Severity::High && !self.muted {
            effects.push(SideEffect::Announce(SpokenAlert::for_event(&event)));
        }

        self.events.insert(0, event);
        Ok(effects)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Change the active filter. Purely a view change.
    pub const fn set_filter(&mut self, filter: SeverityFilter) {
        self.filter = filter;
    }

    /// Events passing the active filter, in collection order.
    pub fn filtered(&self) -> Vec<&Event> {
        self.filtered_iter().collect()
    }

    /// Iterator form of [`filtered`](Self::filtered).
    pub fn filtered_iter(&self) -> impl Iterator<Item = &Event> + '_ {
        let filter = self.filter;
        self.events.iter().filter(move |e| filter.matches(e.severity))
    }

    /// Counts over the unfiltered collection.
    pub fn stats(&self) -> FeedStats {
        FeedStats::from_events(&self.events)
    }

    /// Markers for the filtered events that have coordinates.
    pub fn markers(&self, theme: Theme) -> Vec<Marker> {
        markers::markers(self.filtered_iter(), theme)
    }

    /// Camera move for a list selection. `None` when the event is unknown or
    /// has no coordinates.
    pub fn focus(&self, id: &EventId) -> Option<CameraMove> {
        self.get(id).and_then(|event| self.camera_for(event))
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    /// Remove an event ahead of the backend's confirmation.
    ///
    /// Returns `None` when the id is unknown.
    pub fn begin_delete(&mut self, id: &EventId) -> Option<PendingDelete> {
        let index = self.position(id)?;
        let event = self.events.remove(index);
        Some(PendingDelete { event, index })
    }

    /// Put an optimistically removed event back at its former position.
    ///
    /// Skipped when an event with the same id arrived in the meantime.
    /// Returns whether the event was restored.
    pub fn restore(&mut self, pending: PendingDelete) -> bool {
        if self.position(&pending.event.id).is_some() {
            return false;
        }
        let index = pending.index.min(self.events.len());
        self.events.insert(index, pending.event);
        true
    }

    fn position(&self, id: &EventId) -> Option<usize> {
        self.events.iter().position(|e| &e.id == id)
    }

    fn camera_for(&self, event: &Event) -> Option<CameraMove> {
        event.point().map(|target| CameraMove {
            target,
            zoom: self.fly_to.zoom,
            duration: self.fly_to.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(id: &str, severity: &str, coordinates: Option<[f64; 2]>) -> RawEvent {
        RawEvent {
            id: Some(id.to_owned()),
            disaster_type: Some(String::from("Flood")),
            location_text: Some(format!("Place {id}")),
            severity: Some(severity.to_owned()),
            timestamp: None,
            location: coordinates.map(|c| json!({ "coordinates": c })),
        }
    }

    fn ids(events: &[&Event]) -> Vec<String> {
        events.iter().map(|e| e.id.to_string()).collect()
    }

    fn ready_feed(records: &[RawEvent]) -> EventFeed {
        let mut feed = EventFeed::new(FlyTo::default());
        feed.apply_snapshot(records);
        feed
    }

    #[test]
    fn starts_uninitialized_and_empty() {
        let feed = EventFeed::default();
        assert_eq!(feed.state(), FeedState::Uninitialized);
        assert!(feed.is_empty());
        assert_eq!(feed.stats(), FeedStats::default());
    }

    #[test]
    fn snapshot_replaces_collection_in_server_order() {
        let mut feed = ready_feed(&[raw("old", "Low", None)]);
        let summary = feed.apply_snapshot(&[
            raw("1", "High", None),
            raw("2", "Low", None),
            raw("3", "Medium", None),
        ]);
        assert_eq!(summary.accepted, 3);
        assert!(feed.is_ready());
        assert_eq!(ids(&feed.filtered()), ["1", "2", "3"]);
    }

    #[test]
    fn snapshot_drops_duplicates_and_unkeyed_records() {
        let mut unkeyed = raw("x", "High", None);
        unkeyed.id = None;
        let mut feed = EventFeed::default();
        let summary = feed.apply_snapshot(&[
            raw("1", "High", None),
            unkeyed,
            raw("1", "Low", None),
        ]);
        assert_eq!(summary, SnapshotSummary { accepted: 1, rejected: 1, duplicates: 1 });
        assert_eq!(feed.get(&EventId::from("1")).map(|e| e.severity), Some(Severity::High));
    }

    #[test]
    fn failed_snapshot_still_becomes_ready() {
        let mut feed = EventFeed::default();
        feed.snapshot_failed();
        assert!(feed.is_ready());
        assert!(feed.is_empty());
    }

    #[test]
    fn push_prepends_newest_first() {
        let mut feed = ready_feed(&[raw("1", "Low", None)]);
        let pushed = feed.on_push(&raw("2", "Medium", None));
        assert!(pushed.is_ok());
        assert_eq!(ids(&feed.filtered()), ["2", "1"]);
    }

    #[test]
    fn push_with_known_id_replaces_entry() {
        let mut feed = ready_feed(&[raw("1", "Low", None), raw("2", "Low", None)]);
        let _ = feed.on_push(&raw("2", "High", None));
        assert_eq!(feed.len(), 2);
        assert_eq!(ids(&feed.filtered()), ["2", "1"]);
        assert_eq!(feed.get(&EventId::from("2")).map(|e| e.severity), Some(Severity::High));
    }

    #[test]
    fn high_push_announces_once_and_recenters() {
        let mut feed = ready_feed(&[]);
        let effects = feed.on_push(&raw("7", "High", Some([72.8, 19.0]))).unwrap_or_default();

        let announcements: Vec<&SpokenAlert> = effects
            .iter()
            .filter_map(|e| match e {
                SideEffect::Announce(alert) => Some(alert),
                SideEffect::Recenter(_) => None,
            })
            .collect();
        assert_eq!(announcements.len(), 1);
        let alert = announcements.first().copied();
        assert_eq!(alert.map(|a| a.event_type.as_str()), Some("Flood"));
        assert_eq!(alert.map(|a| a.place.as_str()), Some("Place 7"));
        assert!(alert.is_some_and(|a| a.text.contains("Flood") && a.text.contains("Place 7")));

        let camera = effects.iter().find_map(|e| match e {
            SideEffect::Recenter(camera) => Some(*camera),
            SideEffect::Announce(_) => None,
        });
        assert_eq!(camera.map(|c| c.target), Some(GeoPoint::new(19.0, 72.8)));
        assert_eq!(camera.map(|c| c.zoom), Some(10));
    }

    #[test]
    fn muted_feed_does_not_announce() {
        let mut feed = ready_feed(&[]);
        feed.set_muted(true);
        let effects = feed.on_push(&raw("7", "High", None)).unwrap_or_default();
        assert!(effects.is_empty());
    }

    #[test]
    fn low_push_without_coordinates_has_no_effects() {
        let mut feed = ready_feed(&[]);
        let effects = feed.on_push(&raw("8", "Low", None)).unwrap_or_default();
        assert!(effects.is_empty());
    }

    #[test]
    fn push_without_location_is_listed_but_not_mapped() {
        let mut feed = ready_feed(&[raw("1", "Low", Some([77.2, 28.6]))]);
        let _ = feed.on_push(&raw("2", "Medium", None));
        assert_eq!(feed.stats().total, 2);
        assert_eq!(feed.filtered().len(), 2);
        let markers = feed.markers(Theme::Light);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers.first().map(|m| m.event_id.as_str()), Some("1"));
    }

    #[test]
    fn unkeyed_push_is_rejected_without_touching_state() {
        let mut feed = ready_feed(&[raw("1", "Low", None)]);
        let mut unkeyed = raw("2", "High", None);
        unkeyed.id = None;
        assert_eq!(feed.on_push(&unkeyed), Err(NormalizeError::MissingId));
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn filter_keeps_relative_order_and_not_the_collection() {
        let mut feed = ready_feed(&[
            raw("1", "High", None),
            raw("2", "Low", None),
            raw("3", "High", None),
            raw("4", "Medium", None),
        ]);
        feed.set_filter(SeverityFilter::Only(Severity::High));
        assert_eq!(ids(&feed.filtered()), ["1", "3"]);
        assert_eq!(feed.len(), 4);
        assert_eq!(feed.stats().total, 4);

        feed.set_filter(SeverityFilter::All);
        assert_eq!(ids(&feed.filtered()), ["1", "2", "3", "4"]);
    }

    #[test]
    fn stats_buckets_sum_to_total() {
        let feed = ready_feed(&[
            raw("1", "High", None),
            raw("2", "bogus", None),
            raw("3", "Medium", None),
            raw("4", "low", None),
        ]);
        let stats = feed.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.high, 1);
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.low, 2);
        let sum: usize = Severity::ALL.iter().map(|s| stats.count(*s)).sum();
        assert_eq!(sum, stats.total);
    }

    #[test]
    fn focus_requires_coordinates() {
        let feed = ready_feed(&[raw("1", "Low", Some([77.2, 28.6])), raw("2", "Low", None)]);
        assert!(feed.focus(&EventId::from("1")).is_some());
        assert!(feed.focus(&EventId::from("2")).is_none());
        assert!(feed.focus(&EventId::from("nope")).is_none());
    }

    #[test]
    fn begin_delete_removes_immediately() {
        let mut feed = ready_feed(&[raw("1", "Low", None), raw("2", "Low", None)]);
        let pending = feed.begin_delete(&EventId::from("1"));
        assert_eq!(pending.as_ref().map(|p| p.index), Some(0));
        assert_eq!(ids(&feed.filtered()), ["2"]);
        assert!(feed.begin_delete(&EventId::from("1")).is_none());
    }

    #[test]
    fn restore_puts_event_back_in_place() {
        let mut feed = ready_feed(&[
            raw("1", "Low", None),
            raw("2", "Low", None),
            raw("3", "Low", None),
        ]);
        let pending = feed.begin_delete(&EventId::from("2"));
        assert!(pending.is_some_and(|p| feed.restore(p)));
        assert_eq!(ids(&feed.filtered()), ["1", "2", "3"]);
    }

    #[test]
    fn restore_skips_when_id_reappeared() {
        let mut feed = ready_feed(&[raw("1", "Low", None)]);
        let pending = feed.begin_delete(&EventId::from("1"));
        let _ = feed.on_push(&raw("1", "Medium", None));
        assert!(pending.is_some_and(|p| !feed.restore(p)));
        assert_eq!(feed.len(), 1);
    }
}
