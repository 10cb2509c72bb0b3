//! The presentation seam.
//!
//! A [`Presenter`] receives a fresh [`DashboardView`] after every change, plus
//! the fire-and-forget side effects (camera moves, spoken alerts) and
//! user-visible notices. The terminal front end is one implementation; a
//! browser build would be another.

use disasterwatch_types::{Event, GeoPoint, SeverityFilter};

use crate::config::Theme;
use crate::feed::{CameraMove, EventFeed, FeedState, FeedStats, SpokenAlert};
use crate::markers::Marker;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something was refused or could not be done.
    Warning,
    /// A request failed.
    Error,
}

/// A message for the user, the equivalent of an alert dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// How prominent the notice should be.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// An informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// A warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// The map viewport: where the camera currently points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Map centre.
    pub center: GeoPoint,
    /// Zoom level.
    pub zoom: u8,
}

/// Everything a presentation layer needs to draw the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    /// Loading placeholder vs. populated dashboard.
    pub state: FeedState,
    /// Active filter.
    pub filter: SeverityFilter,
    /// Filtered events, newest first.
    pub events: Vec<&'a Event>,
    /// Map markers for the filtered events.
    pub markers: Vec<Marker>,
    /// Counts over the unfiltered feed.
    pub stats: FeedStats,
    /// Whether audible alerts are muted.
    pub muted: bool,
    /// Whether admin affordances (delete, export) are shown.
    pub admin: bool,
    /// Current map viewport.
    pub viewport: Viewport,
    /// Visual theme.
    pub theme: Theme,
}

impl<'a> DashboardView<'a> {
    /// Derive a view from the feed.
    pub fn build(feed: &'a EventFeed, viewport: Viewport, theme: Theme, admin: bool) -> Self {
        Self {
            state: feed.state(),
            filter: feed.filter(),
            events: feed.filtered(),
            markers: feed.markers(theme),
            stats: feed.stats(),
            muted: feed.is_muted(),
            admin,
            viewport,
            theme,
        }
    }

    /// Whether the loading placeholder should be shown.
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, FeedState::Uninitialized)
    }
}

/// Receiver of views, side effects and notices.
pub trait Presenter {
    /// Draw the dashboard.
    fn render(&mut self, view: &DashboardView<'_>);

    /// Move the map camera.
    fn recenter(&mut self, camera: &CameraMove);

    /// Play an audible alert.
    fn announce(&mut self, alert: &SpokenAlert);

    /// Show a notice to the user.
    fn notify(&mut self, notice: &Notice);
}
