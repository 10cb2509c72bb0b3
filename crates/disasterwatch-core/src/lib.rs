//! Live event feed, session context and presentation model for the
//! DisasterWatch dashboard.
//!
//! The dashboard merges an initial REST snapshot of disaster alerts with a
//! continuous push stream, keeps a filterable list in sync with map markers
//! and aggregate counts, and drives camera moves and audible alerts from
//! incoming data.
//!
//! # Modules
//!
//! - [`feed`] -- [`EventFeed`], the authoritative event list and its derived
//!   views.
//! - [`normalize`] -- Raw alert record to canonical event mapping.
//! - [`markers`] -- Severity-styled map markers.
//! - [`controller`] -- [`DashboardController`], which owns the feed and
//!   drives the [`FeedBackend`] and [`Presenter`] seams.
//! - [`backend`] -- The REST collaborator seam.
//! - [`presenter`] -- The presentation seam and [`DashboardView`].
//! - [`session`] -- Persisted token + profile with subscribe/notify.
//! - [`export`] -- Admin situation reports.
//! - [`config`] -- YAML configuration with environment overrides.
//!
//! [`EventFeed`]: feed::EventFeed
//! [`DashboardController`]: controller::DashboardController
//! [`FeedBackend`]: backend::FeedBackend
//! [`Presenter`]: presenter::Presenter
//! [`DashboardView`]: presenter::DashboardView

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod feed;
pub mod markers;
pub mod normalize;
pub mod presenter;
pub mod session;

// Re-export primary types for convenience.
pub use backend::{BackendError, FeedBackend};
pub use config::{ConfigError, DashboardConfig, DeleteFailurePolicy, Theme};
pub use controller::{ControllerOptions, DashboardController, DeleteOutcome};
pub use error::CoreError;
pub use feed::{CameraMove, EventFeed, FeedState, FeedStats, SideEffect, SpokenAlert};
pub use presenter::{DashboardView, Notice, NoticeLevel, Presenter, Viewport};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionContext, SessionStore};
