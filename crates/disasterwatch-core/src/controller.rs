//! The dashboard controller.
//!
//! [`DashboardController`] is the single owner of the [`EventFeed`]. It pulls
//! the snapshot and issues deletes through a [`FeedBackend`], applies pushed
//! events, gates admin actions on the [`SessionContext`], and hands every
//! resulting view, side effect and notice to a [`Presenter`].
//!
//! All methods take `&mut self`: the controller is driven from one task, so
//! handlers run to completion one at a time and the feed needs no lock.
//! Awaiting happens only inside [`load_snapshot`] and [`delete_event`].
//!
//! [`load_snapshot`]: DashboardController::load_snapshot
//! [`delete_event`]: DashboardController::delete_event

use std::path::Path;

use chrono::Utc;
use disasterwatch_types::{EventId, RawEvent, SeverityFilter};
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, FeedBackend};
use crate::config::{DashboardConfig, DeleteFailurePolicy, Theme};
use crate::error::CoreError;
use crate::export::{Report, ReportFormat};
use crate::feed::{EventFeed, FlyTo, SideEffect, SnapshotSummary};
use crate::presenter::{DashboardView, Notice, Presenter, Viewport};
use crate::session::SessionContext;

/// Message shown when a non-admin attempts an admin action.
pub const ACCESS_DENIED: &str = "Access denied: administrator privileges required.";

/// Construction options, usually derived from [`DashboardConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerOptions {
    /// Camera behaviour for pushed and focused events.
    pub fly_to: FlyTo,
    /// Initial map viewport.
    pub viewport: Viewport,
    /// Visual theme.
    pub theme: Theme,
    /// Start with audible alerts muted.
    pub muted: bool,
    /// Reaction to a rejected delete.
    pub delete_failure_policy: DeleteFailurePolicy,
}

impl ControllerOptions {
    /// Derive options from the loaded configuration.
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            fly_to: FlyTo::from(&config.map),
            viewport: Viewport {
                center: config.map.center,
                zoom: config.map.initial_zoom,
            },
            theme: config.theme,
            muted: config.alerts.muted,
            delete_failure_policy: config.delete_failure_policy,
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The backend confirmed the delete.
    Deleted,
    /// The session is not allowed to delete; nothing was removed.
    Denied,
    /// No event with that id is in the feed.
    NotFound,
    /// The backend refused or was unreachable. What happened locally depends
    /// on the [`DeleteFailurePolicy`].
    Failed(BackendError),
}

/// Owner of the live feed and its collaborators.
#[derive(Debug)]
pub struct DashboardController<B, P> {
    feed: EventFeed,
    backend: B,
    presenter: P,
    session: SessionContext,
    viewport: Viewport,
    theme: Theme,
    delete_policy: DeleteFailurePolicy,
}

impl<B, P> DashboardController<B, P>
where
    B: FeedBackend,
    P: Presenter,
{
    /// Mount the controller. The feed starts uninitialized; the presenter
    /// gets the loading view immediately.
    pub fn new(backend: B, presenter: P, session: SessionContext, options: ControllerOptions) -> Self {
        let mut feed = EventFeed::new(options.fly_to);
        feed.set_muted(options.muted);
        let mut controller = Self {
            feed,
            backend,
            presenter,
            session,
            viewport: options.viewport,
            theme: options.theme,
            delete_policy: options.delete_failure_policy,
        };
        controller.render();
        controller
    }

    /// The feed.
    pub const fn feed(&self) -> &EventFeed {
        &self.feed
    }

    /// The presenter.
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The presenter, mutably.
    pub const fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// The session handle.
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Current map viewport.
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Fetch the snapshot and replace the feed with it.
    ///
    /// On failure the feed keeps its previous contents and the failure is
    /// logged only; nothing is retried. Either way the feed ends up ready.
    pub async fn load_snapshot(&mut self) -> Option<SnapshotSummary> {
        let summary = match self.backend.fetch_alerts().await {
            Ok(records) => {
                let summary = self.feed.apply_snapshot(&records);
                info!(
                    accepted = summary.accepted,
                    rejected = summary.rejected,
                    duplicates = summary.duplicates,
                    "alert snapshot loaded"
                );
                Some(summary)
            }
            Err(e) => {
                error!(error = %e, "error fetching alerts");
                self.feed.snapshot_failed();
                None
            }
        };
        self.render();
        summary
    }

    /// Apply one pushed event and dispatch its side effects.
    ///
    /// Undecodable payloads are logged and dropped.
    pub fn on_push(&mut self, raw: &RawEvent) {
        let effects = match self.feed.on_push(raw) {
            Ok(effects) => effects,
            Err(e) => {
                warn!(error = %e, "dropping pushed alert");
                return;
            }
        };
        debug!(id = raw.id.as_deref().unwrap_or(""), effects = effects.len(), "new event received");

        for effect in &effects {
            match effect {
                SideEffect::Recenter(camera) => {
                    self.viewport = Viewport {
                        center: camera.target,
                        zoom: camera.zoom,
                    };
                    self.presenter.recenter(camera);
                }
                SideEffect::Announce(alert) => self.presenter.announce(alert),
            }
        }
        self.render();
    }

    /// Change the severity filter. No network activity.
    pub fn set_filter(&mut self, filter: SeverityFilter) {
        self.feed.set_filter(filter);
        self.render();
    }

    /// Mute or unmute audible alerts.
    pub fn set_muted(&mut self, muted: bool) {
        self.feed.set_muted(muted);
        self.render();
    }

    /// Fly the camera to a listed event. Returns `false` when the event is
    /// unknown or has no coordinates.
    pub fn focus(&mut self, id: &EventId) -> bool {
        let Some(camera) = self.feed.focus(id) else {
            return false;
        };
        self.viewport = Viewport {
            center: camera.target,
            zoom: camera.zoom,
        };
        self.presenter.recenter(&camera);
        true
    }

    /// Delete an event: remove it locally at once, then ask the backend.
    ///
    /// Requires an admin session with a token. The removal is rendered
    /// before the request is sent. On failure the user is notified and the
    /// configured [`DeleteFailurePolicy`] decides what happens locally; with
    /// the default `Keep` the event stays removed until the next snapshot.
    pub async fn delete_event(&mut self, id: &EventId) -> DeleteOutcome {
        let session = self.session.current();
        let token = match session.token.as_deref() {
            Some(token) if session.role().is_admin() => token.to_owned(),
            _ => {
                warn!(%id, "delete refused: not an admin session");
                self.presenter.notify(&Notice::warning(ACCESS_DENIED));
                return DeleteOutcome::Denied;
            }
        };

        let Some(pending) = self.feed.begin_delete(id) else {
            self.presenter
                .notify(&Notice::warning(format!("No event with id {id}.")));
            return DeleteOutcome::NotFound;
        };
        self.render();

        match self.backend.delete_alert(id, &token).await {
            Ok(()) => {
                info!(%id, "deleted event");
                DeleteOutcome::Deleted
            }
            Err(e) => {
                error!(%id, error = %e, policy = ?self.delete_policy, "failed to delete event");
                self.presenter.notify(&Notice::error(e.delete_failure_message()));
                match self.delete_policy {
                    DeleteFailurePolicy::Keep => {}
                    DeleteFailurePolicy::Reinsert => {
                        if !self.feed.restore(pending) {
                            debug!(%id, "event reappeared before restore, keeping newer copy");
                        }
                        self.render();
                    }
                    DeleteFailurePolicy::Resync => {
                        let _ = self.load_snapshot().await;
                    }
                }
                DeleteOutcome::Failed(e)
            }
        }
    }

    /// Capture a report of the current view. Admin only.
    pub fn report(&mut self) -> Result<Report, CoreError> {
        if !self.session.current().is_admin() {
            self.presenter.notify(&Notice::warning(ACCESS_DENIED));
            return Err(CoreError::AccessDenied(String::from("report export")));
        }
        Ok(Report::capture(&self.feed, Utc::now()))
    }

    /// Write a report of the current view to `path`. Admin only.
    pub fn export_report(&mut self, path: &Path) -> Result<ReportFormat, CoreError> {
        let report = self.report()?;
        match report.write_to(path) {
            Ok(format) => {
                info!(path = %path.display(), events = report.events.len(), "report exported");
                self.presenter
                    .notify(&Notice::info(format!("Report written to {}", path.display())));
                Ok(format)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "report export failed");
                self.presenter.notify(&Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Re-render after the session changed (sign in/out elsewhere).
    pub fn session_changed(&mut self) {
        self.render();
    }

    fn render(&mut self) {
        let admin = self.session.current().is_admin();
        let view = DashboardView::build(&self.feed, self.viewport, self.theme, admin);
        self.presenter.render(&view);
    }
}
