//! Terminal presentation of the dashboard.
//!
//! [`TerminalPresenter`] redraws the whole dashboard as text on every render
//! and prints camera moves, spoken alerts and notices as single lines. A
//! spoken alert rings the terminal bell.

use std::fmt::Write as _;
use std::io::Write;

use disasterwatch_core::config::TILE_ATTRIBUTION;
use disasterwatch_core::feed::{CameraMove, SpokenAlert};
use disasterwatch_core::{DashboardView, Notice, NoticeLevel, Presenter};
use disasterwatch_types::Severity;
use tracing::debug;

const BELL: char = '\u{7}';

/// Widest place text shown in the event table.
const PLACE_WIDTH: usize = 28;

/// Presenter writing to a terminal (or any writer).
#[derive(Debug)]
pub struct TerminalPresenter<W> {
    out: W,
}

impl<W: Write> TerminalPresenter<W> {
    /// Presenter over `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Borrow the underlying writer.
    #[cfg(test)]
    pub const fn output(&self) -> &W {
        &self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            debug!(error = %e, "terminal write failed");
        }
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, view: &DashboardView<'_>) {
        let frame = render_view(view);
        self.emit(&frame);
    }

    fn recenter(&mut self, camera: &CameraMove) {
        let line = format!(
            "Map -> {:.4}, {:.4} (zoom {}, {:.1}s)\n",
            camera.target.lat,
            camera.target.lon,
            camera.zoom,
            camera.duration.as_secs_f64()
        );
        self.emit(&line);
    }

    fn announce(&mut self, alert: &SpokenAlert) {
        let line = format!("{BELL}ALERT  {}\n", alert.text);
        self.emit(&line);
    }

    fn notify(&mut self, notice: &Notice) {
        let label = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        let line = format!("[{label}] {}\n", notice.message);
        self.emit(&line);
    }
}

/// Draw a full dashboard frame.
pub fn render_view(view: &DashboardView<'_>) -> String {
    let mut out = String::new();
    if view.is_loading() {
        out.push_str("Loading live alerts...\n");
        return out;
    }

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "== DisasterWatch == filter: {} | theme: {} | sound: {}{}",
        view.filter,
        view.theme,
        if view.muted { "muted" } else { "on" },
        if view.admin { " | admin" } else { "" },
    );
    let _ = write!(out, "Total {}", view.stats.total);
    for severity in Severity::ALL {
        let _ = write!(out, "  {} {}", severity, view.stats.count(severity));
    }
    out.push('\n');

    if view.events.is_empty() {
        out.push_str("No events match the current filter.\n");
    } else {
        let _ = writeln!(
            out,
            "  {:<16}  {:<6}  {:<14}  {:<width$}  ID",
            "TIME",
            "LEVEL",
            "TYPE",
            "PLACE",
            width = PLACE_WIDTH,
        );
        for event in &view.events {
            let _ = writeln!(
                out,
                "  {:<16}  {:<6}  {:<14}  {:<width$}  {}",
                event.time.format("%Y-%m-%d %H:%M").to_string(),
                event.severity,
                event.event_type,
                truncate(&event.place, PLACE_WIDTH),
                event.id,
                width = PLACE_WIDTH,
            );
        }
    }

    let _ = writeln!(
        out,
        "Map: {} marker(s), centre {:.4}, {:.4}, zoom {}",
        view.markers.len(),
        view.viewport.center.lat,
        view.viewport.center.lon,
        view.viewport.zoom
    );
    let _ = writeln!(out, "Tiles: {} ({TILE_ATTRIBUTION})", view.theme.tile_url());
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('\u{2026}');
    short
}
