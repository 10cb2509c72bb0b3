//! Admin report export.
//!
//! A [`Report`] captures the filtered event list and the aggregate counts at
//! a point in time. It is written as JSON or as a plain-text table, picked
//! from the destination's extension. Paged/PDF rendering belongs to an
//! external renderer that consumes the JSON form.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use disasterwatch_types::{Event, Severity, SeverityFilter};
use serde::Serialize;

use crate::error::CoreError;
use crate::feed::{EventFeed, FeedStats};

/// Output encoding of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Pretty-printed JSON.
    Json,
    /// Human-readable text.
    Text,
}

impl ReportFormat {
    /// Pick a format from a file extension: `.json` is JSON, anything else
    /// is text.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// A point-in-time situation report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Filter in effect for `events`.
    pub filter: SeverityFilter,
    /// Counts over the whole feed.
    pub stats: FeedStats,
    /// Events passing the filter, newest first.
    pub events: Vec<Event>,
}

impl Report {
    /// Capture the feed's current filtered view.
    pub fn capture(feed: &EventFeed, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            filter: feed.filter(),
            stats: feed.stats(),
            events: feed.filtered_iter().cloned().collect(),
        }
    }

    /// Encode the report.
    pub fn render(&self, format: ReportFormat) -> Result<String, CoreError> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ReportFormat::Text => Ok(self.render_text()),
        }
    }

    /// Encode and write the report, choosing the format from the extension.
    pub fn write_to(&self, path: &Path) -> Result<ReportFormat, CoreError> {
        let format = ReportFormat::for_path(path);
        let contents = self.render(format)?;
        std::fs::write(path, contents).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(format)
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "DisasterWatch situation report");
        let _ = writeln!(out, "Generated: {}", self.generated_at.to_rfc3339());
        let _ = writeln!(out, "Filter:    {}", self.filter);
        let _ = writeln!(out, "Total events: {}", self.stats.total);
        for severity in Severity::ALL {
            let _ = writeln!(out, "  {:<6} {}", severity, self.stats.count(severity));
        }
        let _ = writeln!(out);
        for event in &self.events {
            let position = event
                .point()
                .map_or_else(|| String::from("-"), |p| format!("{:.4},{:.4}", p.lat, p.lon));
            let _ = writeln!(
                out,
                "{}  {:<6}  {:<14}  {}  [{}]  {}",
                event.time.format("%Y-%m-%d %H:%M"),
                event.severity,
                event.event_type,
                event.place,
                position,
                event.id,
            );
        }
        out
    }
}
