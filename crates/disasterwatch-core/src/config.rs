//! Configuration loading and typed config structures for the dashboard.
//!
//! The configuration lives in a YAML file (`disasterwatch.yaml` by default).
//! Every section is optional and falls back to its defaults, so an empty
//! file, or no file at all, yields a working setup pointed at a local
//! backend.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use disasterwatch_types::GeoPoint;
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An override carried a value the field cannot hold.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// The override key (environment variable name).
        key: String,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Environment variable overriding [`BackendConfig::url`].
pub const ENV_BACKEND_URL: &str = "DISASTERWATCH_BACKEND_URL";
/// Environment variable overriding [`SessionConfig::dir`].
pub const ENV_SESSION_DIR: &str = "DISASTERWATCH_SESSION_DIR";
/// Environment variable overriding [`DashboardConfig::theme`].
pub const ENV_THEME: &str = "DISASTERWATCH_THEME";

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Where the REST API lives.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Push channel settings.
    #[serde(default)]
    pub push: PushConfig,

    /// Map viewport and camera settings.
    #[serde(default)]
    pub map: MapConfig,

    /// Audible alert settings.
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Visual theme.
    #[serde(default)]
    pub theme: Theme,

    /// Where the session (token + profile) is persisted.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// What happens to an optimistically removed event when the backend
    /// refuses the delete.
    #[serde(default)]
    pub delete_failure_policy: DeleteFailurePolicy,
}

impl DashboardConfig {
    /// Load configuration from `path` when the file exists (defaults
    /// otherwise), then apply the environment overrides once.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::InvalidValue`] if an override does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with an arbitrary override lookup.
    ///
    /// # Errors
    ///
    /// As for [`load`](Self::load).
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            Self::parse(&std::fs::read_to_string(path)?)?
        } else {
            Self::default()
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// - `DISASTERWATCH_BACKEND_URL` overrides `backend.url`
    /// - `DISASTERWATCH_SESSION_DIR` overrides `session.dir`
    /// - `DISASTERWATCH_THEME` overrides `theme` (`light` or `dark`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the theme is unknown.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            self.backend.url = url;
        }
        if let Some(dir) = lookup(ENV_SESSION_DIR) {
            self.session.dir = dir;
        }
        if let Some(theme) = lookup(ENV_THEME) {
            self.theme = theme.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_THEME.to_owned(),
                value: theme,
            })?;
        }
        Ok(())
    }
}

/// Backend REST API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, without a trailing `/api`.
    #[serde(default = "default_backend_url")]
    pub url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
        }
    }
}

/// Push channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConfig {
    /// Socket.IO endpoint path on the backend.
    #[serde(default = "default_push_path")]
    pub path: String,

    /// Name of the event carrying new alerts.
    #[serde(default = "default_push_event")]
    pub event: String,

    /// Delay before the transport reconnects after the socket drops.
    /// `0` disables reconnection.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl PushConfig {
    /// Reconnect delay, or `None` when reconnection is disabled.
    pub const fn reconnect_delay(&self) -> Option<Duration> {
        if self.reconnect_delay_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.reconnect_delay_ms))
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            path: default_push_path(),
            event: default_push_event(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Map viewport and camera configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial viewport centre.
    #[serde(default = "default_center")]
    pub center: GeoPoint,

    /// Initial zoom level.
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: u8,

    /// Zoom level used when the camera flies to an event.
    #[serde(default = "default_fly_to_zoom")]
    pub fly_to_zoom: u8,

    /// Duration of the fly-to animation in milliseconds.
    #[serde(default = "default_fly_duration_ms")]
    pub fly_duration_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: default_center(),
            initial_zoom: default_initial_zoom(),
            fly_to_zoom: default_fly_to_zoom(),
            fly_duration_ms: default_fly_duration_ms(),
        }
    }
}

/// Audible alert configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Start with alerts muted.
    #[serde(default)]
    pub muted: bool,
}

/// Session persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the `token` and `user.json` files.
    #[serde(default = "default_session_dir")]
    pub dir: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: default_session_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Attribution shown with the base map tiles.
pub const TILE_ATTRIBUTION: &str = "\u{a9} OpenStreetMap contributors \u{a9} CARTO";

/// Visual theme. One presentation layer, parameterized by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light base map.
    #[default]
    Light,
    /// Dark base map.
    Dark,
}

impl Theme {
    /// Raster tile URL template for the base map.
    pub const fn tile_url(self) -> &'static str {
        match self {
            Self::Light => "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png",
            Self::Dark => "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
        }
    }

    /// Outline colour used for map markers.
    pub const fn marker_outline(self) -> &'static str {
        match self {
            Self::Light => "#000000",
            Self::Dark => "#FFFFFF",
        }
    }

    /// Lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ConfigError::InvalidValue {
                key: String::from("theme"),
                value: s.to_owned(),
            }),
        }
    }
}

/// Reaction to a rejected optimistic delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteFailurePolicy {
    /// Leave the event removed locally until the next snapshot.
    #[default]
    Keep,
    /// Put the event back where it was.
    Reinsert,
    /// Reload the snapshot from the backend.
    Resync,
}

fn default_backend_url() -> String {
    String::from("http://localhost:4000")
}

fn default_push_path() -> String {
    String::from("/socket.io/")
}

fn default_push_event() -> String {
    String::from("new_event")
}

const fn default_reconnect_delay_ms() -> u64 {
    5000
}

const fn default_center() -> GeoPoint {
    GeoPoint::new(20.6, 78.9)
}

const fn default_initial_zoom() -> u8 {
    5
}

const fn default_fly_to_zoom() -> u8 {
    10
}

const fn default_fly_duration_ms() -> u64 {
    2500
}

fn default_session_dir() -> String {
    String::from(".disasterwatch")
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = DashboardConfig::parse("").ok();
        assert_eq!(config, Some(DashboardConfig::default()));
    }

    #[test]
    fn defaults_match_browser_build() {
        let config = DashboardConfig::default();
        assert_eq!(config.backend.url, "http://localhost:4000");
        assert_eq!(config.push.event, "new_event");
        assert_eq!(config.map.initial_zoom, 5);
        assert_eq!(config.map.fly_to_zoom, 10);
        assert_eq!(config.map.fly_duration_ms, 2500);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.delete_failure_policy, DeleteFailurePolicy::Keep);
        assert!(!config.alerts.muted);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = r"
backend:
  url: https://alerts.example.org
theme: dark
push:
  reconnect_delay_ms: 0
delete_failure_policy: resync
";
        let config = DashboardConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.backend.url, "https://alerts.example.org");
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.push.reconnect_delay(), None);
        assert_eq!(config.push.path, "/socket.io/");
        assert_eq!(config.delete_failure_policy, DeleteFailurePolicy::Resync);
        assert_eq!(config.map, MapConfig::default());
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let result = DashboardConfig::parse("theme: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn overrides_replace_values() {
        let env: BTreeMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://10.0.0.5:4000"),
            (ENV_SESSION_DIR, "/tmp/dw"),
            (ENV_THEME, "DARK"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        let result = config.apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()));
        assert!(result.is_ok());
        assert_eq!(config.backend.url, "http://10.0.0.5:4000");
        assert_eq!(config.session.dir, "/tmp/dw");
        assert_eq!(config.theme, Theme::Dark);
    }

    #[test]
    fn load_consults_each_override_once() {
        let dir = tempfile::tempdir();
        assert!(dir.is_ok());
        let Ok(dir) = dir else { return };
        let path = dir.path().join("disasterwatch.yaml");
        let written = std::fs::write(&path, "backend:\n  url: http://file:4000\ntheme: light\n");
        assert!(written.is_ok());

        let lookups = std::cell::Cell::new(0_usize);
        let config = DashboardConfig::load_with(&path, |key| {
            lookups.set(lookups.get() + 1);
            (key == ENV_THEME).then(|| String::from("dark"))
        });
        let config = config.ok();
        assert_eq!(lookups.get(), 3);
        assert_eq!(config.as_ref().map(|c| c.backend.url.as_str()), Some("http://file:4000"));
        assert_eq!(config.map(|c| c.theme), Some(Theme::Dark));
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir();
        assert!(dir.is_ok());
        let Ok(dir) = dir else { return };
        let config = DashboardConfig::load_with(&dir.path().join("missing.yaml"), |_| None);
        assert_eq!(config.ok(), Some(DashboardConfig::default()));
    }

    #[test]
    fn unknown_theme_override_is_rejected() {
        let mut config = DashboardConfig::default();
        let result = config.apply_overrides(|key| {
            (key == ENV_THEME).then(|| String::from("cyberpunk"))
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn theme_selects_tiles() {
        assert!(Theme::Dark.tile_url().contains("dark_all"));
        assert!(Theme::Light.tile_url().contains("voyager"));
    }

    #[test]
    fn theme_parses_its_label() {
        assert_eq!(" Dark ".parse::<Theme>().ok(), Some(Theme::Dark));
        assert_eq!(Theme::Light.to_string().parse::<Theme>().ok(), Some(Theme::Light));
        assert!("sepia".parse::<Theme>().is_err());
    }
}
