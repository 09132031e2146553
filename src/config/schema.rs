/// Configuration schema and defaults for coin-dash.
///
/// Sections: `[server]`, `[upstream]`, `[dashboard]`, `[sparkline]`,
/// `[logging]`. Every field has a built-in default, so a config file only
/// needs the values it overrides.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::proxy::{DEFAULT_TIMEOUT, DEFAULT_UPSTREAM_BASE};
use crate::sparkline::SparklineStyle;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Maps to `~/.coin-dash/config.toml` and `.coin-dash.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub dashboard: DashboardConfig,
    pub sparkline: SparklineConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `coin-dash serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [upstream]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Market-data API base; the markets path and query are fixed.
    pub base_url: String,
    /// Give up on one upstream call after this many seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl UpstreamConfig {
    /// Per-call timeout, never shorter than one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub refresh_interval_secs: u64,
    /// System dark-mode preference, used when no theme has been saved.
    pub prefers_dark: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 60,
            prefers_dark: false,
        }
    }
}

impl DashboardConfig {
    /// Refresh period, never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// [sparkline]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparklineConfig {
    pub width: u32,
    pub height: u32,
    pub stroke_width: f64,
}

impl Default for SparklineConfig {
    fn default() -> Self {
        let style = SparklineStyle::default();
        Self {
            width: style.width,
            height: style.height,
            stroke_width: style.stroke_width,
        }
    }
}

impl SparklineConfig {
    pub fn style(&self) -> SparklineStyle {
        SparklineStyle {
            width: self.width.max(3),
            height: self.height.max(3),
            stroke_width: self.stroke_width,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write the refresh and server logs under `~/.coin-dash/`.
    pub enabled: bool,
    /// Print one line per HTTP request to stdout.
    pub access_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            access_log: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl DashConfig {
    /// The annotated file written by `coin-dash config init`.
    pub fn default_toml() -> String {
        r#"# coin-dash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (COIN_DASH_*)
#   2. Project config (.coin-dash.toml in current directory)
#   3. User global config (~/.coin-dash/config.toml)
#   4. Built-in defaults

[server]
addr = "127.0.0.1:3000"
open_browser = true

[upstream]
base_url = "https://api.coingecko.com/api/v3"
timeout_secs = 10             # Per-call limit; a stalled fetch is abandoned

[dashboard]
refresh_interval_secs = 60
prefers_dark = false          # Used only until a theme has been saved

[sparkline]
width = 120
height = 28
stroke_width = 2.0

[logging]
enabled = true                # ~/.coin-dash/refresh-log.jsonl and server.log
access_log = true
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_behavior() {
        let config = DashConfig::default();
        assert_eq!(config.server.addr, "127.0.0.1:3000");
        assert_eq!(config.upstream.base_url, DEFAULT_UPSTREAM_BASE);
        assert_eq!(config.upstream.timeout(), Duration::from_secs(10));
        assert_eq!(config.dashboard.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.sparkline.style(), SparklineStyle::default());
        assert!(config.logging.enabled);
    }

    #[test]
    fn default_toml_parses_back_to_defaults() {
        let config: DashConfig = toml::from_str(&DashConfig::default_toml()).unwrap();
        assert_eq!(config, DashConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let toml_str = r#"
[dashboard]
refresh_interval_secs = 15

[sparkline]
width = 200
"#;
        let config: DashConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.dashboard.refresh_interval_secs, 15);
        assert!(!config.dashboard.prefers_dark);
        assert_eq!(config.sparkline.width, 200);
        assert_eq!(config.sparkline.height, 28);
        assert_eq!(config.server.addr, "127.0.0.1:3000");
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = DashboardConfig {
            refresh_interval_secs: 0,
            prefers_dark: false,
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: DashConfig = toml::from_str("").unwrap();
        assert_eq!(config, DashConfig::default());
    }
}
