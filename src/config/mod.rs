/// Configuration system for coin-dash.
///
/// Layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::DashConfig::default()`]
/// 2. **User global config**: `~/.coin-dash/config.toml`
/// 3. **Project local config**: `.coin-dash.toml` in the current directory
/// 4. **Environment variables**: `COIN_DASH_*` overrides (highest precedence)
///
/// Each TOML file is deserialized with `serde(default)`, so a later file
/// that exists replaces the earlier layer with its values plus defaults.
///
/// # Usage
///
/// ```rust,ignore
/// let cfg = coin_dash::config::load();
/// let url = coin_dash::proxy::upstream_url(&cfg.upstream.base_url);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> DashConfig {
    let mut config = DashConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);
    config
}

/// Load a TOML config file if it exists and parses.
///
/// Malformed files are ignored so that a typo never keeps the dashboard
/// from starting.
fn load_toml_file(path: Option<PathBuf>) -> Option<DashConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Data directory for config, preferences and logs: `~/.coin-dash/`.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".coin-dash"))
}

fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".coin-dash.toml"))
}

/// Path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// - `COIN_DASH_ADDR`: server listen address
/// - `COIN_DASH_UPSTREAM_URL`: market-data API base
/// - `COIN_DASH_REFRESH_SECS`: refresh interval in seconds
/// - `COIN_DASH_PREFERS_DARK`: system dark preference (`1`/`true`/`yes`/`on`)
/// - `COIN_DASH_LOGGING`: refresh/server log files on or off
fn apply_env_overrides(config: &mut DashConfig) {
    if let Ok(val) = std::env::var("COIN_DASH_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Ok(val) = std::env::var("COIN_DASH_UPSTREAM_URL")
        && !val.is_empty()
    {
        config.upstream.base_url = val;
    }
    if let Ok(val) = std::env::var("COIN_DASH_REFRESH_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.dashboard.refresh_interval_secs = secs;
    }
    if let Ok(val) = std::env::var("COIN_DASH_PREFERS_DARK") {
        config.dashboard.prefers_dark = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("COIN_DASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.coin-dash/config.toml`.
///
/// Fails if the file exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    write_config_file(&path, &DashConfig::default_toml())?;
    Ok(path)
}

/// Set one dotted key (e.g. `dashboard.refresh_interval_secs`) in the
/// global config file, keeping the existing value's type.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would no longer load.
    let _: DashConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    write_config_file(&path, &output)
}

fn write_config_file(path: &std::path::Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.coin-dash/ directory")?;
    }
    fs::write(path, content).context("failed to write config file")
}

/// Set a value in a TOML tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        for val in ["1", "true", "TRUE", "yes", "on", "ON"] {
            assert!(is_truthy(val), "{val}");
        }
        for val in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(val), "{val}");
        }
    }

    #[test]
    fn set_toml_value_updates_integer() {
        let mut root: toml::Value = toml::from_str(
            r#"
[dashboard]
refresh_interval_secs = 60
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "dashboard.refresh_interval_secs", "30").unwrap();
        assert_eq!(
            root["dashboard"]["refresh_interval_secs"].as_integer(),
            Some(30)
        );
    }

    #[test]
    fn set_toml_value_updates_bool_and_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[server]
addr = "127.0.0.1:3000"
open_browser = true
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "server.open_browser", "off").unwrap();
        set_toml_value(&mut root, "server.addr", "0.0.0.0:8080").unwrap();
        assert_eq!(root["server"]["open_browser"].as_bool(), Some(false));
        assert_eq!(root["server"]["addr"].as_str(), Some("0.0.0.0:8080"));
    }

    #[test]
    fn set_toml_value_updates_float() {
        let mut root: toml::Value = toml::from_str("[sparkline]\nstroke_width = 2.0\n").unwrap();
        set_toml_value(&mut root, "sparkline.stroke_width", "1.5").unwrap();
        assert_eq!(root["sparkline"]["stroke_width"].as_float(), Some(1.5));
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root: toml::Value = toml::from_str("[server]\naddr = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, "server.port", "v").is_err());
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root: toml::Value =
            toml::from_str("[dashboard]\nrefresh_interval_secs = 60\n").unwrap();
        assert!(set_toml_value(&mut root, "dashboard.refresh_interval_secs", "soon").is_err());
    }

    #[test]
    fn show_effective_config_parses_back() {
        let toml_str = show_effective_config().unwrap();
        let _: DashConfig = toml::from_str(&toml_str).unwrap();
    }
}
