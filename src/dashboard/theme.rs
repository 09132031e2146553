//! Light/dark theme with a persisted preference.
//!
//! The preference goes through a [`KeyValueStore`] under the single key
//! [`THEME_KEY`]. On load the persisted value wins, then the system dark
//! preference, then light.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Storage key of the theme preference.
pub const THEME_KEY: &str = "theme";

/// Dashboard color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme.
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => anyhow::bail!("unknown theme '{other}' (expected light or dark)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence port
// ---------------------------------------------------------------------------

/// String key-value persistence.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object file, by default `~/.coin-dash/preferences.json`.
///
/// Unreadable or malformed files read as empty.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location.
    pub fn open_default() -> Result<Self> {
        let path = preferences_path().context("could not determine home directory")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create preferences directory")?;
        }
        let json = serde_json::to_string_pretty(&entries)
            .context("failed to serialize preferences")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Path to the preferences file: `~/.coin-dash/preferences.json`.
pub fn preferences_path() -> Option<PathBuf> {
    crate::config::data_dir().map(|dir| dir.join("preferences.json"))
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the current theme and its persistence.
pub struct ThemeController<S: KeyValueStore> {
    store: S,
    theme: Theme,
}

impl<S: KeyValueStore> ThemeController<S> {
    /// Resolve the initial theme once: persisted value, else the system
    /// preference, else light. Invalid persisted values are ignored.
    pub fn load(store: S, prefers_dark: bool) -> Self {
        let saved = store.get(THEME_KEY).and_then(|v| v.parse::<Theme>().ok());
        let theme = saved.unwrap_or(if prefers_dark { Theme::Dark } else { Theme::Light });
        Self { store, theme }
    }

    pub fn get(&self) -> Theme {
        self.theme
    }

    /// Persist and apply `theme`. The current theme is unchanged when the
    /// store rejects the write.
    pub fn set(&mut self, theme: Theme) -> Result<()> {
        self.store
            .set(THEME_KEY, theme.as_str())
            .context("failed to persist theme")?;
        self.theme = theme;
        Ok(())
    }

    /// Flip the theme and persist it. Returns the new theme.
    pub fn toggle(&mut self) -> Result<Theme> {
        let next = self.theme.toggle();
        self.set(next)?;
        Ok(next)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
