use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Refresh log entry (JSONL)
// ---------------------------------------------------------------------------

/// One refresh cycle in `~/.coin-dash/refresh-log.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshLogEntry {
    pub timestamp: String,
    /// What started the cycle: `"mount"`, `"timer"` or `"manual"`.
    pub trigger: String,
    pub success: bool,
    /// Number of coins received, `0` on failure.
    #[serde(default)]
    pub coin_count: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// Where refresh entries and server events are written.
///
/// All writes are best-effort: I/O failures never reach the caller.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    refresh_path: Option<PathBuf>,
    server_path: Option<PathBuf>,
}

impl EventLog {
    /// Logs under `~/.coin-dash/`.
    pub fn default_location() -> Self {
        match crate::config::data_dir() {
            Some(dir) => Self::in_dir(&dir),
            None => Self::disabled(),
        }
    }

    /// Logs under an explicit directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            refresh_path: Some(dir.join("refresh-log.jsonl")),
            server_path: Some(dir.join("server.log")),
        }
    }

    /// Discard everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Default location when `enabled`, otherwise disabled.
    pub fn from_config(enabled: bool) -> Self {
        if enabled {
            Self::default_location()
        } else {
            Self::disabled()
        }
    }

    pub fn refresh_log_path(&self) -> Option<&Path> {
        self.refresh_path.as_deref()
    }

    pub fn server_log_path(&self) -> Option<&Path> {
        self.server_path.as_deref()
    }

    /// Append one refresh entry.
    pub fn record_refresh(&self, entry: &RefreshLogEntry) {
        if let Some(path) = &self.refresh_path {
            let _ = append_json_line(path, entry);
        }
    }

    /// Append a timestamped line to the server log.
    pub fn server_event(&self, message: &str) {
        let Some(path) = &self.server_path else {
            return;
        };
        let _ = append_line(path, &format!("{} {}", Utc::now().to_rfc3339(), message));
    }

    /// Read all refresh entries, skipping malformed lines.
    pub fn read_refreshes(&self) -> Vec<RefreshLogEntry> {
        let Some(path) = &self.refresh_path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<RefreshLogEntry>(&line).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_json_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    append_line(path, &json)
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(tag: &str) -> (EventLog, PathBuf) {
        let dir = std::env::temp_dir().join(format!("coin-dash-log-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        (EventLog::in_dir(&dir), dir)
    }

    fn entry(trigger: &str, success: bool) -> RefreshLogEntry {
        RefreshLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            trigger: trigger.to_string(),
            success,
            coin_count: if success { 10 } else { 0 },
            error: (!success).then(|| "Failed to fetch prices".to_string()),
            latency_ms: 120,
        }
    }

    #[test]
    fn refresh_entries_round_trip_through_file() {
        let (log, dir) = temp_log("roundtrip");
        log.record_refresh(&entry("mount", true));
        log.record_refresh(&entry("timer", false));

        let entries = log.read_refreshes();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].trigger, "mount");
        assert!(!entries[1].success);
        assert_eq!(entries[1].error.as_deref(), Some("Failed to fetch prices"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (log, dir) = temp_log("malformed");
        log.record_refresh(&entry("manual", true));
        append_line(log.refresh_log_path().unwrap(), "{not json").unwrap();

        assert_eq!(log.read_refreshes().len(), 1);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn server_events_are_timestamped() {
        let (log, dir) = temp_log("server");
        log.server_event("listening");
        let content = fs::read_to_string(log.server_log_path().unwrap()).unwrap();
        assert!(content.trim_end().ends_with(" listening"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let log = EventLog::disabled();
        log.record_refresh(&entry("mount", true));
        log.server_event("ignored");
        assert!(log.read_refreshes().is_empty());
        assert!(log.refresh_log_path().is_none());
    }
}
