//! Refresh history summary for `coin-dash history`.

use std::collections::BTreeMap;

use crate::analytics::logger::RefreshLogEntry;

/// Aggregate over the refresh log.
#[derive(Debug, Default, PartialEq)]
pub struct RefreshSummary {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub avg_latency_ms: f64,
    /// Cycle count per trigger name, sorted by name.
    pub by_trigger: BTreeMap<String, usize>,
    /// Most recent error message, if any cycle failed.
    pub last_error: Option<String>,
}

impl RefreshSummary {
    /// Success rate in percent, `0.0` when empty.
    pub fn success_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.successes as f64 / self.total as f64) * 100.0
        }
    }
}

pub fn summarize(entries: &[RefreshLogEntry]) -> RefreshSummary {
    if entries.is_empty() {
        return RefreshSummary::default();
    }

    let successes = entries.iter().filter(|e| e.success).count();
    let total_latency: u64 = entries.iter().map(|e| e.latency_ms).sum();

    let mut by_trigger = BTreeMap::new();
    for entry in entries {
        *by_trigger.entry(entry.trigger.clone()).or_insert(0) += 1;
    }

    RefreshSummary {
        total: entries.len(),
        successes,
        failures: entries.len() - successes,
        avg_latency_ms: total_latency as f64 / entries.len() as f64,
        by_trigger,
        last_error: entries.iter().rev().find_map(|e| e.error.clone()),
    }
}

/// The last `limit` entries, oldest first.
pub fn recent(entries: &[RefreshLogEntry], limit: usize) -> &[RefreshLogEntry] {
    &entries[entries.len().saturating_sub(limit)..]
}
