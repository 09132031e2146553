use chrono::{DateTime, Local};
use serde::Serialize;

use super::model::CoinRecord;
use super::source::FetchError;

/// What started a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// First refresh when the dashboard starts.
    Mount,
    /// Periodic timer.
    Timer,
    /// User-requested refresh.
    Manual,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mount => write!(f, "mount"),
            Self::Timer => write!(f, "timer"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Result of one refresh cycle.
pub type RefreshOutcome = Result<Vec<CoinRecord>, FetchError>;

/// Observable dashboard state.
///
/// `coins` always holds the most recent successful fetch. A failed cycle
/// sets `error` and leaves `coins` alone.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardState {
    pub coins: Vec<CoinRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
    /// Trigger of the cycle currently running, if any.
    pub in_flight: Option<Trigger>,
    /// Incremented by every cycle start. Only the latest cycle may apply.
    pub generation: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            coins: Vec::new(),
            loading: true,
            error: None,
            last_updated: None,
            in_flight: None,
            generation: 0,
        }
    }
}

impl DashboardState {
    /// Enter the loading phase of a cycle.
    ///
    /// Returns the cycle's generation, or `None` (and changes nothing) when
    /// a cycle is already running.
    pub fn begin_refresh(&mut self, trigger: Trigger) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }
        Some(self.start(trigger))
    }

    /// Start a cycle even if one is running. The running cycle's result
    /// will no longer apply.
    pub fn supersede(&mut self, trigger: Trigger) -> u64 {
        self.start(trigger)
    }

    fn start(&mut self, trigger: Trigger) -> u64 {
        self.generation += 1;
        self.in_flight = Some(trigger);
        self.loading = true;
        self.error = None;
        self.generation
    }

    /// Finish cycle `generation` with its outcome.
    ///
    /// Returns `false` and leaves the state untouched when that cycle has
    /// been superseded or already finished.
    pub fn apply(
        &mut self,
        generation: u64,
        outcome: RefreshOutcome,
        now: DateTime<Local>,
    ) -> bool {
        if self.in_flight.is_none() || generation != self.generation {
            return false;
        }
        match outcome {
            Ok(coins) => {
                self.coins = coins;
                self.last_updated = Some(now);
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        self.loading = false;
        self.in_flight = None;
        true
    }

    /// Whether the table should be shown.
    ///
    /// The table stays up during background refreshes once data exists,
    /// and is hidden while an error is displayed.
    pub fn shows_table(&self) -> bool {
        self.error.is_none() && (!self.loading || !self.coins.is_empty())
    }

    /// Records matching `query`, see [`filter_coins`].
    pub fn filtered(&self, query: &str) -> Vec<&CoinRecord> {
        filter_coins(&self.coins, query)
    }
}

/// Case-insensitive substring filter on name or symbol.
///
/// An empty or whitespace-only query keeps every record. Order is preserved.
pub fn filter_coins<'a>(coins: &'a [CoinRecord], query: &str) -> Vec<&'a CoinRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return coins.iter().collect();
    }
    coins.iter().filter(|c| c.matches(&needle)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, name: &str, symbol: &str) -> CoinRecord {
        CoinRecord {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            current_price: Some(1.0),
            price_change_percentage_24h: None,
            market_cap: None,
            sparkline_in_7d: None,
        }
    }

    fn listing() -> Vec<CoinRecord> {
        vec![
            coin("bitcoin", "Bitcoin", "btc"),
            coin("ethereum", "Ethereum", "eth"),
            coin("tether", "Tether", "usdt"),
        ]
    }

    #[test]
    fn filter_empty_query_keeps_all_in_order() {
        let coins = listing();
        let ids: Vec<_> = filter_coins(&coins, "   ").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "ethereum", "tether"]);
        assert_eq!(filter_coins(&coins, "").len(), 3);
    }

    #[test]
    fn filter_is_case_insensitive_on_symbol() {
        let coins = listing();
        let hits = filter_coins(&coins, "ETH");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "ethereum");
    }

    #[test]
    fn filter_matches_name_substring_and_trims() {
        let coins = listing();
        let hits = filter_coins(&coins, "  ther ");
        let ids: Vec<_> = hits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ethereum", "tether"]);
    }

    #[test]
    fn filter_no_match_is_empty() {
        assert!(filter_coins(&listing(), "doge").is_empty());
    }

    #[test]
    fn success_replaces_coins_and_stamps_time() {
        let mut state = DashboardState::default();
        let generation = state.begin_refresh(Trigger::Mount).unwrap();
        let now = Local::now();
        assert!(state.apply(generation, Ok(listing()), now));

        assert_eq!(state.coins.len(), 3);
        assert_eq!(state.last_updated, Some(now));
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.in_flight, None);
    }

    #[test]
    fn failure_keeps_previous_coins() {
        let mut state = DashboardState::default();
        let generation = state.begin_refresh(Trigger::Mount).unwrap();
        let first = Local::now();
        state.apply(generation, Ok(listing()), first);

        let generation = state.begin_refresh(Trigger::Timer).unwrap();
        state.apply(generation, Err(FetchError::Status(429)), Local::now());

        assert_eq!(state.coins.len(), 3);
        assert_eq!(state.last_updated, Some(first));
        assert_eq!(state.error.as_deref(), Some("Failed to fetch prices"));
        assert!(!state.loading);
    }

    #[test]
    fn begin_refresh_rejects_overlap() {
        let mut state = DashboardState::default();
        assert_eq!(state.begin_refresh(Trigger::Timer), Some(1));
        assert_eq!(state.begin_refresh(Trigger::Manual), None);
        assert_eq!(state.in_flight, Some(Trigger::Timer));
        assert_eq!(state.generation, 1);
    }

    #[test]
    fn superseded_cycle_result_is_ignored() {
        let mut state = DashboardState::default();
        let stalled = state.begin_refresh(Trigger::Mount).unwrap();
        let current = state.supersede(Trigger::Timer);
        assert_ne!(stalled, current);
        assert_eq!(state.in_flight, Some(Trigger::Timer));

        assert!(state.apply(current, Ok(listing()), Local::now()));
        assert!(!state.apply(stalled, Err(FetchError::Status(504)), Local::now()));
        assert_eq!(state.coins.len(), 3);
        assert_eq!(state.error, None);
        assert!(!state.loading);
    }

    #[test]
    fn apply_without_running_cycle_is_ignored() {
        let mut state = DashboardState::default();
        let generation = state.begin_refresh(Trigger::Mount).unwrap();
        assert!(state.apply(generation, Ok(listing()), Local::now()));
        assert!(!state.apply(generation, Ok(Vec::new()), Local::now()));
        assert_eq!(state.coins.len(), 3);
    }

    #[test]
    fn begin_refresh_clears_previous_error() {
        let mut state = DashboardState::default();
        let generation = state.begin_refresh(Trigger::Mount).unwrap();
        state.apply(generation, Err(FetchError::Transport("boom".into())), Local::now());
        assert!(state.error.is_some());

        state.begin_refresh(Trigger::Manual);
        assert!(state.loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn table_visibility() {
        let mut state = DashboardState::default();
        assert!(!state.shows_table(), "initial load shows no table");

        let generation = state.begin_refresh(Trigger::Mount).unwrap();
        state.apply(generation, Ok(listing()), Local::now());
        assert!(state.shows_table());

        let generation = state.begin_refresh(Trigger::Timer).unwrap();
        assert!(state.shows_table(), "stale data stays visible while refreshing");

        state.apply(generation, Err(FetchError::Status(500)), Local::now());
        assert!(!state.shows_table(), "error hides the table");
    }
}
