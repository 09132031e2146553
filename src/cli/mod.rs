//! CLI command implementations.
//!
//! - `coin-dash serve`: run the proxy + dashboard server
//! - `coin-dash prices`: one refresh cycle printed to the terminal
//! - `coin-dash theme`: show or change the saved theme
//! - `coin-dash history`: refresh log summary
//! - `coin-dash health`: config, log and store locations
//! - `coin-dash config show|init|set|reset`: configuration management

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::logger::{EventLog, RefreshLogEntry};
use crate::analytics::reporter::{self, RefreshSummary};
use crate::config;
use crate::dashboard::source::{EndpointSource, ProxySource};
use crate::dashboard::theme::{self, FileStore};
use crate::dashboard::{CoinRecord, PriceSource, Theme, ThemeController, filter_coins};
use crate::proxy::{self, HttpUpstream};
use crate::sparkline::{self, Trend};
use crate::web::frontend::format_usd;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// coin-dash serve
// ---------------------------------------------------------------------------

pub fn run_serve(addr: Option<String>, no_browser: bool) -> Result<()> {
    let cfg = config::load();
    let addr = addr.unwrap_or_else(|| cfg.server.addr.clone());
    crate::web::run(&cfg, &addr, cfg.server.open_browser && !no_browser)
}

// ---------------------------------------------------------------------------
// coin-dash prices
// ---------------------------------------------------------------------------

/// Fetch once, through the in-process proxy or a running server.
pub fn run_prices(query: Option<&str>, format: OutputFormat, endpoint: Option<&str>) -> Result<()> {
    let cfg = config::load();

    let source: Box<dyn PriceSource> = match endpoint {
        Some(base) => Box::new(EndpointSource::new(base)),
        None => Box::new(ProxySource::new(
            Arc::new(HttpUpstream::with_timeout(cfg.upstream.timeout())),
            proxy::upstream_url(&cfg.upstream.base_url),
        )),
    };

    let coins = source.fetch_prices().context("refresh failed")?;
    let shown = filter_coins(&coins, query.unwrap_or(""));

    if shown.is_empty() {
        println!("{}", "No coins match.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        OutputFormat::Csv => print_prices_csv(&shown),
        OutputFormat::Table => print_prices_table(&shown),
    }
    Ok(())
}

fn print_prices_table(coins: &[&CoinRecord]) {
    println!("{}", "Top Coins by Market Cap".bold().cyan());
    println!(
        "  {:>3} {:<18} {:<7} {:>16} {:>9} {:>22} 7d",
        "#", "Name", "Symbol", "Price (USD)", "24h %", "Market Cap"
    );
    println!("  {}", "-".repeat(86));

    for (i, coin) in coins.iter().enumerate() {
        let change = match coin.price_change_percentage_24h {
            Some(v) if v >= 0.0 => format!("{:>8.2}%", v).green(),
            Some(v) => format!("{:>8.2}%", v).red(),
            None => format!("{:>9}", "—").normal(),
        };
        let trend = match sparkline::trend(coin.series()) {
            Some(Trend::Rising) => "rising".green(),
            Some(Trend::Falling) => "falling".red(),
            None => "—".dimmed(),
        };
        println!(
            "  {:>3} {:<18} {:<7} {:>16} {} {:>22} {}",
            i + 1,
            truncate(&coin.name, 18),
            coin.symbol.to_uppercase(),
            format_usd(coin.current_price),
            change,
            format_usd(coin.market_cap),
            trend,
        );
    }
}

fn print_prices_csv(coins: &[&CoinRecord]) {
    println!("id,name,symbol,current_price,price_change_percentage_24h,market_cap");
    for coin in coins {
        println!(
            "{},{},{},{},{},{}",
            coin.id,
            csv_field(&coin.name),
            coin.symbol,
            opt_number(coin.current_price),
            opt_number(coin.price_change_percentage_24h),
            opt_number(coin.market_cap),
        );
    }
}

// ---------------------------------------------------------------------------
// coin-dash theme
// ---------------------------------------------------------------------------

/// `show`, `toggle` or `set <theme>` on the saved preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set(String),
}

pub fn run_theme(action: ThemeAction) -> Result<()> {
    let cfg = config::load();
    let store = FileStore::open_default()?;
    let mut ctl = ThemeController::load(store, cfg.dashboard.prefers_dark);

    let theme = match action {
        ThemeAction::Show => ctl.get(),
        ThemeAction::Toggle => ctl.toggle()?,
        ThemeAction::Set(raw) => {
            let theme: Theme = raw.parse()?;
            ctl.set(theme)?;
            theme
        }
    };

    println!("{} {}", "Theme:".bold(), theme.to_string().cyan());
    Ok(())
}

// ---------------------------------------------------------------------------
// coin-dash history
// ---------------------------------------------------------------------------

pub fn run_history(limit: usize, format: OutputFormat) -> Result<()> {
    let entries = EventLog::default_location().read_refreshes();

    if entries.is_empty() {
        println!(
            "{}",
            "No refreshes logged yet. Run `coin-dash serve` to collect some.".yellow()
        );
        return Ok(());
    }

    let recent = reporter::recent(&entries, limit);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(recent)?),
        OutputFormat::Csv => print_history_csv(recent),
        OutputFormat::Table => print_history_table(&reporter::summarize(&entries), recent),
    }
    Ok(())
}

fn print_history_table(summary: &RefreshSummary, recent: &[RefreshLogEntry]) {
    println!("{}", "Refresh History".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Total cycles:".bold(), summary.total);
    println!(
        "  {} {} ({:.1}%)",
        "Succeeded:   ".bold(),
        summary.successes,
        summary.success_pct()
    );
    println!("  {} {}", "Failed:      ".bold(), summary.failures);
    println!("  {} {:.0} ms", "Avg latency: ".bold(), summary.avg_latency_ms);
    let triggers: Vec<String> = summary
        .by_trigger
        .iter()
        .map(|(name, count)| format!("{name}: {count}"))
        .collect();
    println!("  {} {}", "Triggers:    ".bold(), triggers.join("  "));
    if let Some(err) = &summary.last_error {
        println!("  {} {}", "Last error:  ".bold(), err.red());
    }
    println!();

    println!(
        "  {:<26} {:<8} {:>6} {:>8} Result",
        "Time", "Trigger", "Coins", "Latency"
    );
    println!("  {}", "-".repeat(58));
    for entry in recent {
        let result = if entry.success {
            "ok".green()
        } else {
            entry.error.as_deref().unwrap_or("failed").red()
        };
        println!(
            "  {:<26} {:<8} {:>6} {:>6}ms {}",
            truncate(&entry.timestamp, 26),
            entry.trigger,
            entry.coin_count,
            entry.latency_ms,
            result,
        );
    }
}

fn print_history_csv(recent: &[RefreshLogEntry]) {
    println!("timestamp,trigger,success,coin_count,latency_ms,error");
    for e in recent {
        println!(
            "{},{},{},{},{},{}",
            e.timestamp,
            e.trigger,
            e.success,
            e.coin_count,
            e.latency_ms,
            csv_field(e.error.as_deref().unwrap_or("")),
        );
    }
}

// ---------------------------------------------------------------------------
// coin-dash health
// ---------------------------------------------------------------------------

pub fn run_health() -> Result<()> {
    let cfg = config::load();
    let log = EventLog::from_config(cfg.logging.enabled);

    println!("{}", "coin-dash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let check = |label: &str, ok: bool, detail: String| {
        let mark = if ok { "OK".green() } else { "--".yellow() };
        println!("  [{}] {:<16} {}", mark, label, detail);
    };

    let global = config::global_config_file();
    check(
        "Global config",
        global.as_ref().is_some_and(|p| p.exists()),
        display_path(global.as_deref()),
    );
    let project = config::project_config_file();
    check(
        "Project config",
        project.as_ref().is_some_and(|p| p.exists()),
        display_path(project.as_deref()),
    );
    let prefs = theme::preferences_path();
    check(
        "Preferences",
        prefs.as_ref().is_some_and(|p| p.exists()),
        display_path(prefs.as_deref()),
    );
    check(
        "Refresh log",
        log.refresh_log_path().is_some_and(|p| p.exists()),
        display_path(log.refresh_log_path()),
    );

    let saved_theme = FileStore::open_default()
        .map(|store| ThemeController::load(store, cfg.dashboard.prefers_dark).get())
        .unwrap_or_default();

    println!();
    println!("  {} {}", "Theme:       ".bold(), saved_theme);
    println!("  {} {}", "Listen addr: ".bold(), cfg.server.addr);
    println!(
        "  {} {}",
        "Upstream:    ".bold(),
        proxy::upstream_url(&cfg.upstream.base_url)
    );
    println!(
        "  {} {}s",
        "Refresh:     ".bold(),
        cfg.dashboard.refresh_interval().as_secs()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// coin-dash config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    Show,
    Init { force: bool },
    Set { key: String, value: String },
    Reset,
}

pub fn run_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => print!("{}", config::show_effective_config()?),
        ConfigAction::Init { force } => {
            let path = config::init_config(force)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
        ConfigAction::Set { key, value } => {
            config::set_config_value(&key, &value)?;
            println!("{} {} = {}", "Set".green(), key, value);
        }
        ConfigAction::Reset => {
            let path = config::reset_config()?;
            println!("{} {}", "Reset".green(), path.display());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn display_path(path: Option<&std::path::Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unavailable)".to_string())
}

fn opt_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
