//! Server-rendered HTML for the dashboard and about pages.
//!
//! Pages are built from a [`DashboardState`] snapshot with no client-side
//! script: search, refresh and theme toggle are plain forms, and the page
//! re-polls itself with a `meta refresh` at the scheduler interval. The
//! theme is applied as `data-theme` on the root element.

use std::fmt::Write as _;

use crate::dashboard::{CoinRecord, DashboardState, Theme};
use crate::sparkline::{self, SparklineStyle};

use super::query::with_query;

/// Placeholder for absent numbers.
const MISSING: &str = "—";

/// Shared stylesheet, light and dark palettes keyed on `data-theme`.
const STYLES: &str = r#"
:root {
  --bg: #f6f8fa;
  --surface: #ffffff;
  --border: #d0d7de;
  --text: #1f2328;
  --text-muted: #656d76;
  --accent: #0969da;
  --success: #1a7f37;
  --danger: #cf222e;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

[data-theme="dark"] {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --success: #3fb950;
  --danger: #f85149;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.container { max-width: 1100px; margin: 0 auto; padding: 24px; }

.header {
  display: flex;
  flex-wrap: wrap;
  align-items: center;
  justify-content: space-between;
  gap: 12px;
}
.header h1 { font-size: 24px; font-weight: 600; }
.header-actions { display: flex; gap: 8px; align-items: center; }
.header-actions form { display: inline; }

.badge {
  display: inline-flex;
  padding: 2px 10px;
  border-radius: 12px;
  font-size: 12px;
  font-weight: 500;
  vertical-align: middle;
  background: var(--surface);
  border: 1px solid var(--border);
  color: var(--text-muted);
}

.input, .btn {
  font: inherit;
  padding: 6px 12px;
  border-radius: 6px;
  border: 1px solid var(--border);
  background: var(--surface);
  color: var(--text);
}
.btn { cursor: pointer; text-decoration: none; }
.btn:hover { border-color: var(--accent); }

.small { font-size: 12px; color: var(--text-muted); }
.link { color: var(--accent); text-decoration: none; }
.spaced { margin: 8px 0 24px; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  overflow-x: auto;
}
.card.padded { padding: 16px; margin-top: 16px; }
.card ul { margin: 12px 0 12px 20px; }

.table { width: 100%; border-collapse: collapse; }
.table th, .table td {
  padding: 10px 12px;
  text-align: left;
  border-bottom: 1px solid var(--border);
  white-space: nowrap;
}
.table th { font-size: 12px; color: var(--text-muted); text-transform: uppercase; }
.table td.num { font-family: var(--mono); }
.table tr:last-child td { border-bottom: none; }

.up { color: var(--success); }
.down { color: var(--danger); }
.error { color: var(--danger); margin-bottom: 16px; }

footer { margin-top: 16px; }
"#;

/// Options that shape the dashboard page.
#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
    pub theme: Theme,
    pub sparkline: SparklineStyle,
    pub refresh_secs: u64,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Render the dashboard page for `state`, filtered by `query`.
pub fn render_dashboard(state: &DashboardState, query: &str, opts: PageOptions) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<div class="header">
<h1>Crypto Dashboard <span class="badge">demo</span></h1>
<div class="header-actions">
<form method="get" action="/"><input class="input" name="q" placeholder="Search coin…" value="{q}"></form>
<form method="post" action="{refresh}"><button class="btn" title="Refresh now">Refresh</button></form>
<form method="post" action="{theme_action}"><button class="btn" title="Toggle theme">{theme_label} mode</button></form>
</div>
</div>
<p class="small spaced">Top 10 coins by market cap (live from CoinGecko) • Themeable • Auto-refresh every {secs}s • 7d trend sparklines</p>
"#,
        q = escape_html(query),
        refresh = escape_html(&with_query("/refresh", query)),
        theme_action = escape_html(&with_query("/theme", query)),
        theme_label = match opts.theme {
            Theme::Light => "Dark",
            Theme::Dark => "Light",
        },
        secs = opts.refresh_secs,
    );

    if let Some(updated) = state.last_updated {
        let _ = writeln!(
            body,
            r#"<p class="small spaced">Last updated: {} • <a class="link" href="/about">About this demo</a></p>"#,
            updated.format("%H:%M:%S")
        );
    }

    if state.loading {
        body.push_str("<p>Loading…</p>\n");
    }
    if let Some(error) = &state.error {
        let _ = writeln!(body, r#"<p class="error">Error: {}</p>"#, escape_html(error));
    }
    if state.shows_table() {
        body.push_str(&render_table(&state.filtered(query), opts.sparkline));
    }

    body.push_str(r#"<footer class="small">Data from CoinGecko public API.</footer>"#);

    let refresh_target = with_query("/", query);
    let head_extra = format!(
        r#"<meta http-equiv="refresh" content="{};url={}">"#,
        opts.refresh_secs,
        escape_html(&refresh_target)
    );
    page("Crypto Dashboard", opts.theme, &head_extra, &body)
}

/// Coin table with one row per record.
fn render_table(coins: &[&CoinRecord], style: SparklineStyle) -> String {
    let mut html = String::from(
        r#"<div class="card"><table class="table">
<thead><tr><th>#</th><th>Name</th><th>Symbol</th><th>Price (USD)</th><th>24h %</th><th>Market Cap</th><th>7d</th></tr></thead>
<tbody>
"#,
    );

    for (idx, coin) in coins.iter().enumerate() {
        let (change_class, change) = format_change(coin.price_change_percentage_24h);
        let _ = writeln!(
            html,
            r#"<tr id="coin-{id}"><td>{rank}</td><td>{name}</td><td>{symbol}</td><td class="num">{price}</td><td class="num{change_class}">{change}</td><td class="num">{cap}</td><td>{spark}</td></tr>"#,
            id = escape_html(&coin.id),
            rank = idx + 1,
            name = escape_html(&coin.name),
            symbol = escape_html(&coin.symbol.to_uppercase()),
            price = format_usd(coin.current_price),
            cap = format_usd(coin.market_cap),
            spark = sparkline::render_svg(coin.series(), style).unwrap_or_default(),
        );
    }

    html.push_str("</tbody>\n</table></div>\n");
    html
}

// ---------------------------------------------------------------------------
// About
// ---------------------------------------------------------------------------

/// Static about page.
pub fn render_about(theme: Theme) -> String {
    let body = r#"<h1>About this demo</h1>
<p class="small spaced">A small Rust service showing a live market table with a caching proxy in front of a public API.</p>
<div class="card padded">
<h2>What it does</h2>
<ul>
<li>Proxy endpoint <code>/api/prices</code> fetches the top 10 coins from CoinGecko and forwards them with shared-cache headers.</li>
<li>The dashboard refreshes on start, every interval, and on demand.</li>
<li>Health endpoint at <code>/api/health</code>.</li>
<li>Dark mode, search, auto-refresh, and 7-day sparklines.</li>
</ul>
<p class="small"><a class="link" href="/">Back to dashboard</a></p>
</div>
"#;
    page("About this demo", theme, "", body)
}

// ---------------------------------------------------------------------------
// Shared shell and formatting
// ---------------------------------------------------------------------------

fn page(title: &str, theme: Theme, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en" data-theme="{theme}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{head_extra}
<title>{title}</title>
<style>{STYLES}</style>
</head>
<body>
<main class="container">
{body}
</main>
</body>
</html>
"#,
        theme = theme.as_str(),
        title = escape_html(title),
    )
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `$`-prefixed amount with thousands separators and up to three decimals.
pub fn format_usd(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let amount = format_amount(v);
            match amount.strip_prefix('-') {
                Some(digits) => format!("-${digits}"),
                None => format!("${amount}"),
            }
        }
        _ => MISSING.to_string(),
    }
}

/// 24h change as `(css class suffix, text)`.
fn format_change(value: Option<f64>) -> (&'static str, String) {
    match value {
        Some(v) if v.is_finite() => {
            let class = if v >= 0.0 { " up" } else { " down" };
            (class, format!("{v:.2}%"))
        }
        _ => ("", MISSING.to_string()),
    }
}

fn format_amount(v: f64) -> String {
    let rounded = format!("{:.3}", v.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');
    let negative = v < 0.0 && rounded.bytes().any(|b| b.is_ascii_digit() && b != b'0');

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
