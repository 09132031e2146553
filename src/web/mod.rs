//! HTTP server for the proxy endpoint and the dashboard.
//!
//! Provides a lightweight synchronous server (via `tiny_http`) that serves:
//! - `/api/prices`, the proxy in front of the market-data API
//! - the server-rendered dashboard and about pages
//! - JSON health and state endpoints
//!
//! Launched via `coin-dash serve` (default: `http://127.0.0.1:3000`).

pub mod api;
pub mod frontend;
pub mod query;

use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analytics::logger::EventLog;
use crate::config::DashConfig;
use crate::dashboard::source::ProxySource;
use crate::dashboard::theme::{FileStore, KeyValueStore};
use crate::dashboard::{DashboardHandle, RefreshScheduler, Theme, ThemeController};
use crate::proxy::{self, HttpUpstream, Upstream};
use crate::sparkline::SparklineStyle;

use frontend::PageOptions;

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// Everything a request handler needs.
pub struct AppContext {
    pub upstream: Arc<dyn Upstream>,
    pub upstream_url: String,
    pub dashboard: DashboardHandle,
    pub theme: Mutex<ThemeController<Box<dyn KeyValueStore>>>,
    pub sparkline: SparklineStyle,
    pub refresh_secs: u64,
    pub log: EventLog,
}

impl AppContext {
    fn theme_controller(&self) -> MutexGuard<'_, ThemeController<Box<dyn KeyValueStore>>> {
        self.theme.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_theme(&self) -> Theme {
        self.theme_controller().get()
    }

    pub fn toggle_theme(&self) -> Result<Theme> {
        self.theme_controller().toggle()
    }

    fn page_options(&self) -> PageOptions {
        PageOptions {
            theme: self.current_theme(),
            sparkline: self.sparkline,
            refresh_secs: self.refresh_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Transport-independent response produced by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl Reply {
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            headers: Vec::new(),
            body,
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            headers: Vec::new(),
            body,
        }
    }

    /// `303 See Other` back to `location`.
    pub fn redirect(location: String) -> Self {
        Self {
            status: 303,
            content_type: "text/plain; charset=utf-8",
            headers: vec![("Location", location)],
            body: String::new(),
        }
    }

    pub fn not_found() -> Self {
        Self::json(404, r#"{"error": "not found"}"#.to_string())
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Value of the first header called `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn into_response(self) -> Result<Response<Cursor<Vec<u8>>>> {
        let mut resp = Response::from_data(self.body.into_bytes())
            .with_header(header("Content-Type", self.content_type)?)
            .with_status_code(StatusCode(self.status));
        for (name, value) in &self.headers {
            resp = resp.with_header(header(name, value)?);
        }
        Ok(resp)
    }
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow::anyhow!("invalid header {name}: {value}"))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch a request to its handler.
pub fn dispatch(ctx: &AppContext, method: &Method, url: &str) -> Result<Reply> {
    let path = url.split('?').next().unwrap_or(url);
    let search = query::param(url, "q").unwrap_or_default();

    match (method, path) {
        // Proxy: any method, no body or query parsing.
        (_, "/api/prices") => Ok(api::get_prices(ctx)),

        // Pages
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            let state = ctx.dashboard.snapshot();
            Ok(Reply::html(frontend::render_dashboard(
                &state,
                &search,
                ctx.page_options(),
            )))
        }
        (&Method::Get, "/about") => Ok(Reply::html(frontend::render_about(ctx.current_theme()))),

        // Actions
        (&Method::Post, "/refresh") => {
            if !ctx.dashboard.request_refresh() {
                ctx.log.server_event("manual refresh ignored: scheduler stopped");
            }
            Ok(Reply::redirect(query::with_query("/", &search)))
        }
        (&Method::Post, "/theme") => {
            let theme = ctx.toggle_theme()?;
            ctx.log.server_event(&format!("theme set to {theme}"));
            Ok(Reply::redirect(query::with_query("/", &search)))
        }

        // JSON
        (&Method::Get, "/api/state") => api::get_state(ctx),
        (&Method::Get, "/api/health") => api::get_health(ctx),

        _ => Ok(Reply::not_found()),
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Build the context from `config` and serve on `addr` until the process exits.
pub fn run(config: &DashConfig, addr: &str, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let log = EventLog::from_config(config.logging.enabled);
    let upstream: Arc<dyn Upstream> =
        Arc::new(HttpUpstream::with_timeout(config.upstream.timeout()));
    let upstream_url = proxy::upstream_url(&config.upstream.base_url);

    let source = Arc::new(ProxySource::new(Arc::clone(&upstream), upstream_url.clone()));
    let scheduler =
        RefreshScheduler::start(source, config.dashboard.refresh_interval(), log.clone());

    let store: Box<dyn KeyValueStore> =
        Box::new(FileStore::open_default().context("failed to open preferences store")?);
    let theme = ThemeController::load(store, config.dashboard.prefers_dark);

    let ctx = AppContext {
        upstream,
        upstream_url,
        dashboard: scheduler.handle(),
        theme: Mutex::new(theme),
        sparkline: config.sparkline.style(),
        refresh_secs: config.dashboard.refresh_interval().as_secs(),
        log,
    };

    println!("coin-dash running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");
    ctx.log.server_event(&format!("listening on {addr}"));

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    serve(&server, &ctx, config.logging.access_log);

    scheduler.shutdown();
    Ok(())
}

/// Handle requests sequentially. Per-request errors become a 500 reply
/// and never stop the loop.
fn serve(server: &Server, ctx: &AppContext, access_log: bool) {
    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let reply = dispatch(ctx, &method, &url).unwrap_or_else(|e| {
            ctx.log.server_event(&format!("{method} {url} failed: {e:#}"));
            Reply::json(500, serde_json::json!({ "error": e.to_string() }).to_string())
        });
        let status = reply.status;

        match reply.into_response() {
            Ok(resp) => {
                let _ = request.respond(resp);
            }
            Err(e) => {
                ctx.log.server_event(&format!("{method} {url} bad response: {e}"));
                let _ = request.respond(Response::empty(StatusCode(500)));
            }
        }

        if access_log {
            println!(
                "{} {} {} {}",
                method,
                url,
                status,
                chrono::Local::now().format("%H:%M:%S")
            );
        }
    }
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
