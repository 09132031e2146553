//! JSON API handlers.
//!
//! Each handler returns a [`Reply`]; the server loop turns it into a
//! `tiny_http` response.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::proxy;

use super::{AppContext, Reply};

/// Health API response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    upstream_url: String,
    coins: usize,
    loading: bool,
    last_updated: Option<String>,
    last_error: Option<String>,
    theme: String,
}

/// Build a `200` JSON reply.
fn json_reply<T: Serialize>(data: &T) -> Result<Reply> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Reply::json(200, body))
}

/// `/api/prices`: proxy the upstream market listing.
pub fn get_prices(ctx: &AppContext) -> Reply {
    let resp = proxy::handle(ctx.upstream.as_ref(), &ctx.upstream_url);
    let mut reply = Reply::json(resp.status, resp.body);
    if let Some(directive) = resp.cache_control {
        reply = reply.with_header("Cache-Control", directive);
    }
    reply
}

/// `GET /api/state`: current dashboard state.
pub fn get_state(ctx: &AppContext) -> Result<Reply> {
    json_reply(&ctx.dashboard.snapshot())
}

/// `GET /api/health`: service health summary.
pub fn get_health(ctx: &AppContext) -> Result<Reply> {
    let state = ctx.dashboard.snapshot();
    let resp = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        upstream_url: ctx.upstream_url.clone(),
        coins: state.coins.len(),
        loading: state.loading,
        last_updated: state.last_updated.map(|t| t.to_rfc3339()),
        last_error: state.error,
        theme: ctx.current_theme().to_string(),
    };
    json_reply(&resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok",
            version: "0.1.0",
            upstream_url: "http://u".to_string(),
            coins: 10,
            loading: false,
            last_updated: None,
            last_error: Some("Failed to fetch prices".to_string()),
            theme: "dark".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""status":"ok""#));
        assert!(json.contains(r#""coins":10"#));
        assert!(json.contains(r#""last_updated":null"#));
    }
}
