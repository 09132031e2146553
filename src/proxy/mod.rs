//! Proxy Endpoint: relays one fixed market-data request to CoinGecko.
//!
//! The proxy accepts any inbound request (no body, no query parameters),
//! performs a single outbound GET to the markets listing and maps the
//! result to a caller-facing response:
//!
//! - upstream success → `200` with the upstream JSON forwarded byte-for-byte
//!   and a shared-cache hint ([`CACHE_CONTROL`])
//! - upstream non-success → the same status with `{error, detail}`
//! - transport or parse failure → `500` with `{error}`
//!
//! There are no retries. Each outbound call is bounded by the client's
//! timeout ([`DEFAULT_TIMEOUT`] unless configured).

pub mod error;

use std::time::Duration;

use serde::de::IgnoredAny;

pub use error::ProxyError;

/// Default upstream API base.
pub const DEFAULT_UPSTREAM_BASE: &str = "https://api.coingecko.com/api/v3";

/// Fixed query: top 10 by market cap in USD, with 24h/7d change and sparklines.
const MARKETS_QUERY: &str = "/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=10&page=1&sparkline=true&price_change_percentage=24h,7d";

/// Upper bound on one upstream call, connect through body read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Caching directive attached to successful responses.
pub const CACHE_CONTROL: &str = "s-maxage=60, stale-while-revalidate=120";

/// Build the full upstream markets URL from an API base.
pub fn upstream_url(base: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), MARKETS_QUERY)
}

// ---------------------------------------------------------------------------
// Upstream port
// ---------------------------------------------------------------------------

/// Raw upstream answer: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One outbound GET. Non-success statuses are replies, not errors.
pub trait Upstream: Send + Sync {
    fn get(&self, url: &str) -> Result<UpstreamReply, ProxyError>;
}

/// `ureq`-backed upstream client.
#[derive(Debug)]
pub struct HttpUpstream {
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpUpstream {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Client whose calls fail as a transport error once `timeout` passes.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl Upstream for HttpUpstream {
    fn get(&self, url: &str) -> Result<UpstreamReply, ProxyError> {
        let result = self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .call();

        let response = match result {
            Ok(resp) => resp,
            // ureq reports 4xx/5xx as errors; the proxy forwards them.
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(transport)) => {
                return Err(ProxyError::Transport(transport.to_string()));
            }
        };

        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| ProxyError::Transport(format!("failed to read upstream body: {e}")))?;

        Ok(UpstreamReply { status, body })
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Caller-facing proxy response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: String,
    pub cache_control: Option<&'static str>,
}

impl ProxyResponse {
    fn from_error(err: &ProxyError) -> Self {
        Self {
            status: err.status(),
            body: err.envelope().to_string(),
            cache_control: None,
        }
    }
}

/// Fetch the upstream and classify the outcome.
///
/// On success returns the upstream body unchanged after checking it parses
/// as JSON.
pub fn fetch(upstream: &dyn Upstream, url: &str) -> Result<String, ProxyError> {
    let reply = upstream.get(url)?;

    if !reply.is_success() {
        return Err(ProxyError::Upstream {
            status: reply.status,
            detail: reply.body,
        });
    }

    serde_json::from_str::<IgnoredAny>(&reply.body)
        .map_err(|e| ProxyError::Transport(format!("invalid upstream JSON: {e}")))?;

    Ok(reply.body)
}

/// Run one proxy call and map it to the response the endpoint returns.
pub fn handle(upstream: &dyn Upstream, url: &str) -> ProxyResponse {
    match fetch(upstream, url) {
        Ok(body) => ProxyResponse {
            status: 200,
            body,
            cache_control: Some(CACHE_CONTROL),
        },
        Err(err) => ProxyResponse::from_error(&err),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<UpstreamReply, ProxyError>);

    impl Upstream for Canned {
        fn get(&self, _url: &str) -> Result<UpstreamReply, ProxyError> {
            self.0.clone()
        }
    }

    fn reply(status: u16, body: &str) -> Canned {
        Canned(Ok(UpstreamReply {
            status,
            body: body.to_string(),
        }))
    }

    #[test]
    fn upstream_url_uses_fixed_query() {
        let url = upstream_url(DEFAULT_UPSTREAM_BASE);
        assert!(url.starts_with("https://api.coingecko.com/api/v3/coins/markets?"));
        assert!(url.contains("vs_currency=usd"));
        assert!(url.contains("order=market_cap_desc"));
        assert!(url.contains("per_page=10"));
        assert!(url.contains("sparkline=true"));
        assert!(url.contains("price_change_percentage=24h,7d"));
    }

    #[test]
    fn http_upstream_gives_up_on_silent_server() {
        // Accepts the connection at the TCP level but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/coins", listener.local_addr().unwrap());

        let client = HttpUpstream::with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let result = client.get(&url);

        assert!(matches!(result, Err(ProxyError::Transport(_))), "{result:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }

    #[test]
    fn default_client_is_bounded() {
        assert_eq!(HttpUpstream::new().timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn upstream_url_strips_trailing_slash() {
        assert_eq!(
            upstream_url("http://127.0.0.1:9000/"),
            upstream_url("http://127.0.0.1:9000")
        );
    }

    #[test]
    fn success_sets_cache_control() {
        let resp = handle(&reply(200, "[]"), "u");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "[]");
        assert_eq!(resp.cache_control, Some(CACHE_CONTROL));
    }

    #[test]
    fn errors_carry_no_cache_control() {
        let resp = handle(&reply(503, "down"), "u");
        assert_eq!(resp.status, 503);
        assert_eq!(resp.cache_control, None);
    }

    #[test]
    fn malformed_success_body_is_500() {
        let resp = handle(&reply(200, "<html>"), "u");
        assert_eq!(resp.status, 500);
        let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("invalid upstream JSON"));
    }
}
