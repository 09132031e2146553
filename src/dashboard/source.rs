/// The dashboard's port to the Proxy Endpoint.
///
/// Sources interpret the proxy's response the way a browser client would:
/// any non-success status is a fetch failure, a success body must decode
/// as a coin listing.
use std::sync::Arc;

use super::model::{CoinRecord, parse_listing};
use crate::proxy::{self, Upstream};

/// Failure of one dashboard fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The proxy answered with a non-success status.
    Status(u16),
    /// The proxy could not be reached.
    Transport(String),
    /// The proxy's body was not a coin listing.
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(_) => write!(f, "Failed to fetch prices"),
            Self::Transport(message) => write!(f, "{message}"),
            Self::Decode(message) => write!(f, "Invalid price data: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Something the dashboard can pull coin listings from.
pub trait PriceSource: Send + Sync {
    fn fetch_prices(&self) -> Result<Vec<CoinRecord>, FetchError>;
}

/// Interpret a proxy status + body pair.
pub fn decode_response(status: u16, body: &str) -> Result<Vec<CoinRecord>, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status(status));
    }
    parse_listing(body).map_err(|e| FetchError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// In-process proxy
// ---------------------------------------------------------------------------

/// Calls the proxy handler directly, without an HTTP hop.
pub struct ProxySource {
    upstream: Arc<dyn Upstream>,
    url: String,
}

impl ProxySource {
    pub fn new(upstream: Arc<dyn Upstream>, url: impl Into<String>) -> Self {
        Self {
            upstream,
            url: url.into(),
        }
    }
}

impl PriceSource for ProxySource {
    fn fetch_prices(&self) -> Result<Vec<CoinRecord>, FetchError> {
        let resp = proxy::handle(self.upstream.as_ref(), &self.url);
        decode_response(resp.status, &resp.body)
    }
}

// ---------------------------------------------------------------------------
// Remote endpoint
// ---------------------------------------------------------------------------

/// Calls a running server's `/api/prices` over HTTP.
#[derive(Debug)]
pub struct EndpointSource {
    url: String,
}

impl EndpointSource {
    /// `base` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base: &str) -> Self {
        Self {
            url: format!("{}/api/prices", base.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PriceSource for EndpointSource {
    fn fetch_prices(&self) -> Result<Vec<CoinRecord>, FetchError> {
        let response = match ureq::get(&self.url).timeout(proxy::DEFAULT_TIMEOUT).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport(transport.to_string()));
            }
        };

        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        decode_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{ProxyError, UpstreamReply};

    struct Fixed(u16, &'static str);

    impl Upstream for Fixed {
        fn get(&self, _url: &str) -> Result<UpstreamReply, ProxyError> {
            Ok(UpstreamReply {
                status: self.0,
                body: self.1.to_string(),
            })
        }
    }

    #[test]
    fn decode_rejects_non_success_status() {
        assert_eq!(decode_response(429, "[]"), Err(FetchError::Status(429)));
        assert_eq!(
            FetchError::Status(429).to_string(),
            "Failed to fetch prices"
        );
    }

    #[test]
    fn decode_reports_bad_listing() {
        assert!(matches!(
            decode_response(200, r#"{"oops":1}"#),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn proxy_source_passes_listing_through() {
        let source = ProxySource::new(
            Arc::new(Fixed(200, r#"[{"id":"a","name":"A","symbol":"a"}]"#)),
            "u",
        );
        let coins = source.fetch_prices().unwrap();
        assert_eq!(coins[0].id, "a");
    }

    #[test]
    fn proxy_source_maps_upstream_failure_to_status() {
        let source = ProxySource::new(Arc::new(Fixed(429, "rate limited")), "u");
        assert_eq!(source.fetch_prices(), Err(FetchError::Status(429)));
    }

    #[test]
    fn endpoint_source_builds_api_url() {
        let source = EndpointSource::new("http://127.0.0.1:3000/");
        assert_eq!(source.url(), "http://127.0.0.1:3000/api/prices");
    }
}
