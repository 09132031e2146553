/// Proxy Endpoint tests.
///
/// Exercise `proxy::handle` against scripted upstreams: status mirroring,
/// byte-for-byte pass-through, and the transport-failure envelope. No
/// network access.
use coin_dash::proxy::{self, CACHE_CONTROL, ProxyError, Upstream, UpstreamReply};

struct Scripted(Result<UpstreamReply, ProxyError>);

impl Upstream for Scripted {
    fn get(&self, _url: &str) -> Result<UpstreamReply, ProxyError> {
        self.0.clone()
    }
}

fn upstream(status: u16, body: &str) -> Scripted {
    Scripted(Ok(UpstreamReply {
        status,
        body: body.to_string(),
    }))
}

fn url() -> String {
    proxy::upstream_url(proxy::DEFAULT_UPSTREAM_BASE)
}

#[test]
fn non_success_status_is_mirrored_with_detail() {
    for status in [400, 404, 429, 500, 502, 503] {
        let resp = proxy::handle(&upstream(status, "upstream said no"), &url());
        assert_eq!(resp.status, status);

        let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["error"], "Upstream error");
        assert_eq!(body["detail"], "upstream said no");
    }
}

#[test]
fn rate_limited_upstream_keeps_body_verbatim() {
    let resp = proxy::handle(&upstream(429, "rate limited"), &url());
    assert_eq!(resp.status, 429);
    let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(body["detail"], "rate limited");
    assert_eq!(resp.cache_control, None);
}

#[test]
fn success_body_passes_through_byte_for_byte() {
    // Odd spacing, key order and number formatting must survive untouched.
    let raw = r#"[ {"symbol":"btc", "id":"bitcoin","name":"Bitcoin","current_price":6.70e4,
        "market_cap":1320000000000, "sparkline_in_7d":{"price":[1.10,2.0]}} ]"#;
    let resp = proxy::handle(&upstream(200, raw), &url());

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body.as_bytes(), raw.as_bytes());
    assert_eq!(resp.cache_control, Some(CACHE_CONTROL));
    assert_eq!(CACHE_CONTROL, "s-maxage=60, stale-while-revalidate=120");
}

#[test]
fn any_2xx_counts_as_success() {
    let resp = proxy::handle(&upstream(203, "[]"), &url());
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "[]");
}

#[test]
fn transport_failure_is_500_with_message() {
    let failing = Scripted(Err(ProxyError::Transport(
        "dns error: failed to lookup address".to_string(),
    )));
    let resp = proxy::handle(&failing, &url());

    assert_eq!(resp.status, 500);
    let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(body["error"], "dns error: failed to lookup address");
    assert!(body.get("detail").is_none());
}

#[test]
fn fetch_classifies_outcomes() {
    assert_eq!(
        proxy::fetch(&upstream(429, "slow down"), &url()),
        Err(ProxyError::Upstream {
            status: 429,
            detail: "slow down".to_string()
        })
    );
    assert!(matches!(
        proxy::fetch(&upstream(200, "not json"), &url()),
        Err(ProxyError::Transport(_))
    ));
    assert_eq!(proxy::fetch(&upstream(200, "[]"), &url()).unwrap(), "[]");
}
