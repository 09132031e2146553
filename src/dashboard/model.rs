/// Coin records as returned by the markets listing.
///
/// Only `id`, `name` and `symbol` are required. Numeric fields the
/// upstream may omit or send as `null` are optional and render as a
/// placeholder instead of failing the whole refresh.
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the markets listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub sparkline_in_7d: Option<SparklineSeries>,
}

/// Embedded 7-day price series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparklineSeries {
    /// `null` samples are skipped and a `null` series reads as empty.
    #[serde(default, deserialize_with = "nullable_samples")]
    pub price: Vec<f64>,
}

fn nullable_samples<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default().into_iter().flatten().collect())
}

impl CoinRecord {
    /// 7-day series, empty when the upstream sent none.
    pub fn series(&self) -> &[f64] {
        self.sparkline_in_7d
            .as_ref()
            .map(|s| s.price.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the name or symbol contains `needle` (already lower-cased).
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.symbol.to_lowercase().contains(needle)
    }
}

/// Parse a markets listing body.
pub fn parse_listing(body: &str) -> serde_json::Result<Vec<CoinRecord>> {
    serde_json::from_str(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_upstream_row() {
        let body = r#"[{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://example.invalid/btc.png",
            "current_price": 67123.5,
            "market_cap": 1320000000000,
            "price_change_percentage_24h": -1.234,
            "sparkline_in_7d": { "price": [1.0, 2.0, 3.0] }
        }]"#;
        let coins = parse_listing(body).unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].id, "bitcoin");
        assert_eq!(coins[0].current_price, Some(67123.5));
        assert_eq!(coins[0].market_cap, Some(1.32e12));
        assert_eq!(coins[0].series(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_and_null_numbers_are_none() {
        let body = r#"[{
            "id": "x", "symbol": "x", "name": "X",
            "current_price": null
        }]"#;
        let coins = parse_listing(body).unwrap();
        assert_eq!(coins[0].current_price, None);
        assert_eq!(coins[0].price_change_percentage_24h, None);
        assert_eq!(coins[0].market_cap, None);
        assert!(coins[0].series().is_empty());
    }

    #[test]
    fn non_array_body_is_rejected() {
        assert!(parse_listing(r#"{"error":"nope"}"#).is_err());
    }

    #[test]
    fn null_samples_are_skipped() {
        let body = r#"[{"id":"bitcoin","name":"Bitcoin","symbol":"btc",
            "sparkline_in_7d":{"price":[1.0,null,2.0]}}]"#;
        let coins = parse_listing(body).unwrap();
        assert_eq!(coins[0].series(), &[1.0, 2.0]);
    }

    #[test]
    fn null_series_reads_as_empty() {
        let body = r#"[{"id":"bitcoin","name":"Bitcoin","symbol":"btc",
            "sparkline_in_7d":{"price":null}},
            {"id":"ethereum","name":"Ethereum","symbol":"eth","sparkline_in_7d":null}]"#;
        let coins = parse_listing(body).unwrap();
        assert_eq!(coins.len(), 2);
        assert!(coins[0].series().is_empty());
        assert!(coins[1].series().is_empty());
    }
}
