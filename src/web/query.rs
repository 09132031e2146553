//! Query-string helpers for the dashboard routes.

/// Value of `key` in the URL's query string, percent-decoded.
///
/// `+` decodes to a space, as in HTML form submissions.
pub fn param(url: &str, key: &str) -> Option<String> {
    url.split_once('?')?.1.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (decode(k) == key).then(|| decode(v))
    })
}

/// Percent-decode a query component. Invalid escapes are kept literally.
pub fn decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Percent-encode a query component.
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// `path` with `?q=<query>` appended when the query is non-blank.
pub fn with_query(path: &str, query: &str) -> String {
    if query.trim().is_empty() {
        path.to_string()
    } else {
        format!("{path}?q={}", encode(query))
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_extracts_and_decodes() {
        assert_eq!(param("/?q=eth", "q").as_deref(), Some("eth"));
        assert_eq!(param("/?x=1&q=bit+coin", "q").as_deref(), Some("bit coin"));
        assert_eq!(param("/?q=%C3%A9th%21", "q").as_deref(), Some("éth!"));
        assert_eq!(param("/?q", "q").as_deref(), Some(""));
    }

    #[test]
    fn param_missing_is_none() {
        assert_eq!(param("/", "q"), None);
        assert_eq!(param("/?other=1", "q"), None);
    }

    #[test]
    fn decode_keeps_invalid_escapes() {
        assert_eq!(decode("100%"), "100%");
        assert_eq!(decode("%zz"), "%zz");
        assert_eq!(decode("%4"), "%4");
    }

    #[test]
    fn encode_then_param_recovers_value() {
        let raw = "usd coin & más";
        let url = with_query("/", raw);
        assert_eq!(param(&url, "q").as_deref(), Some(raw));
    }

    #[test]
    fn with_query_skips_blank() {
        assert_eq!(with_query("/", "  "), "/");
        assert_eq!(with_query("/refresh", "btc"), "/refresh?q=btc");
    }
}
