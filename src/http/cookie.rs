//! `Cookie` request header parsing

use hyper::header::COOKIE;
use hyper::HeaderMap;
use std::collections::HashMap;

/// Collect `name=value` pairs from every `Cookie` header.
/// Later pairs overwrite earlier ones with the same name.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            cookies.insert(name.to_string(), value.to_string());
        }
    }
    cookies
}
