//! Query string decoding

use std::collections::HashMap;
use url::form_urlencoded;

/// Decode an `application/x-www-form-urlencoded` query string.
/// A repeated key keeps its last value.
pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_pairs() {
        let query = parse_query(Some("q=foo+bar&item-query=a%26b&short=1"));
        assert_eq!(query["q"], "foo bar");
        assert_eq!(query["item-query"], "a&b");
        assert_eq!(query["short"], "1");
    }

    #[test]
    fn test_last_value_wins() {
        let query = parse_query(Some("q=first&q=second"));
        assert_eq!(query["q"], "second");
    }

    #[test]
    fn test_empty_value_and_missing_query() {
        assert_eq!(parse_query(Some("q="))["q"], "");
        assert!(parse_query(None).is_empty());
    }
}
