//! Diagnostic rendering for request/response logging.

use reqwest::header::{HeaderMap, AUTHORIZATION};

const MAX_LOGGED_BODY: usize = 4_096;

/// Header list with credentials masked.
pub(crate) fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if name == AUTHORIZATION {
                "Bearer [redacted]".to_string()
            } else {
                value.to_str().unwrap_or("[binary]").to_string()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}

/// Body text capped at a few KiB, cut on a char boundary.
pub(crate) fn truncated(body: &str) -> &str {
    if body.len() <= MAX_LOGGED_BODY {
        return body;
    }
    let mut end = MAX_LOGGED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, ACCEPT};

    use super::*;

    #[test]
    fn authorization_is_masked() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let rendered = redacted_headers(&headers);
        assert!(rendered.contains(&(
            "authorization".to_string(),
            "Bearer [redacted]".to_string()
        )));
        assert!(rendered.contains(&("accept".to_string(), "application/json".to_string())));
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let body = "é".repeat(MAX_LOGGED_BODY);
        let cut = truncated(&body);
        assert!(cut.len() <= MAX_LOGGED_BODY);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn short_bodies_pass_through() {
        assert_eq!(truncated("{}"), "{}");
    }
}
