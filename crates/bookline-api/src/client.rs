//! Typed HTTP client for the bookline REST backend.
//!
//! Wraps `reqwest` with endpoint resolution, default-header merging, request
//! and response logging, and a total classification of outcomes into
//! [`ApiError`]. No call is retried here; retry is a caller decision.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{classify, ApiError, TransportFailure};
use crate::log;
use crate::request::ApiRequest;

/// Client for the bookline backend.
///
/// Cheap to clone: the connection pool and configuration are shared.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Arc<ClientConfig>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ApiError::Unknown`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Unknown(format!("http client construction: {e}")))?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Same connection pool, new credentials. The receiver is left untouched.
    #[must_use]
    pub fn with_credentials(&self, bearer_token: Option<String>) -> Self {
        let config = (*self.config).clone().with_bearer_token(bearer_token);
        Self {
            http: self.http.clone(),
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Executes `request` and decodes a 2xx body into `T`.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `T = ()` or `Option<_>`
    /// accept `204 No Content`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::DecodingError`]: 2xx with a body that does not match `T`.
    /// - [`ApiError::Unauthorized`]: HTTP 401, whatever the body.
    /// - [`ApiError::ServerError`]: any other non-2xx, status preserved.
    /// - [`ApiError::NoNetwork`] / [`ApiError::Unknown`]: transport failures.
    /// - [`ApiError::UrlError`]: the request could not be constructed.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.dispatch(request, None).await
    }

    /// Like [`ApiClient::call`], but resolves to [`ApiError::Cancelled`] as
    /// soon as `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`]; additionally [`ApiError::Cancelled`].
    pub async fn call_cancellable<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        self.dispatch(request, Some(cancel)).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<T, ApiError> {
        let url = self.build_url(&request)?;
        let headers = self.merged_headers(&request.extra_headers)?;
        let method = request.endpoint.method();
        let timeout = request
            .timeout
            .unwrap_or_else(|| self.config.timeout_for(request.endpoint.timeout_class()));

        tracing::debug!(
            endpoint = request.endpoint.name(),
            method = %method,
            url = %url,
            headers = ?log::redacted_headers(&headers),
            body = ?request.body,
            "api request"
        );

        let started = Instant::now();
        let send = self.execute(method.clone(), url.clone(), headers, request.body.as_ref(), timeout);
        let outcome = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(TransportFailure::Superseded),
                    result = send => result,
                }
            }
            None => send.await,
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status, body) = match outcome {
            Ok(pair) => pair,
            Err(raw) => {
                let err = classify(raw);
                tracing::debug!(
                    endpoint = request.endpoint.name(),
                    method = %method,
                    url = %url,
                    elapsed_ms,
                    error = %err,
                    "api transport failure"
                );
                return Err(err);
            }
        };

        tracing::debug!(
            endpoint = request.endpoint.name(),
            method = %method,
            url = %url,
            status,
            elapsed_ms,
            body = log::truncated(&body),
            "api response"
        );

        interpret(status, &body)
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<&serde_json::Value>,
        timeout: Duration,
    ) -> Result<(u16, String), TransportFailure> {
        let mut builder = self
            .http
            .request(method, url)
            .headers(headers)
            .timeout(timeout);
        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }

    /// Resolves the endpoint against the base URL and appends query items.
    fn build_url(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let path = request.endpoint.path();
        let mut url = self
            .config
            .base_url()
            .join(&path)
            .map_err(|e| ApiError::UrlError(format!("cannot join '{path}': {e}")))?;
        let pairs = request.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// Defaults first, then caller headers, which replace defaults by name.
    fn merged_headers(&self, extra: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = self.config.bearer_token() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::UrlError("bearer token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::UrlError(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::UrlError(format!("invalid value for header '{name}': {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Maps a completed HTTP exchange to a decoded value or a classified error.
fn interpret<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    match status {
        200..=299 => {
            let text = if body.trim().is_empty() { "null" } else { body };
            serde_json::from_str(text).map_err(|e| ApiError::DecodingError(e.to_string()))
        }
        401 => Err(ApiError::Unauthorized),
        _ => Err(ApiError::ServerError {
            status,
            message: server_message(body),
        }),
    }
}

/// Pulls a human-readable message out of a JSON error body.
///
/// Accepts `{"message": ".."}`, `{"error": ".."}` and `{"error": {"message": ".."}}`.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let direct = value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(serde_json::Value::as_str);
    let nested = || {
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(serde_json::Value::as_str)
    };
    direct
        .or_else(nested)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::endpoint::Endpoint;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        id: String,
    }

    fn test_client(base_url: &str) -> ApiClient {
        ApiClient::new(ClientConfig::new(base_url).expect("valid base url"))
            .expect("client construction should not fail")
    }

    #[test]
    fn interpret_decodes_matching_2xx_body() {
        let thing: Thing = interpret(200, r#"{"id":"t1"}"#).unwrap();
        assert_eq!(thing, Thing { id: "t1".into() });
    }

    #[test]
    fn interpret_rejects_mismatched_2xx_body() {
        let err = interpret::<Thing>(200, r#"{"name":"nope"}"#).unwrap_err();
        assert!(matches!(err, ApiError::DecodingError(_)));
    }

    #[test]
    fn interpret_treats_empty_body_as_null() {
        interpret::<()>(204, "").unwrap();
        assert_eq!(interpret::<Option<Thing>>(200, "  ").unwrap(), None);
    }

    #[test]
    fn interpret_maps_401_regardless_of_body() {
        for body in ["", "{}", r#"{"id":"t1"}"#, "<html>"] {
            assert_eq!(
                interpret::<Thing>(401, body).unwrap_err(),
                ApiError::Unauthorized
            );
        }
    }

    #[test]
    fn interpret_preserves_non_2xx_status() {
        for status in [300, 400, 403, 404, 409, 422, 429, 500, 502, 503] {
            let err = interpret::<Thing>(status, "").unwrap_err();
            assert_eq!(err.status(), Some(status));
            assert!(matches!(err, ApiError::ServerError { .. }));
        }
    }

    #[test]
    fn server_message_shapes() {
        assert_eq!(
            server_message(r#"{"message":"slot taken"}"#).as_deref(),
            Some("slot taken")
        );
        assert_eq!(
            server_message(r#"{"error":"bad date"}"#).as_deref(),
            Some("bad date")
        );
        assert_eq!(
            server_message(r#"{"error":{"message":"card declined"}}"#).as_deref(),
            Some("card declined")
        );
        assert_eq!(server_message("not json"), None);
        assert_eq!(server_message(r#"{"message":"  "}"#), None);
    }

    #[test]
    fn build_url_joins_base_path() {
        let client = test_client("https://api.example.test/v1");
        let url = client
            .build_url(&ApiRequest::new(Endpoint::Booking { id: "b1".into() }))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.test/v1/bookings/b1");
    }

    #[test]
    fn build_url_omits_empty_query() {
        let client = test_client("https://api.example.test");
        let url = client.build_url(&ApiRequest::new(Endpoint::Offers)).unwrap();
        assert_eq!(url.as_str(), "https://api.example.test/offers");
    }

    #[test]
    fn build_url_expands_list_query_values() {
        let client = test_client("https://api.example.test");
        let request = ApiRequest::new(Endpoint::Providers)
            .query("category", vec!["hair".to_string(), "nails".to_string()])
            .query("q", "a&b");
        let url = client.build_url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.test/providers?category=hair&category=nails&q=a%26b"
        );
    }

    #[test]
    fn merged_headers_include_defaults_and_token() {
        let client = test_client("https://api.example.test").with_credentials(Some("tok".into()));
        let headers = client.merged_headers(&[]).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
    }

    #[test]
    fn caller_headers_win_on_conflict() {
        let client = test_client("https://api.example.test").with_credentials(Some("tok".into()));
        let extra = vec![
            ("Accept".to_string(), "text/plain".to_string()),
            ("Idempotency-Key".to_string(), "k1".to_string()),
        ];
        let headers = client.merged_headers(&extra).unwrap();
        assert_eq!(headers[ACCEPT], "text/plain");
        assert_eq!(headers["idempotency-key"], "k1");
        assert_eq!(headers.get_all(ACCEPT).iter().count(), 1);
    }

    #[test]
    fn invalid_header_name_is_url_error() {
        let client = test_client("https://api.example.test");
        let extra = vec![("bad header".to_string(), "v".to_string())];
        assert!(matches!(
            client.merged_headers(&extra),
            Err(ApiError::UrlError(_))
        ));
    }

    #[test]
    fn with_credentials_does_not_touch_original() {
        let client = test_client("https://api.example.test");
        let authed = client.with_credentials(Some("tok".into()));
        assert!(client.config().bearer_token().is_none());
        assert_eq!(authed.config().bearer_token(), Some("tok"));
        let headers = client.merged_headers(&[]).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }
}
