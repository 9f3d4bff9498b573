use thiserror::Error;

/// Outcome classification for every call made through [`crate::ApiClient`].
///
/// Callers never see a raw transport error: everything is folded into one of
/// these variants, either by status-code interpretation or by [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request could not be constructed (bad base URL, path, or header).
    /// A programming error; should not happen with registered endpoints.
    #[error("malformed request: {0}")]
    UrlError(String),

    #[error("no network connection")]
    NoNetwork,

    /// 2xx response whose body did not match the expected shape.
    #[error("response could not be decoded: {0}")]
    DecodingError(String),

    /// Non-2xx status other than 401. `message` is taken from the JSON error
    /// body when the server supplies one.
    #[error("server returned HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    ServerError {
        status: u16,
        message: Option<String>,
    },

    /// HTTP 401. Propagated unchanged so the session layer can refresh or log out.
    #[error("unauthorized")]
    Unauthorized,

    /// The request was superseded or cancelled. Not a user-visible failure.
    #[error("request cancelled")]
    Cancelled,

    #[error("request failed: {0}")]
    Unknown(String),
}

impl ApiError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Status code for HTTP-level failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ServerError { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// Server-supplied message, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::ServerError { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Raw failure below the HTTP status layer, before classification.
#[derive(Debug)]
pub enum TransportFailure {
    Request(reqwest::Error),
    /// The caller's cancellation token fired before the call completed.
    Superseded,
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        TransportFailure::Request(err)
    }
}

/// Single mapping from transport failures to [`ApiError`].
///
/// - connection failures → [`ApiError::NoNetwork`]
/// - superseded / cancelled requests → [`ApiError::Cancelled`]
/// - timeouts and everything else → [`ApiError::Unknown`]
#[must_use]
pub fn classify(raw: TransportFailure) -> ApiError {
    match raw {
        TransportFailure::Superseded => ApiError::Cancelled,
        TransportFailure::Request(err) if err.is_connect() => ApiError::NoNetwork,
        TransportFailure::Request(err) if err.is_builder() => ApiError::UrlError(err.to_string()),
        TransportFailure::Request(err) if err.is_timeout() => {
            ApiError::Unknown(format!("request timed out: {err}"))
        }
        TransportFailure::Request(err) => ApiError::Unknown(err.to_string()),
    }
}

/// Failure of a persistent cache store. Logged, never shown to the user.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_classifies_as_cancelled() {
        let err = classify(TransportFailure::Superseded);
        assert_eq!(err, ApiError::Cancelled);
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn refused_connection_classifies_as_no_network() {
        let raw = reqwest::Client::new()
            .get("http://127.0.0.1:1")
            .send()
            .await
            .unwrap_err();
        assert_eq!(classify(raw.into()), ApiError::NoNetwork);
    }

    #[test]
    fn server_error_display_includes_message() {
        let err = ApiError::ServerError {
            status: 422,
            message: Some("slot no longer available".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "server returned HTTP 422: slot no longer available"
        );
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.server_message(), Some("slot no longer available"));
    }

    #[test]
    fn server_error_display_without_message() {
        let err = ApiError::ServerError {
            status: 503,
            message: None,
        };
        assert_eq!(err.to_string(), "server returned HTTP 503");
    }

    #[test]
    fn unauthorized_reports_401() {
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert!(ApiError::Unauthorized.is_unauthorized());
    }
}
