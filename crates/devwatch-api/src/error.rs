use thiserror::Error;

/// Top-level error type for the `devwatch-api` crate.
///
/// Covers every failure mode of the two transport surfaces: the HTTP
/// snapshot endpoint and the push channel. `devwatch-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client could not be built (TLS backend, invalid headers).
    #[error("HTTP client error: {0}")]
    Client(String),

    // ── Snapshot endpoint ───────────────────────────────────────────
    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}")]
    Status { status: u16, body: String },

    // ── Push channel ────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => true,
            _ => false,
        }
    }

    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_code_only() {
        let err = Error::Status {
            status: 503,
            body: "upstream down".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Status {
            status: 502,
            body: String::new(),
        };
        assert!(err.is_transient());

        let err = Error::Status {
            status: 400,
            body: String::new(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn websocket_failures_are_transient() {
        assert!(Error::WebSocketConnect("refused".into()).is_transient());
        assert!(
            !Error::Deserialization {
                message: "eof".into(),
                body: String::new()
            }
            .is_transient()
        );
    }
}
