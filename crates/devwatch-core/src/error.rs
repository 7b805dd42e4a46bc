// ── Core error types ──
//
// User-facing errors from devwatch-core. The `From<devwatch_api::Error>`
// impl translates transport failures into messages a dashboard can show
// as-is: a rejected snapshot reads `HTTP 503`, not a reqwest dump.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Snapshot errors ──────────────────────────────────────────────
    /// The snapshot endpoint answered with a non-success status.
    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response body: {message}")]
    InvalidResponse { message: String },

    // ── Push channel errors ──────────────────────────────────────────
    #[error("Push channel error: {reason}")]
    Channel { reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status, if the endpoint rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<devwatch_api::Error> for CoreError {
    fn from(err: devwatch_api::Error) -> Self {
        match err {
            devwatch_api::Error::Status { status, .. } => CoreError::Http { status },
            devwatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if let Some(status) = e.status() {
                    CoreError::Http {
                        status: status.as_u16(),
                    }
                } else if e.is_decode() {
                    CoreError::InvalidResponse {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            devwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            devwatch_api::Error::Client(message) => CoreError::Config { message },
            devwatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
            devwatch_api::Error::WebSocketConnect(reason) => CoreError::Channel { reason },
            devwatch_api::Error::WebSocketClosed { code, reason } => CoreError::Channel {
                reason: format!("closed (code {code}): {reason}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_bare_http_code() {
        let err = CoreError::from(devwatch_api::Error::Status {
            status: 500,
            body: "Internal Server Error".into(),
        });
        assert_eq!(err.to_string(), "HTTP 500");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn deserialization_maps_to_invalid_response() {
        let err = CoreError::from(devwatch_api::Error::Deserialization {
            message: "expected value at line 1 column 1".into(),
            body: "<html>".into(),
        });
        assert!(matches!(err, CoreError::InvalidResponse { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn websocket_errors_map_to_channel() {
        let err = CoreError::from(devwatch_api::Error::WebSocketConnect("refused".into()));
        assert_eq!(err.to_string(), "Push channel error: refused");
    }
}
