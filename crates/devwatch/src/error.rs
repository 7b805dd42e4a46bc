//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use devwatch_config::ConfigError;
use devwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const UNHEALTHY: i32 = 3;
    pub const HTTP: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}")]
    #[diagnostic(
        code(devwatch::connection_failed),
        help(
            "Check that the device server is running and reachable.\n\
             Point at another server with --endpoint or `devwatch config init`."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(devwatch::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Server responses ─────────────────────────────────────────────
    #[error("Endpoint answered HTTP {status}")]
    #[diagnostic(
        code(devwatch::http_status),
        help("Check the endpoint path. Run: devwatch config show")
    )]
    HttpStatus { status: u16 },

    #[error("Invalid response body: {message}")]
    #[diagnostic(code(devwatch::invalid_response))]
    InvalidResponse { message: String },

    #[error("Server reported status '{status}'")]
    #[diagnostic(code(devwatch::unhealthy))]
    Unhealthy { status: String },

    #[error("Push channel error: {reason}")]
    #[diagnostic(
        code(devwatch::channel),
        help("Check --push-url and --event against the server's push route.")
    )]
    Channel { reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(devwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(devwatch::config),
        help("Inspect the effective settings with: devwatch config show")
    )]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {0}")]
    #[diagnostic(code(devwatch::prompt))]
    Prompt(String),

    // ── IO / Internal ────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(devwatch::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Channel { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::HttpStatus { .. } | Self::InvalidResponse { .. } => exit_code::HTTP,
            Self::Unhealthy { .. } => exit_code::UNHEALTHY,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Http { status } => CliError::HttpStatus { status },
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout => CliError::Timeout,
            CoreError::InvalidResponse { message } => CliError::InvalidResponse { message },
            CoreError::Channel { reason } => CliError::Channel { reason },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(msg) => CliError::Internal(msg),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Transport(e) => CoreError::from(e).into(),
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
