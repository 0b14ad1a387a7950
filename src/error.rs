//! Error types for the meshml core and its CLI harness
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for the CLI
//!
//! The protocol-facing variants (`ProtocolParse`, `Capacity`, `Duplicate`,
//! `NotFound`, `Inference`, `Transport`) never cross a connection boundary —
//! a handler turns them into an `ERRO` reply and closes the exchange. The
//! remaining variants are ambient (configuration, IO, address discovery,
//! model loading) and are the ones that actually reach the CLI's exit code.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Protocol / overlay errors (1xx) — see spec §7
    ProtocolParse = 100,
    Capacity = 101,
    Duplicate = 102,
    NotFound = 103,
    Inference = 104,
    Transport = 105,

    // Configuration errors (2xx)
    ConfigNotFound = 200,
    ConfigParseError = 201,
    ConfigValidation = 202,

    // IO errors (3xx)
    IoRead = 300,
    IoWrite = 301,
    IoNotFound = 302,
    IoPermission = 303,

    // Self-address discovery errors (4xx)
    AddressDiscovery = 400,

    // Model loader errors (5xx)
    LoaderParse = 500,
    LoaderNotFound = 501,

    // Internal errors (9xx)
    Internal = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100").
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 1,  // Protocol errors never reach the CLI; generic failure if they do
            200..=299 => 10, // Config errors
            300..=399 => 20, // IO errors
            400..=499 => 30, // Address discovery errors
            500..=599 => 40, // Loader errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The crate's single error type, spanning both the wire protocol and the
/// ambient configuration/IO/loader concerns of the harness.
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Protocol errors (spec §7)
    // ─────────────────────────────────────────────────────────────
    /// A frame or message payload could not be parsed.
    #[error("protocol parse error: {0}")]
    ProtocolParse(String),

    /// JOIN rejected because the directory is at capacity.
    #[error("capacity error: {0}")]
    Capacity(String),

    /// JOIN from a known peer, or RESP for an already-registered model.
    #[error("duplicate error: {0}")]
    Duplicate(String),

    /// QUIT or INFR referenced an unknown peer or model.
    #[error("not found: {0}")]
    NotFound(String),

    /// The predictor raised while decoding, predicting, or encoding.
    #[error("inference error: {0}")]
    Inference(String),

    /// Any socket I/O failure during a peer exchange.
    #[error("transport error: {0}")]
    Transport(String),

    // ─────────────────────────────────────────────────────────────
    // Configuration errors
    // ─────────────────────────────────────────────────────────────
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file failed to parse.
    #[error("failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration failed validation.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        message: String,
        field: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────
    // IO errors
    // ─────────────────────────────────────────────────────────────
    /// File read error.
    #[error("failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error.
    #[error("failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error (writing a config back out).
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Self-address discovery
    // ─────────────────────────────────────────────────────────────
    /// Self-address discovery failed (spec §6) and no override was given.
    #[error("self-address discovery failed: {0}")]
    AddressDiscovery(String),

    // ─────────────────────────────────────────────────────────────
    // Loader errors
    // ─────────────────────────────────────────────────────────────
    /// The bundled reference loader could not parse a model file.
    #[error("failed to load model from {path}: {message}")]
    LoaderParse { path: PathBuf, message: String },

    /// The bundled reference loader was pointed at a name with no file.
    #[error("model file not found: {0}")]
    LoaderNotFound(PathBuf),

    // ─────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────
    /// Internal error, not expected in normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ProtocolParse(_) => ErrorCode::ProtocolParse,
            Error::Capacity(_) => ErrorCode::Capacity,
            Error::Duplicate(_) => ErrorCode::Duplicate,
            Error::NotFound(_) => ErrorCode::NotFound,
            Error::Inference(_) => ErrorCode::Inference,
            Error::Transport(_) => ErrorCode::Transport,

            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::AddressDiscovery(_) => ErrorCode::AddressDiscovery,

            Error::LoaderParse { .. } => ErrorCode::LoaderParse,
            Error::LoaderNotFound(_) => ErrorCode::LoaderNotFound,

            Error::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Whether retrying the same operation might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Io(_) | Error::AddressDiscovery(_)
        )
    }

    /// Whether the harness should treat this as fatal and exit.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::AddressDiscovery(_)
                | Error::Internal(_)
        )
    }

    /// Get the exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-facing formatting
    // ─────────────────────────────────────────────────────────────

    /// A short, user-friendly hint for how to fix this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Capacity(_) => Some(
                "Raise --max-peers, or wait for the stabilizer to evict an unreachable peer.",
            ),
            Error::NotFound(_) => Some(
                "Confirm the peer id or model name is correct and has actually been registered.",
            ),
            Error::Inference(_) => Some(
                "Check the predictor implementation and the shape of the JSON input payload.",
            ),
            Error::Transport(_) => Some(
                "Check that the remote peer is reachable and its listening port is open.",
            ),

            Error::ConfigNotFound { .. } => {
                Some("Run 'meshml-node config init' to create a default configuration file.")
            }
            Error::ConfigParse { .. } => Some(
                "Check your configuration file's TOML syntax. Run 'meshml-node config validate' for details.",
            ),
            Error::ConfigValidation { .. } => {
                Some("Review the configuration file and fix the invalid values.")
            }

            Error::AddressDiscovery(_) => Some(
                "Supply --host explicitly; self-address discovery requires outbound internet access.",
            ),

            Error::LoaderParse { .. } => {
                Some("Check that the model file is valid JSON with 'weights' and 'bias' fields.")
            }
            Error::LoaderNotFound(_) => Some("Check the configured model path exists."),

            _ => None,
        }
    }

    /// Format for terminal display, with ANSI colors.
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", code.as_str(), self);

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format for logging, no colors.
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Ergonomic constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn protocol_parse(message: impl Into<String>) -> Self {
        Error::ProtocolParse(message.into())
    }

    pub fn capacity(message: impl Into<String>) -> Self {
        Error::Capacity(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Error::Duplicate(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Error::Inference(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport(message.into())
    }

    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn address_discovery(message: impl Into<String>) -> Self {
        Error::AddressDiscovery(message.into())
    }

    pub fn loader_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::LoaderParse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ProtocolParse.as_str(), "E100");
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E200");
        assert_eq!(ErrorCode::Internal.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::AddressDiscovery.exit_code(), 30);
        assert_eq!(ErrorCode::LoaderParse.exit_code(), 40);
        assert_eq!(ErrorCode::Internal.exit_code(), 90);
    }

    #[test]
    fn test_every_variant_has_exit_code_and_suggestion_or_none() {
        // A4: stable exit_code for every kind we construct here.
        let errs: Vec<Error> = vec![
            Error::protocol_parse("bad frame"),
            Error::capacity("Join: too many peers"),
            Error::duplicate("model already registered"),
            Error::not_found("peer B"),
            Error::inference("predict raised"),
            Error::transport("connection refused"),
            Error::config_not_found("/test/config.toml"),
            Error::address_discovery("dial failed"),
        ];
        for e in errs {
            assert!(e.exit_code() > 0);
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::config_not_found("/path/to/config.toml");
        assert!(err.to_string().contains("/path/to/config.toml"));
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::transport("refused").is_retryable());
        assert!(!Error::capacity("full").is_retryable());
        assert!(!Error::config_not_found("/test").is_retryable());
    }

    #[test]
    fn test_error_fatal() {
        assert!(Error::config_not_found("/test").is_fatal());
        assert!(Error::address_discovery("dial failed").is_fatal());
        assert!(!Error::transport("refused").is_fatal());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::config_not_found("/test");
        assert!(err.suggestion().is_some());
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::capacity("full");
        assert!(err.suggestion().unwrap().contains("max-peers"));
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_terminal();

        assert!(formatted.contains("E200"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E200]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
