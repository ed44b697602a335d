// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for browsing, binding and dispatch.
//!
//! The hierarchy is organised by the component that raises the error:
//!
//! ```text
//! UaViewError
//! ├── Browse    - Tree discovery failures (caught at the engine boundary)
//! ├── Bind      - Monitored-item binding rejections
//! ├── Dispatch  - Thread-affinity bridge and stale delivery
//! ├── Session   - Failures reported by the external session collaborator
//! └── Config    - Configuration loading and validation
//! ```
//!
//! Browse errors never reach the presentation layer as faults: the
//! [`BrowseEngine`](crate::browse::BrowseEngine) converts them into a status
//! notification and a `-1` return code. They are still typed here so that
//! `browse_checked` callers and tests can match on them.
//!
//! # Examples
//!
//! ```
//! use uaview_core::error::{BindError, UaViewError, ErrorSeverity};
//!
//! let error = UaViewError::from(BindError::invalid_target("ns=2;i=7", "not a variable"));
//! assert_eq!(error.category(), "bind");
//! assert_eq!(error.severity(), ErrorSeverity::Warning);
//! assert!(!error.is_retryable());
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

use crate::types::StatusCode;

// =============================================================================
// UaViewError - Main Error Type
// =============================================================================

/// The main error type of the crate.
#[derive(Debug, Error)]
pub enum UaViewError {
    /// Tree discovery errors.
    #[error("{0}")]
    Browse(#[from] BrowseError),

    /// Monitored-item binding errors.
    #[error("{0}")]
    Bind(#[from] BindError),

    /// Dispatch bridge errors.
    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    /// Errors surfaced by the session collaborator.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Configuration errors.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl UaViewError {
    /// Returns `true` if the failed operation may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Browse(e) => e.is_retryable(),
            Self::Bind(e) => e.is_retryable(),
            Self::Dispatch(_) => false,
            Self::Session(e) => e.is_retryable(),
            Self::Config(_) => false,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Browse(e) => e.severity(),
            Self::Bind(e) => e.severity(),
            Self::Dispatch(e) => e.severity(),
            Self::Session(e) => e.severity(),
            Self::Config(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Browse(_) => "browse",
            Self::Bind(_) => "bind",
            Self::Dispatch(_) => "dispatch",
            Self::Session(_) => "session",
            Self::Config(_) => "config",
        }
    }

    /// Returns the structured error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Browse(e) => e.error_code(),
            Self::Bind(e) => e.error_code(),
            Self::Dispatch(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }

    /// Returns recovery hints for this error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Browse(e) => e.recovery_hints(),
            Self::Bind(e) => e.recovery_hints(),
            Self::Dispatch(e) => e.recovery_hints(),
            Self::Session(e) => e.recovery_hints(),
            Self::Config(e) => e.recovery_hints(),
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    ///
    /// The first recovery hint, if any, is attached as the `hint` field.
    pub fn log(&self, context: &str) {
        let code = self.error_code();
        let hint = self.recovery_hints().first().copied().unwrap_or_default();

        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                hint = hint,
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                hint = hint,
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                hint = hint,
                "{self}"
            ),
        }
    }
}

// =============================================================================
// BrowseError
// =============================================================================

/// Errors raised while discovering the children of a tree entry.
#[derive(Debug, Clone, Error)]
pub enum BrowseError {
    /// The entry to browse has no usable node identifier.
    #[error("Cannot resolve node to browse: {reason}")]
    UnresolvedReference {
        /// Why resolution failed.
        reason: String,
    },

    /// The session failed during the first browse or a continuation.
    #[error("Browse failed for node '{node_id}': {source}")]
    TransportFailure {
        /// Node being browsed.
        node_id: String,
        /// Underlying session error.
        #[source]
        source: SessionError,
    },

    /// The continuation drain was cancelled between pages.
    #[error("Browse of node '{node_id}' cancelled after {pages} page(s)")]
    Cancelled {
        /// Node being browsed.
        node_id: String,
        /// Pages received before cancellation.
        pages: usize,
    },
}

impl BrowseError {
    /// Creates an unresolved reference error.
    pub fn unresolved(reason: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reason: reason.into(),
        }
    }

    /// Creates a transport failure error.
    pub fn transport(node_id: impl Into<String>, source: SessionError) -> Self {
        Self::TransportFailure {
            node_id: node_id.into(),
            source,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(node_id: impl Into<String>, pages: usize) -> Self {
        Self::Cancelled {
            node_id: node_id.into(),
            pages,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportFailure { source, .. } => source.is_retryable(),
            Self::Cancelled { .. } => true,
            Self::UnresolvedReference { .. } => false,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnresolvedReference { .. } => ErrorSeverity::Warning,
            Self::TransportFailure { .. } => ErrorSeverity::Error,
            Self::Cancelled { .. } => ErrorSeverity::Info,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnresolvedReference { .. } => ErrorCode::new(1, 1),
            Self::TransportFailure { .. } => ErrorCode::new(1, 2),
            Self::Cancelled { .. } => ErrorCode::new(1, 3),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::UnresolvedReference { .. } => vec![
                "Refresh the namespace table of the session",
                "Browse the parent again to obtain fresh references",
            ],
            Self::TransportFailure { .. } => vec![
                "Check the session connection",
                "Expand the node again to retry",
            ],
            Self::Cancelled { .. } => vec!["Expand the node again to restart the browse"],
        }
    }
}

// =============================================================================
// BindError
// =============================================================================

/// Errors raised while binding a node to a consumer slot.
#[derive(Debug, Clone, Error)]
pub enum BindError {
    /// The target is absolute or is not a Variable.
    #[error("Cannot monitor '{node_id}': {reason}")]
    InvalidTarget {
        /// Target node.
        node_id: String,
        /// Why the target was rejected.
        reason: String,
    },

    /// The handle refers to a superseded subscription.
    #[error("Subscription generation {generation} is stale (current: {current})")]
    StaleSubscription {
        /// Generation carried by the handle.
        generation: u64,
        /// Generation currently active.
        current: u64,
    },

    /// The server refused to create the monitored item.
    #[error("Monitored item for '{node_id}' rejected with status {status}")]
    Rejected {
        /// Target node.
        node_id: String,
        /// Status returned for the item.
        status: StatusCode,
    },

    /// The session call itself failed.
    #[error("Monitored item registration failed: {0}")]
    Session(#[from] SessionError),
}

impl BindError {
    /// Creates an invalid target error.
    pub fn invalid_target(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a stale subscription error.
    pub fn stale(generation: u64, current: u64) -> Self {
        Self::StaleSubscription {
            generation,
            current,
        }
    }

    /// Creates a rejected item error.
    pub fn rejected(node_id: impl Into<String>, status: StatusCode) -> Self {
        Self::Rejected {
            node_id: node_id.into(),
            status,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Session(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidTarget { .. } | Self::StaleSubscription { .. } => ErrorSeverity::Warning,
            Self::Rejected { .. } | Self::Session(_) => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidTarget { .. } => ErrorCode::new(2, 1),
            Self::StaleSubscription { .. } => ErrorCode::new(2, 2),
            Self::Rejected { .. } => ErrorCode::new(2, 3),
            Self::Session(_) => ErrorCode::new(2, 4),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidTarget { .. } => vec![
                "Only Variable nodes of the connected server can be monitored",
            ],
            Self::StaleSubscription { .. } => {
                vec!["Use the handle returned by the latest create_subscription call"]
            }
            Self::Rejected { .. } => vec![
                "Verify the node exists and its Value attribute is readable",
            ],
            Self::Session(_) => vec!["Check the session connection", "Retry the binding"],
        }
    }
}

// =============================================================================
// DispatchError
// =============================================================================

/// Errors raised by the dispatch bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A batch referenced a superseded subscription.
    #[error("Delivery for generation {generation} dropped (current: {current})")]
    StaleDelivery {
        /// Generation of the batch.
        generation: u64,
        /// Generation currently active.
        current: u64,
    },

    /// The owning loop has been dropped.
    #[error("Dispatch loop of the owning thread is gone")]
    OwnerGone,
}

impl DispatchError {
    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::StaleDelivery { .. } => ErrorSeverity::Info,
            Self::OwnerGone => ErrorSeverity::Warning,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::StaleDelivery { .. } => ErrorCode::new(3, 1),
            Self::OwnerGone => ErrorCode::new(3, 2),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::StaleDelivery { .. } => vec![],
            Self::OwnerGone => vec!["Keep the DispatchLoop alive for as long as sessions deliver"],
        }
    }
}

// =============================================================================
// SessionError
// =============================================================================

/// Errors reported by a [`Session`](crate::session::Session) implementation.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The session is not connected.
    #[error("Session is not connected")]
    NotConnected,

    /// A service call returned a bad service result.
    #[error("{service} failed with status {status}")]
    BadStatus {
        /// Service name.
        service: &'static str,
        /// Service result.
        status: StatusCode,
    },

    /// A continuation point was unknown or already released.
    #[error("Invalid continuation point")]
    BadContinuationPoint,

    /// A service returned fewer results than requested.
    #[error("{service} returned no result for the request")]
    EmptyResponse {
        /// Service name.
        service: &'static str,
    },

    /// A service call timed out.
    #[error("{service} timed out after {duration:?}")]
    Timeout {
        /// Service name.
        service: &'static str,
        /// Elapsed time.
        duration: Duration,
    },

    /// Transport level failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },
}

impl SessionError {
    /// Creates a bad status error.
    pub fn bad_status(service: &'static str, status: StatusCode) -> Self {
        Self::BadStatus { service, status }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(service: &'static str, duration: Duration) -> Self {
        Self::Timeout { service, duration }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Timeout { .. } | Self::Transport { .. }
        )
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout { .. } | Self::BadContinuationPoint => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotConnected => ErrorCode::new(4, 1),
            Self::BadStatus { .. } => ErrorCode::new(4, 2),
            Self::BadContinuationPoint => ErrorCode::new(4, 3),
            Self::EmptyResponse { .. } => ErrorCode::new(4, 4),
            Self::Timeout { .. } => ErrorCode::new(4, 5),
            Self::Transport { .. } => ErrorCode::new(4, 6),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::NotConnected => vec!["Connect the session first"],
            Self::BadContinuationPoint => vec!["Restart the browse from the first page"],
            Self::Timeout { .. } => vec!["Increase the operation timeout of the session"],
            _ => vec!["Check the server and network state"],
        }
    }
}

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Config file not found: {path}")]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// In-memory content could not be deserialized.
    #[error("Failed to deserialize configuration: {message}")]
    Serialization {
        /// Parser message.
        message: String,
    },

    /// The file extension is not a known format.
    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat {
        /// Offending extension.
        extension: String,
    },

    /// A value failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// Field path.
        field: String,
        /// Error message.
        message: String,
    },

    /// An environment override could not be parsed.
    #[error("Invalid environment variable '{name}': {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid environment variable error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::FileNotFound { .. } => ErrorCode::new(5, 1),
            Self::Io { .. } => ErrorCode::new(5, 2),
            Self::Parse { .. } => ErrorCode::new(5, 3),
            Self::Serialization { .. } => ErrorCode::new(5, 4),
            Self::UnsupportedFormat { .. } => ErrorCode::new(5, 5),
            Self::Validation { .. } => ErrorCode::new(5, 6),
            Self::InvalidEnvVar { .. } => ErrorCode::new(5, 7),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::FileNotFound { .. } | Self::Io { .. } => vec!["Check the config file path"],
            Self::UnsupportedFormat { .. } => vec!["Use a .yaml, .yml, .toml or .json file"],
            Self::InvalidEnvVar { .. } => vec!["Unset or correct the UAVIEW_* variable"],
            _ => vec!["Fix the configuration value and reload"],
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::DEBUG,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code, displayed as `UV-XXYY`.
///
/// Categories:
/// - 1: Browse
/// - 2: Bind
/// - 3: Dispatch
/// - 4: Session
/// - 5: Config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category.
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UV-{:02X}{:02X}", self.category, self.code)
    }
}

// =============================================================================
// Result Aliases
// =============================================================================

/// Result type for crate-level operations.
pub type UaViewResult<T> = Result<T, UaViewError>;

/// Result type for browse operations.
pub type BrowseResult<T> = Result<T, BrowseError>;

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;

/// Result type for session calls.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Tests
// =============================================================================
