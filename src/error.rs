//! Error types for controller synchronization.
//!
//! This module provides the error taxonomy for the nvrsync client library.
//! All errors implement the `std::error::Error` trait and include structured context
//! for debugging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Decode Errors**: Malformed websocket frames or packets
//! - **Record Errors**: Unknown record kinds and constrained-field validation failures
//! - **Request Errors**: Failures reported by the HTTP session collaborator
//! - **Connection Errors**: Websocket connect failures and timeouts
//! - **Configuration Errors**: Invalid or unreadable client configuration
//!
//! ## Propagation
//!
//! Decode and unknown-kind errors raised while applying a live update packet are
//! logged by the connection supervisor and never end the session. The same errors
//! raised while building the bootstrap snapshot are returned to the caller.
//!
//! ```rust
//! use nvrsync::ProtectError;
//!
//! let error = ProtectError::connection_failed("controller unreachable");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type alias for nvrsync operations.
pub type Result<T, E = ProtectError> = std::result::Result<T, E>;

/// Main error type for nvrsync operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProtectError {
    #[error("Frame decode error at offset {offset}: {details}")]
    FrameDecode { offset: usize, details: String },

    #[error("Packet decode error: {details}")]
    PacketDecode { details: String },

    #[error("Unknown record kind: {}", kind.as_deref().unwrap_or("<missing>"))]
    UnknownKind { kind: Option<String> },

    #[error("Validation failed for '{field}': {details}")]
    Validation { field: String, details: String },

    #[error("Request to '{path}' failed ({status:?}): {details}")]
    Request { path: String, status: Option<u16>, details: String },

    #[error("Not authorized: {details}")]
    NotAuthorized { details: String },

    #[error("Bad request: {details}")]
    BadRequest { details: String },

    #[error("Failed to connect to controller: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Configuration error: {details}")]
    Config { details: String },

    #[error("JSON error in {context}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtectError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProtectError::Connection { .. } => true,
            ProtectError::Timeout { .. } => true,
            ProtectError::Request { status, .. } => status.is_none_or(|s| s >= 500),
            ProtectError::FrameDecode { .. } => false,
            ProtectError::PacketDecode { .. } => false,
            ProtectError::UnknownKind { .. } => false,
            ProtectError::Validation { .. } => false,
            ProtectError::NotAuthorized { .. } => false,
            ProtectError::BadRequest { .. } => false,
            ProtectError::Config { .. } => false,
            ProtectError::Json { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ProtectError::FrameDecode { .. } | ProtectError::PacketDecode { .. } => vec![
                "Check controller firmware compatibility",
                "Capture the raw packet for inspection",
                "Refresh the bootstrap snapshot if updates were lost",
            ],
            ProtectError::UnknownKind { .. } => vec![
                "Update library to a version that knows this record kind",
                "Restrict subscribed kinds in the client configuration",
            ],
            ProtectError::Validation { .. } => vec![
                "Check the allowed range of the field",
                "Verify the value before assigning it",
            ],
            ProtectError::Request { .. } => vec![
                "Verify the controller is responding",
                "Check the request path and payload",
                "Retry the operation",
            ],
            ProtectError::NotAuthorized { .. } => vec![
                "Check username and password",
                "Verify the account has the required permissions",
            ],
            ProtectError::BadRequest { .. } => vec![
                "Check the record kind and referenced IDs",
                "Refresh the bootstrap snapshot",
            ],
            ProtectError::Connection { .. } => vec![
                "Ensure the controller is reachable",
                "Check host, port and TLS settings",
                "Wait for the automatic reconnect",
            ],
            ProtectError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Check network latency to the controller",
            ],
            ProtectError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Verify required fields are present",
            ],
            ProtectError::Json { .. } => vec![
                "Verify source data integrity",
                "Check controller firmware compatibility",
            ],
        }
    }

    /// Helper constructor for frame decode errors.
    pub fn frame_decode(offset: usize, details: impl Into<String>) -> Self {
        ProtectError::FrameDecode { offset, details: details.into() }
    }

    /// Helper constructor for packet decode errors.
    pub fn packet_decode(details: impl Into<String>) -> Self {
        ProtectError::PacketDecode { details: details.into() }
    }

    /// Helper constructor for unknown record kinds.
    pub fn unknown_kind(kind: Option<&str>) -> Self {
        ProtectError::UnknownKind { kind: kind.map(str::to_string) }
    }

    /// Helper constructor for validation errors.
    pub fn validation(field: impl Into<String>, details: impl Into<String>) -> Self {
        ProtectError::Validation { field: field.into(), details: details.into() }
    }

    /// Helper constructor for failed requests.
    pub fn request_failed(
        path: impl Into<String>,
        status: Option<u16>,
        details: impl Into<String>,
    ) -> Self {
        ProtectError::Request { path: path.into(), status, details: details.into() }
    }

    /// Helper constructor for bad requests.
    pub fn bad_request(details: impl Into<String>) -> Self {
        ProtectError::BadRequest { details: details.into() }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        ProtectError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        ProtectError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        ProtectError::Config { details: details.into() }
    }

    /// Helper constructor for JSON errors with context.
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        ProtectError::Json { context: context.into(), source }
    }
}
