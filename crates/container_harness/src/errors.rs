//! Error types for container provisioning operations.
//!
//! Every failure the harness can observe is expressed as a [`ContainerError`].
//! The fatal helpers (`new_container`, `port`) turn these into test failures;
//! the `try_` variants hand them back to the caller.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Container harness errors.
///
/// Underlying library errors are captured as strings so that the error stays
/// `Clone` and comparable in tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidImage { reference: String, reason: String },

    #[error("Invalid port specification '{spec}': {reason}")]
    InvalidPort { spec: String, reason: String },

    /// The container could not be created or did not reach the running state.
    #[error("Failed to start container from image '{image}': {reason}")]
    Provision { image: String, reason: String },

    /// The container is running but has no host mapping for the port.
    #[error("Port {port} is not exposed by container {container_id}")]
    PortNotMapped { container_id: String, port: String },

    #[error("Failed to resolve mapped port {port} for container {container_id}: {reason}")]
    PortResolution {
        container_id: String,
        port: String,
        reason: String,
    },

    #[error("Failed to terminate container {container_id}: {reason}")]
    Termination {
        container_id: String,
        reason: String,
    },

    #[error("Container {container_id} is not running")]
    NotRunning { container_id: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid harness configuration: {key} - {reason}")]
    Config { key: String, reason: String },
}

/// Result type alias for container harness operations.
pub type ContainerResult<T> = Result<T, ContainerError>;
