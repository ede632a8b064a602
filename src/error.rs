//! Error handling for craftd.
use thiserror::Error;

use crate::status::ServerStatus;

/// Defines all possible errors that can occur in the server supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Error reading or accessing a configuration file.
    #[error("Failed to read config file: {0}")]
    ConfigReadError(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    ConfigParseError(#[from] serde_yaml::Error),

    /// Launch parameters are unusable (empty or missing paths).
    #[error("Invalid launch configuration: {0}")]
    InvalidConfig(String),

    /// Error spawning the server process.
    #[error("Failed to launch server: {source}")]
    LaunchFailure {
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// A start was requested while a server is already being managed.
    #[error("Cannot start server while it is {0}")]
    AlreadyActive(ServerStatus),

    /// A command was sent while no server is running.
    #[error("Server is not running")]
    NotRunning,

    /// Error writing a command to the server's console.
    #[error("Failed to write to server console: {source}")]
    WriteFailure {
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Error for poisoned mutex.
    #[error("Mutex is poisoned: {0}")]
    MutexPoisonError(String),
}

/// Implement the `From` trait to convert a `std::sync::PoisonError` into a `SupervisorError`.
impl<T> From<std::sync::PoisonError<T>> for SupervisorError {
    /// Converts a `std::sync::PoisonError` into a `SupervisorError`.
    fn from(err: std::sync::PoisonError<T>) -> Self {
        SupervisorError::MutexPoisonError(err.to_string())
    }
}
