//! Craftd supervises a single long-running Java game server from a
//! controlling console: it launches the server with configurable JVM
//! options, streams the server's merged console output in real time,
//! forwards line-oriented operator commands to its stdin, and shuts the
//! server down through a graceful-then-forceful escalation.

/// CLI interface.
pub mod cli;

/// Launch configuration and command building.
pub mod config;

/// Constants and default timing values.
pub mod constants;

/// Error handling.
pub mod error;

/// Lifecycle monitoring.
pub mod monitor;

/// Server process launching and signalling.
pub mod process;

/// Console output pump.
pub mod pump;

/// Server status.
pub mod status;

/// Supervisor facade tying the launcher, pump, and monitor together.
pub mod supervisor;
