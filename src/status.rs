//! Lifecycle status of the supervised server.
use strum_macros::{AsRefStr, Display, EnumString};

/// The single authoritative lifecycle state of the managed server.
///
/// Only the lifecycle monitor and the shutdown path mutate this value;
/// everything else reads it. `Stopped` is both the initial and the
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ServerStatus {
    /// No server process exists.
    Stopped,
    /// A process has been spawned but not yet confirmed alive.
    Starting,
    /// The process has been observed alive by the monitor.
    Running,
    /// A shutdown sequence is in progress.
    Stopping,
}

impl ServerStatus {
    /// Whether the supervisor currently owns a live or pending process.
    pub fn is_active(&self) -> bool {
        !matches!(self, ServerStatus::Stopped)
    }
}
