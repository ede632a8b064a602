//! Constants and default timing values for the server supervisor.
//!
//! This module centralizes the magic numbers and strings used by the
//! launcher, pump, monitor, and shutdown escalation.

use std::time::Duration;

// ============================================================================
// Console Protocol Constants
// ============================================================================

/// The line written to the server's console to request a graceful shutdown.
pub const GRACEFUL_STOP_COMMAND: &str = "stop";

/// Marker line emitted as an output event when the server's output stream
/// reaches end-of-stream.
pub const STREAM_CLOSED_MARKER: &str = "*** server output stream closed ***";

// ============================================================================
// Lifecycle Monitoring Timing
// ============================================================================

/// Interval between liveness checks performed by the lifecycle monitor.
pub const MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Shutdown Escalation Timing
// ============================================================================

/// Interval between liveness checks while waiting for the server to exit
/// during shutdown.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Time allowed for the server to exit after the graceful stop command.
pub const GRACE_WINDOW: Duration = Duration::from_secs(10);

/// Additional bounded wait for a natural exit once the grace window lapses.
pub const NATURAL_EXIT_WAIT: Duration = Duration::from_secs(5);

/// Pause after delivering an interrupt signal before escalating further.
pub const INTERRUPT_WAIT: Duration = Duration::from_secs(2);

/// Bounded wait after a terminate request before force-killing.
pub const TERMINATE_WAIT: Duration = Duration::from_secs(5);

/// Bounded wait for the process to be reaped after a force-kill.
pub const KILL_REAP_WAIT: Duration = Duration::from_secs(2);

/// Settle delay between stopping and relaunching during a restart.
pub const RESTART_SETTLE_DELAY: Duration = Duration::from_secs(2);

// ============================================================================
// Output Pump Retry Policy
// ============================================================================

/// Maximum number of consecutive read errors tolerated while the server
/// still looks alive before the pump gives up.
pub const PUMP_MAX_RETRIES: u32 = 3;

/// Initial delay before retrying a failed console read; doubles per retry.
pub const PUMP_RETRY_DELAY: Duration = Duration::from_secs(1);
