//! Background liveness monitoring for the server process.
use std::{
    sync::{Arc, atomic::Ordering},
    thread,
};

use tracing::debug;

use crate::supervisor::Shared;

/// Raised exactly once when a supervised server terminates.
#[derive(Debug, Clone, Copy)]
pub struct TerminationEvent {
    /// Exit code of the server, or `None` when it was killed by a signal.
    pub exit_code: Option<i32>,
    /// True only when the supervisor's own shutdown sequence initiated
    /// the termination; false signals a crash.
    pub expected: bool,
}

/// Polls the server's liveness at a fixed interval for the lifetime of
/// one process handle.
///
/// The first confirmed alive poll promotes `Starting` to `Running`; an
/// observed exit reaps the process, emits the termination event, and
/// ends the loop. The loop also ends when the handle was reaped
/// elsewhere or when the supervisor deactivates monitoring.
pub(crate) fn monitor_loop(shared: Arc<Shared>) {
    debug!("Lifecycle monitor started");

    while shared.monitor_active.load(Ordering::SeqCst) {
        thread::sleep(shared.timings.monitor_poll);

        if shared.try_reap() {
            break;
        }
        if !shared.process_present() {
            debug!("Server handle already cleared; monitor has nothing to watch");
            break;
        }

        shared.promote_to_running();
    }

    debug!("Lifecycle monitor exiting");
}
