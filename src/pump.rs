//! Continuous reader draining the server's merged console stream.
use std::{
    io::{BufRead, BufReader, PipeReader},
    sync::Arc,
    thread,
};

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::{
    constants::{PUMP_MAX_RETRIES, STREAM_CLOSED_MARKER},
    supervisor::Shared,
};

/// One line of server console output.
#[derive(Debug, Clone)]
pub struct OutputEvent {
    /// When the line was read from the server.
    pub timestamp: DateTime<Local>,
    /// The line text with trailing line terminators removed.
    pub text: String,
}

/// Drains the merged output stream line by line until end-of-stream or
/// until the server is no longer running.
///
/// Non-empty lines become output events in arrival order; empty lines are
/// dropped. Read errors while the server still looks alive are reported
/// as output events and retried with a doubling backoff, capped at
/// [`PUMP_MAX_RETRIES`] consecutive failures.
pub(crate) fn pump_loop(output: PipeReader, shared: Arc<Shared>) {
    debug!("Output pump started");
    let mut reader = BufReader::new(output);
    let mut line = String::new();
    let mut failures = 0u32;
    let mut retry_delay = shared.timings.pump_retry_delay;

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                shared.emit_output(STREAM_CLOSED_MARKER.to_string());
                break;
            }
            Ok(_) => {
                failures = 0;
                retry_delay = shared.timings.pump_retry_delay;
                let text = line.trim_end_matches(['\n', '\r']);
                if !text.is_empty() {
                    shared.emit_output(text.to_string());
                }
            }
            Err(err) => {
                if !shared.process_alive() {
                    debug!("Console read failed after server exit: {err}");
                    break;
                }
                failures += 1;
                if failures > PUMP_MAX_RETRIES {
                    warn!("Giving up on server console after {PUMP_MAX_RETRIES} read failures");
                    shared.emit_output(format!(
                        "[craftd] console reader failed permanently: {err}"
                    ));
                    break;
                }
                warn!("Console read failed (attempt {failures}): {err}");
                shared.emit_output(format!(
                    "[craftd] console read error: {err}; retrying"
                ));
                thread::sleep(retry_delay);
                retry_delay *= 2;
            }
        }
    }

    debug!("Output pump exiting");
}
