//! Supervisor facade owning the server process, its console, and the
//! background workers that watch it.
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender, channel},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use chrono::Local;
use nix::sys::signal::Signal;
use tracing::{debug, info, warn};

use crate::{
    config::LaunchConfig,
    constants::{
        GRACE_WINDOW, GRACEFUL_STOP_COMMAND, INTERRUPT_WAIT, KILL_REAP_WAIT,
        MONITOR_POLL_INTERVAL, NATURAL_EXIT_WAIT, PUMP_RETRY_DELAY,
        RESTART_SETTLE_DELAY, STOP_POLL_INTERVAL, TERMINATE_WAIT,
    },
    error::SupervisorError,
    monitor::{self, TerminationEvent},
    process::{self, ServerProcess},
    pump::{self, OutputEvent},
    status::ServerStatus,
};

/// Bounded wait windows used by the shutdown escalation, the lifecycle
/// monitor, and the output pump.
///
/// The defaults come from [`crate::constants`]; tests shrink them so the
/// full escalation ladder runs in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Interval between monitor liveness checks.
    pub monitor_poll: Duration,
    /// Interval between liveness checks inside `stop()`.
    pub stop_poll: Duration,
    /// Window allowed for a graceful exit after the stop command.
    pub grace_window: Duration,
    /// Additional natural-exit wait once the grace window lapses.
    pub natural_exit_wait: Duration,
    /// Pause after SIGINT before escalating.
    pub interrupt_wait: Duration,
    /// Bounded wait after SIGTERM before force-killing.
    pub terminate_wait: Duration,
    /// Bounded wait for the reap after SIGKILL.
    pub kill_reap_wait: Duration,
    /// Settle delay between stop and relaunch during restart.
    pub restart_settle: Duration,
    /// Initial backoff before retrying a failed console read.
    pub pump_retry_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            monitor_poll: MONITOR_POLL_INTERVAL,
            stop_poll: STOP_POLL_INTERVAL,
            grace_window: GRACE_WINDOW,
            natural_exit_wait: NATURAL_EXIT_WAIT,
            interrupt_wait: INTERRUPT_WAIT,
            terminate_wait: TERMINATE_WAIT,
            kill_reap_wait: KILL_REAP_WAIT,
            restart_settle: RESTART_SETTLE_DELAY,
            pump_retry_delay: PUMP_RETRY_DELAY,
        }
    }
}

/// State shared between the foreground API and the background workers.
///
/// Lock order where several are held: `status` before `process` before
/// `console`. The console mutex is the single write lock covering
/// "write + flush" for both operator commands and the graceful stop
/// command.
pub(crate) struct Shared {
    status: Mutex<ServerStatus>,
    process: Mutex<Option<ServerProcess>>,
    console: Mutex<Option<std::process::ChildStdin>>,
    shutdown_in_progress: AtomicBool,
    output_tx: Mutex<Option<Sender<OutputEvent>>>,
    termination_tx: Mutex<Option<Sender<TerminationEvent>>>,
    pub(crate) monitor_active: AtomicBool,
    pub(crate) timings: Timings,
}

impl Shared {
    fn new(timings: Timings) -> Self {
        Self {
            status: Mutex::new(ServerStatus::Stopped),
            process: Mutex::new(None),
            console: Mutex::new(None),
            shutdown_in_progress: AtomicBool::new(false),
            output_tx: Mutex::new(None),
            termination_tx: Mutex::new(None),
            monitor_active: AtomicBool::new(false),
            timings,
        }
    }

    pub(crate) fn status(&self) -> ServerStatus {
        *self.status.lock().unwrap()
    }

    fn set_status(&self, status: ServerStatus) {
        let mut guard = self.status.lock().unwrap();
        if *guard != status {
            debug!("Server status: {} -> {}", *guard, status);
            *guard = status;
        }
    }

    /// Promotes Starting to Running; any other state is left alone.
    pub(crate) fn promote_to_running(&self) {
        let mut guard = self.status.lock().unwrap();
        if *guard == ServerStatus::Starting {
            *guard = ServerStatus::Running;
            info!("Server confirmed alive; status is now running");
        }
    }

    /// Whether a process handle is currently tracked.
    pub(crate) fn process_present(&self) -> bool {
        self.process.lock().unwrap().is_some()
    }

    /// Whether the tracked process is alive right now.
    pub(crate) fn process_alive(&self) -> bool {
        let mut guard = self.process.lock().unwrap();
        match guard.as_mut() {
            Some(process) => matches!(process.poll(), Ok(None)),
            None => false,
        }
    }

    /// Reaps the process if it has exited.
    ///
    /// Taking the handle out of the slot under the lock makes the
    /// termination event exactly-once no matter whether the monitor or
    /// the shutdown path observes the exit first.
    pub(crate) fn try_reap(&self) -> bool {
        let reaped = {
            let mut guard = self.process.lock().unwrap();
            match guard.as_mut() {
                Some(process) => match process.poll() {
                    Ok(Some(status)) => {
                        let pid = process.pid();
                        *guard = None;
                        Some((pid, status.code()))
                    }
                    Ok(None) => None,
                    Err(err) => {
                        warn!("Failed to check server status: {err}");
                        None
                    }
                },
                None => None,
            }
        };

        let Some((pid, exit_code)) = reaped else {
            return false;
        };

        let expected = self.shutdown_in_progress.load(Ordering::SeqCst);
        if expected {
            info!("Server (PID {pid}) exited with code {exit_code:?}");
        } else {
            warn!("Server (PID {pid}) terminated unexpectedly with code {exit_code:?}");
        }

        self.clear_console();
        self.set_status(ServerStatus::Stopped);
        self.emit_termination(TerminationEvent {
            exit_code,
            expected,
        });
        true
    }

    /// Signals the tracked process, if any.
    fn signal_process(&self, signal: Signal) {
        let guard = self.process.lock().unwrap();
        if let Some(process) = guard.as_ref() {
            process.signal(signal);
        }
    }

    /// Writes one line to the server's console and flushes.
    ///
    /// Holding the console lock across write + flush keeps operator
    /// commands and the graceful stop command from interleaving.
    pub(crate) fn write_console_line(&self, line: &str) -> std::io::Result<()> {
        use std::io::Write;

        let mut guard = self.console.lock().unwrap();
        match guard.as_mut() {
            Some(console) => {
                console.write_all(line.as_bytes())?;
                console.write_all(b"\n")?;
                console.flush()
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "server console is not attached",
            )),
        }
    }

    fn clear_console(&self) {
        // Dropping the writer closes the server's stdin.
        *self.console.lock().unwrap() = None;
    }

    pub(crate) fn emit_output(&self, text: String) {
        let event = OutputEvent {
            timestamp: Local::now(),
            text,
        };
        let mut guard = self.output_tx.lock().unwrap();
        let disconnected = match guard.as_ref() {
            Some(tx) => tx.send(event).is_err(),
            None => false,
        };
        if disconnected {
            debug!("Output subscriber disconnected; discarding sender");
            *guard = None;
        }
    }

    fn emit_termination(&self, event: TerminationEvent) {
        let mut guard = self.termination_tx.lock().unwrap();
        let disconnected = match guard.as_ref() {
            Some(tx) => tx.send(event).is_err(),
            None => false,
        };
        if disconnected {
            debug!("Termination subscriber disconnected; discarding sender");
            *guard = None;
        }
    }
}

struct Workers {
    monitor: JoinHandle<()>,
    pump: JoinHandle<()>,
}

/// Supervises one server process: launch, output capture, command
/// forwarding, and the graceful-then-forceful shutdown sequence.
///
/// Everything hangs off the supervisor value; several instances can
/// coexist in one process, each managing at most one server.
pub struct Supervisor {
    shared: Arc<Shared>,
    workers: Mutex<Option<Workers>>,
}

impl Supervisor {
    /// Creates a supervisor with default timing windows.
    pub fn new() -> Self {
        Self::with_timings(Timings::default())
    }

    /// Creates a supervisor with custom timing windows.
    pub fn with_timings(timings: Timings) -> Self {
        Self {
            shared: Arc::new(Shared::new(timings)),
            workers: Mutex::new(None),
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ServerStatus {
        self.shared.status()
    }

    /// Registers the output subscriber, replacing any previous one.
    pub fn subscribe_output(&self) -> Receiver<OutputEvent> {
        let (tx, rx) = channel();
        *self.shared.output_tx.lock().unwrap() = Some(tx);
        rx
    }

    /// Registers the termination subscriber, replacing any previous one.
    pub fn subscribe_termination(&self) -> Receiver<TerminationEvent> {
        let (tx, rx) = channel();
        *self.shared.termination_tx.lock().unwrap() = Some(tx);
        rx
    }

    /// Launches the server described by `config`.
    ///
    /// Rejected with [`SupervisorError::AlreadyActive`] unless the status
    /// is `Stopped`; a spawn failure reverts the status to `Stopped` and
    /// surfaces as [`SupervisorError::LaunchFailure`].
    pub fn start(&self, config: &LaunchConfig) -> Result<(), SupervisorError> {
        config.validate()?;

        {
            let mut status = self.shared.status.lock()?;
            if *status != ServerStatus::Stopped {
                return Err(SupervisorError::AlreadyActive(*status));
            }
            *status = ServerStatus::Starting;
        }

        // The previous launch's workers exit once their process is gone;
        // join them so the pump and console never outlive their handle.
        self.join_workers();

        info!("Starting server from {}", config.jar.display());
        let launched = match process::launch(config) {
            Ok(launched) => launched,
            Err(err) => {
                self.shared.set_status(ServerStatus::Stopped);
                return Err(err);
            }
        };

        self.shared
            .shutdown_in_progress
            .store(false, Ordering::SeqCst);
        *self.shared.console.lock()? = Some(launched.console);
        *self.shared.process.lock()? = Some(launched.process);

        self.shared.monitor_active.store(true, Ordering::SeqCst);
        let monitor_shared = Arc::clone(&self.shared);
        let monitor = thread::spawn(move || monitor::monitor_loop(monitor_shared));
        let pump_shared = Arc::clone(&self.shared);
        let output = launched.output;
        let pump = thread::spawn(move || pump::pump_loop(output, pump_shared));
        *self.workers.lock()? = Some(Workers { monitor, pump });

        Ok(())
    }

    /// Stops the server through the graceful-then-forceful escalation.
    ///
    /// A no-op (with a logged notice) unless the server is running. Never
    /// fails observably: errors during shutdown are logged and absorbed,
    /// and the handle is cleared on every exit path.
    pub fn stop(&self) -> Result<(), SupervisorError> {
        {
            let mut status = self.shared.status.lock().unwrap();
            if *status != ServerStatus::Running {
                info!("Stop requested but server is {}; nothing to do", *status);
                return Ok(());
            }
            *status = ServerStatus::Stopping;
            self.shared
                .shutdown_in_progress
                .store(true, Ordering::SeqCst);
        }

        info!("Sending '{GRACEFUL_STOP_COMMAND}' to server console");
        if let Err(err) = self.shared.write_console_line(GRACEFUL_STOP_COMMAND) {
            warn!("Could not deliver graceful stop command: {err}");
        }

        let timings = self.shared.timings;
        if self.wait_for_exit(timings.grace_window)
            || self.wait_for_exit(timings.natural_exit_wait)
        {
            return self.finish_stop();
        }

        warn!("Server ignored the graceful stop command; sending SIGINT");
        self.shared.signal_process(Signal::SIGINT);
        if self.wait_for_exit(timings.interrupt_wait) {
            return self.finish_stop();
        }

        warn!("Server survived SIGINT; sending SIGTERM");
        self.shared.signal_process(Signal::SIGTERM);
        if self.wait_for_exit(timings.terminate_wait) {
            return self.finish_stop();
        }

        warn!("Server did not exit after SIGTERM; sending SIGKILL");
        self.shared.signal_process(Signal::SIGKILL);
        self.wait_for_exit(timings.kill_reap_wait);
        self.finish_stop()
    }

    /// Stops the server if it is running, waits the settle delay, then
    /// performs the full start sequence unconditionally.
    pub fn restart(&self, config: &LaunchConfig) -> Result<(), SupervisorError> {
        // A start or stop already in flight settles within one poll
        // interval; wait for it so the relaunch is unconditional.
        let deadline = Instant::now() + self.shared.timings.grace_window;
        loop {
            match self.status() {
                ServerStatus::Running => {
                    info!("Restarting server");
                    self.stop()?;
                    thread::sleep(self.shared.timings.restart_settle);
                    break;
                }
                ServerStatus::Stopped => break,
                ServerStatus::Starting | ServerStatus::Stopping => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    thread::sleep(self.shared.timings.stop_poll);
                }
            }
        }

        self.start(config)
    }

    /// Forwards one operator command line to the server's console.
    pub fn send_command(&self, text: &str) -> Result<(), SupervisorError> {
        if self.status() != ServerStatus::Running {
            warn!("Dropping command '{text}': server is not running");
            return Err(SupervisorError::NotRunning);
        }

        match self.shared.write_console_line(text) {
            Ok(()) => {
                debug!("Sent command: {text}");
                Ok(())
            }
            Err(source) => {
                warn!("Failed to send command '{text}': {source}");
                Err(SupervisorError::WriteFailure { source })
            }
        }
    }

    /// Polls for the server's exit until `window` lapses.
    ///
    /// Returns true once the process has been reaped (here or by the
    /// monitor).
    fn wait_for_exit(&self, window: Duration) -> bool {
        let deadline = Instant::now() + window;
        loop {
            if self.shared.try_reap() || !self.shared.process_present() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(self.shared.timings.stop_poll);
        }
    }

    /// Final shutdown bookkeeping, run on every exit path of `stop()`.
    fn finish_stop(&self) -> Result<(), SupervisorError> {
        let leftover = match self.shared.process.lock() {
            Ok(mut guard) => guard.take(),
            Err(err) => {
                warn!("Process slot lock poisoned during shutdown: {err}");
                None
            }
        };
        if let Some(process) = leftover {
            warn!(
                "Clearing server handle (PID {}) without observing its exit",
                process.pid()
            );
            self.shared.emit_termination(TerminationEvent {
                exit_code: None,
                expected: true,
            });
        }

        self.shared.clear_console();
        self.shared.set_status(ServerStatus::Stopped);
        self.shared
            .shutdown_in_progress
            .store(false, Ordering::SeqCst);
        self.shared.monitor_active.store(false, Ordering::SeqCst);
        self.join_workers();
        info!("Server stopped");
        Ok(())
    }

    /// Joins the previous launch's monitor and pump threads.
    fn join_workers(&self) {
        let workers = match self.workers.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(workers) = workers {
            let _ = workers.monitor.join();
            let _ = workers.pump.join();
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
