//! Launching and signalling the server process.
use std::{
    io::{self, PipeReader},
    os::unix::process::CommandExt,
    process::{Child, ChildStdin, Command, ExitStatus, Stdio},
};

use tracing::{debug, error, info, warn};

use crate::{config::LaunchConfig, error::SupervisorError};

/// Handle for a spawned server process.
///
/// Owned exclusively by the supervisor; callers never see it. The first
/// observed exit status is cached so repeated polls stay truthful after
/// the child has been reaped.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    exit_status: Option<ExitStatus>,
}

impl ServerProcess {
    /// OS process ID of the server.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Checks whether the server has exited, reaping it if so.
    ///
    /// Returns `Ok(None)` while the server is still running and the exit
    /// status once it has terminated.
    pub fn poll(&mut self) -> io::Result<Option<ExitStatus>> {
        if let Some(status) = self.exit_status {
            return Ok(Some(status));
        }
        match self.child.try_wait()? {
            Some(status) => {
                self.exit_status = Some(status);
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    /// Delivers a signal to the server process.
    ///
    /// A process that disappeared between the liveness check and the
    /// signal is not an error; the next poll will reap it.
    pub fn signal(&self, signal: nix::sys::signal::Signal) {
        let pid = nix::unistd::Pid::from_raw(self.child.id() as i32);
        match nix::sys::signal::kill(pid, signal) {
            Ok(()) => debug!("Sent {signal:?} to server (PID {pid})"),
            Err(nix::errno::Errno::ESRCH) => {
                debug!("Server exited before {signal:?} could be delivered")
            }
            Err(err) => warn!("Failed to deliver {signal:?} to server: {err}"),
        }
    }
}

/// A freshly launched server with its console endpoints.
#[derive(Debug)]
pub struct LaunchedServer {
    /// The process handle.
    pub process: ServerProcess,
    /// Write end of the server's stdin.
    pub console: ChildStdin,
    /// Read end of the merged stdout+stderr stream.
    pub output: PipeReader,
}

/// Spawns the server described by `config`.
///
/// stdin is piped, stdout and stderr are merged into a single pipe, and
/// the working directory is the jar's containing directory. The child is
/// placed in its own process group so terminal signals aimed at the
/// supervisor do not reach it directly.
pub fn launch(config: &LaunchConfig) -> Result<LaunchedServer, SupervisorError> {
    let args = config.launch_args();
    let server_dir = config.server_dir();
    debug!("Launching server: `{}` in {:?}", args.join(" "), server_dir);

    let (reader, writer) = io::pipe()
        .map_err(|source| SupervisorError::LaunchFailure { source })?;
    let writer_clone = writer
        .try_clone()
        .map_err(|source| SupervisorError::LaunchFailure { source })?;

    let mut cmd = Command::new(&args[0]);
    cmd.args(&args[1..]);
    cmd.current_dir(&server_dir);
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::from(writer_clone));
    cmd.stderr(Stdio::from(writer));

    unsafe {
        cmd.pre_exec(|| {
            // Own process group so a Ctrl-C aimed at the console does not
            // bypass the supervisor's shutdown sequence.
            if libc::setpgid(0, 0) < 0 {
                let err = std::io::Error::last_os_error();
                eprintln!("craftd pre_exec: setpgid(0, 0) failed: {:?}", err);
                return Err(err);
            }

            // Ensure the server gets killed on supervisor death (Linux only)
            #[cfg(target_os = "linux")]
            {
                use libc::{PR_SET_PDEATHSIG, SIGTERM, prctl};
                if prctl(PR_SET_PDEATHSIG, SIGTERM, 0, 0, 0) < 0 {
                    let err = std::io::Error::last_os_error();
                    eprintln!("craftd pre_exec: prctl PR_SET_PDEATHSIG failed: {:?}", err);
                    return Err(err);
                }
            }

            Ok(())
        });
    }

    match cmd.spawn() {
        Ok(mut child) => {
            let console = child.stdin.take().ok_or_else(|| {
                SupervisorError::LaunchFailure {
                    source: io::Error::other("child stdin was not captured"),
                }
            })?;
            info!("Server started with PID {}", child.id());
            Ok(LaunchedServer {
                process: ServerProcess {
                    child,
                    exit_status: None,
                },
                console,
                output: reader,
            })
        }
        Err(e) => {
            error!("Failed to launch server: {e}");
            Err(SupervisorError::LaunchFailure { source: e })
        }
    }
}
