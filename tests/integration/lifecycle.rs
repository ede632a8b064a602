#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::{ECHO_SERVER, fake_server, test_timings, wait_for_line, wait_for_status};
use craftd::{error::SupervisorError, status::ServerStatus, supervisor::Supervisor};
use tempfile::tempdir;

#[test]
fn start_reports_starting_then_running() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), ECHO_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());

    supervisor.start(&config).unwrap();
    assert_eq!(supervisor.status(), ServerStatus::Starting);

    wait_for_status(&supervisor, ServerStatus::Running);

    supervisor.stop().unwrap();
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[test]
fn second_start_is_rejected_while_active() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), ECHO_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());

    supervisor.start(&config).unwrap();
    assert!(matches!(
        supervisor.start(&config),
        Err(SupervisorError::AlreadyActive(_))
    ));

    wait_for_status(&supervisor, ServerStatus::Running);
    assert!(matches!(
        supervisor.start(&config),
        Err(SupervisorError::AlreadyActive(ServerStatus::Running))
    ));

    supervisor.stop().unwrap();
}

#[test]
fn send_command_round_trips_through_the_console() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), ECHO_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());
    let output = supervisor.subscribe_output();

    supervisor.start(&config).unwrap();
    wait_for_status(&supervisor, ServerStatus::Running);

    supervisor.send_command("say hello").unwrap();
    assert_eq!(wait_for_line(&output, "cmd:"), "cmd:say hello");

    supervisor.stop().unwrap();
}

#[test]
fn send_command_fails_without_a_server() {
    let supervisor = Supervisor::with_timings(test_timings());
    let output = supervisor.subscribe_output();

    assert!(matches!(
        supervisor.send_command("list"),
        Err(SupervisorError::NotRunning)
    ));
    assert!(output.try_recv().is_err());
}

#[test]
fn launch_failure_reverts_to_stopped() {
    let temp = tempdir().unwrap();
    let mut config = fake_server(temp.path(), ECHO_SERVER);

    // An existing but non-executable file passes validation and fails at
    // spawn time.
    let plain = temp.path().join("not-executable");
    fs::write(&plain, "#!/bin/sh\n").unwrap();
    config.java = plain.display().to_string();

    let supervisor = Supervisor::with_timings(test_timings());
    let err = supervisor.start(&config).unwrap_err();
    assert!(matches!(err, SupervisorError::LaunchFailure { .. }));
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}

#[test]
fn restart_relaunches_the_server() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), ECHO_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());
    let output = supervisor.subscribe_output();
    let terminations = supervisor.subscribe_termination();

    supervisor.start(&config).unwrap();
    wait_for_status(&supervisor, ServerStatus::Running);
    wait_for_line(&output, "server ready");

    supervisor.restart(&config).unwrap();
    wait_for_status(&supervisor, ServerStatus::Running);
    wait_for_line(&output, "server ready");

    // The old server went down exactly once, as an expected stop.
    let event = terminations
        .recv_timeout(std::time::Duration::from_secs(1))
        .unwrap();
    assert!(event.expected);
    assert!(terminations.try_recv().is_err());

    supervisor.stop().unwrap();
}

#[test]
fn restart_from_stopped_just_starts() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), ECHO_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());

    supervisor.restart(&config).unwrap();
    wait_for_status(&supervisor, ServerStatus::Running);

    supervisor.stop().unwrap();
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
}
