#[path = "common/mod.rs"]
mod common;

use std::time::{Duration, Instant};

use common::{
    CRASHING_SERVER, ECHO_SERVER, STUBBORN_SERVER, fake_server, test_timings,
    wait_for_status,
};
use craftd::{status::ServerStatus, supervisor::Supervisor};
use tempfile::tempdir;

#[test]
fn graceful_stop_emits_one_expected_termination() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), ECHO_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());
    let terminations = supervisor.subscribe_termination();

    supervisor.start(&config).unwrap();
    wait_for_status(&supervisor, ServerStatus::Running);

    supervisor.stop().unwrap();
    assert_eq!(supervisor.status(), ServerStatus::Stopped);

    let event = terminations.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(event.expected);
    assert_eq!(event.exit_code, Some(0));

    // Exactly one event per termination.
    std::thread::sleep(Duration::from_millis(200));
    assert!(terminations.try_recv().is_err());
}

#[test]
fn stubborn_server_is_force_killed_within_bounds() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), STUBBORN_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());
    let terminations = supervisor.subscribe_termination();

    supervisor.start(&config).unwrap();
    wait_for_status(&supervisor, ServerStatus::Running);

    let began = Instant::now();
    supervisor.stop().unwrap();

    // Grace + natural-exit + interrupt + terminate + kill windows summed,
    // with generous margin for the polling intervals.
    assert!(
        began.elapsed() < Duration::from_secs(5),
        "stop took {:?}, escalation is not bounded",
        began.elapsed()
    );
    assert_eq!(supervisor.status(), ServerStatus::Stopped);

    let event = terminations.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(event.expected);
    assert_eq!(event.exit_code, None, "a killed server has no exit code");
}

#[test]
fn crash_is_reported_as_unexpected() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), CRASHING_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());
    let terminations = supervisor.subscribe_termination();

    supervisor.start(&config).unwrap();
    wait_for_status(&supervisor, ServerStatus::Running);

    let event = terminations.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(!event.expected);
    assert_eq!(event.exit_code, Some(7));

    wait_for_status(&supervisor, ServerStatus::Stopped);
}

#[test]
fn stop_after_a_crash_is_a_noop() {
    let temp = tempdir().unwrap();
    let config = fake_server(temp.path(), CRASHING_SERVER);
    let supervisor = Supervisor::with_timings(test_timings());
    let terminations = supervisor.subscribe_termination();

    supervisor.start(&config).unwrap();
    terminations.recv_timeout(Duration::from_secs(5)).unwrap();
    wait_for_status(&supervisor, ServerStatus::Stopped);

    supervisor.stop().unwrap();
    assert_eq!(supervisor.status(), ServerStatus::Stopped);
    assert!(terminations.try_recv().is_err());
}
