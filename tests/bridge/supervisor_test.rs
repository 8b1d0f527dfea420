//! Supervisor lifecycle against real child processes.
#![cfg(unix)]

use carbridge::bridge::{ShutdownOutcome, Supervisor, SupervisorConfig};
use std::time::{Duration, Instant};

fn supervisor(dir: &tempfile::TempDir, program: &str, args: &[&str]) -> Supervisor {
    Supervisor::new(
        SupervisorConfig::new(program, dir.path())
            .with_args(args.iter().map(|arg| arg.to_string()).collect())
            .with_grace_period(Duration::from_millis(500)),
    )
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(&dir, "sleep", &["30"]);

    supervisor.start().await.unwrap();
    assert!(supervisor.is_alive());
    assert!(supervisor.pid().is_some());

    assert_eq!(supervisor.shutdown().await, ShutdownOutcome::Graceful);
    assert!(!supervisor.is_alive());
    assert!(supervisor.pid().is_none());
}

#[tokio::test]
async fn test_forced_shutdown_after_grace_period() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(&dir, "sh", &["-c", "trap '' TERM; sleep 30"]);

    supervisor.start().await.unwrap();
    // Give the shell time to install the trap.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    assert_eq!(supervisor.shutdown().await, ShutdownOutcome::Forced);
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(!supervisor.is_alive());
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(&dir, "sleep", &["30"]);

    supervisor.start().await.unwrap();
    let pid = supervisor.pid();
    supervisor.start().await.unwrap();

    assert_eq!(supervisor.pid(), pid);
    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_after_worker_exited() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(&dir, "true", &[]);

    supervisor.start().await.unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while supervisor.is_alive() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(supervisor.shutdown().await, ShutdownOutcome::AlreadyExited);
    assert_eq!(supervisor.shutdown().await, ShutdownOutcome::NotRunning);
}

#[tokio::test]
async fn test_restart_after_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(&dir, "sh", &["-c", "sleep 0.1"]);

    supervisor.start().await.unwrap();
    let first = supervisor.pid();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!supervisor.is_alive());

    supervisor.start().await.unwrap();
    assert!(supervisor.is_alive());
    assert_ne!(supervisor.pid(), first);
    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_worker_runs_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = supervisor(&dir, "sh", &["-c", "pwd > where.txt"]);

    supervisor.start().await.unwrap();
    let marker = dir.path().join("where.txt");
    let deadline = Instant::now() + Duration::from_secs(5);
    while supervisor.is_alive() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let recorded = std::fs::read_to_string(marker).unwrap();
    assert_eq!(
        std::fs::canonicalize(recorded.trim()).unwrap(),
        std::fs::canonicalize(dir.path()).unwrap()
    );
    supervisor.shutdown().await;
}
