//! Lifecycle management for the worker child process.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use super::error::{BridgeError, BridgeResult};

/// Default time the worker gets to exit after a termination request (5 seconds).
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How to launch the worker.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Path to the worker executable.
    pub executable: PathBuf,
    /// Directory the worker runs in; also holds the mailbox slots.
    pub working_dir: PathBuf,
    /// Extra command-line arguments.
    pub args: Vec<String>,
    /// Wait between the termination request and a forced kill.
    pub grace_period: Duration,
}

impl SupervisorConfig {
    pub fn new(executable: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
            args: Vec::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

/// How a call to [`Supervisor::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// No process had been started (or it was already shut down).
    NotRunning,
    /// The process had exited on its own before shutdown.
    AlreadyExited,
    /// The process exited within the grace period.
    Graceful,
    /// The process had to be killed.
    Forced,
}

/// Owns the worker process.
///
/// At most one child is live at a time. The child is spawned with
/// `kill_on_drop`, so dropping the supervisor (or a pending
/// [`shutdown`](Self::shutdown) future) never leaks the process.
///
/// # Example
///
/// ```ignore
/// let mut supervisor = Supervisor::new(SupervisorConfig::new("./car-worker", "./data"));
/// supervisor.start().await?;
/// // ... exchanges ...
/// supervisor.shutdown().await;
/// ```
pub struct Supervisor {
    config: SupervisorConfig,
    child: Option<Child>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Launch the worker unless one is already running.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::WorkingDirMissing`] if the working directory does
    /// not exist and [`BridgeError::SpawnFailed`] if the process cannot be
    /// launched. Both are startup-fatal.
    pub async fn start(&mut self) -> BridgeResult<()> {
        if self.is_alive() {
            tracing::info!(pid = ?self.pid(), "worker process is already running");
            return Ok(());
        }
        // A handle whose process has exited is stale.
        self.child = None;

        let working_dir = &self.config.working_dir;
        if !working_dir.is_dir() {
            tracing::error!(dir = %working_dir.display(), "worker working directory not found");
            return Err(BridgeError::WorkingDirMissing(working_dir.clone()));
        }

        let child = Command::new(self.program())
            .args(&self.config.args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                tracing::error!(
                    executable = %self.config.executable.display(),
                    error = %err,
                    "failed to start worker process"
                );
                BridgeError::SpawnFailed(err)
            })?;

        tracing::info!(
            pid = ?child.id(),
            executable = %self.config.executable.display(),
            "worker process started"
        );
        self.child = Some(child);
        Ok(())
    }

    /// Check whether the worker is running.
    pub fn is_alive(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Process id of the running worker.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Stop the worker, escalating to a kill after the grace period.
    ///
    /// Safe to call at any time; the handle is cleared on every path.
    pub async fn shutdown(&mut self) -> ShutdownOutcome {
        let Some(mut child) = self.child.take() else {
            tracing::debug!("no worker process to shut down");
            return ShutdownOutcome::NotRunning;
        };

        if let Ok(Some(status)) = child.try_wait() {
            tracing::info!(%status, "worker process had already exited");
            return ShutdownOutcome::AlreadyExited;
        }

        tracing::info!(pid = ?child.id(), "terminating worker process");
        if let Err(err) = request_termination(&mut child) {
            tracing::warn!(error = %err, "termination request failed");
        }

        match tokio::time::timeout(self.config.grace_period, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(%status, "worker process shut down");
                ShutdownOutcome::Graceful
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "failed waiting for worker, forcing shutdown");
                force_kill(&mut child).await;
                ShutdownOutcome::Forced
            }
            Err(_) => {
                tracing::warn!(
                    grace_ms = self.config.grace_period.as_millis() as u64,
                    "worker did not terminate gracefully, forcing shutdown"
                );
                force_kill(&mut child).await;
                ShutdownOutcome::Forced
            }
        }
    }

    /// Resolve a relative executable path against our own working directory,
    /// since the child runs somewhere else.
    fn program(&self) -> PathBuf {
        let executable = &self.config.executable;
        if executable.is_relative() && executable.components().count() > 1 {
            if let Ok(absolute) = std::fs::canonicalize(executable) {
                return absolute;
            }
        }
        executable.clone()
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    // SAFETY: `pid` is our unreaped child, so it cannot have been recycled.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

async fn force_kill(child: &mut Child) {
    if let Err(err) = child.kill().await {
        tracing::error!(error = %err, "failed to kill worker process");
    }
}
