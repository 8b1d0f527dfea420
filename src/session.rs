//! Wiring of settings, mailbox, supervisor, and catalog into one handle.

use std::sync::Arc;

use crate::bridge::{BridgeError, ExchangeEngine, Mailbox, ShutdownOutcome, Supervisor};
use crate::cars::{CarAdapter, CarService};
use crate::config::{Settings, SettingsError};

/// Errors raised while starting a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// A running worker plus the catalog that talks to it.
///
/// Dropping a session kills the worker; call [`Session::shutdown`] to give it
/// the grace period first.
pub struct Session {
    supervisor: Supervisor,
    catalog: CarService,
}

impl Session {
    /// Prepare the mailbox and start the worker described by `settings`.
    ///
    /// The slots are reset before the worker is spawned, so the worker never
    /// sees a command left over from a previous run.
    pub async fn launch(settings: &Settings) -> Result<Self, SessionError> {
        settings.validate()?;
        let supervisor_config = settings.supervisor_config()?;

        let working_dir = supervisor_config.working_dir.clone();
        if !working_dir.is_dir() {
            return Err(BridgeError::WorkingDirMissing(working_dir).into());
        }

        let mailbox = Mailbox::open(
            &working_dir,
            &settings.mailbox.command_file,
            &settings.mailbox.result_file,
        )?;
        mailbox.initialize().await?;

        let mut supervisor = Supervisor::new(supervisor_config);
        supervisor.start().await?;

        let engine = ExchangeEngine::new(mailbox, settings.exchange_config());
        let catalog = CarService::new(Arc::new(engine), CarAdapter::new(settings.path_rewrite()));

        tracing::info!(
            dir = %working_dir.display(),
            pid = ?supervisor.pid(),
            "session started"
        );
        Ok(Self {
            supervisor,
            catalog,
        })
    }

    pub fn catalog(&self) -> &CarService {
        &self.catalog
    }

    pub fn supervisor_mut(&mut self) -> &mut Supervisor {
        &mut self.supervisor
    }

    /// Stop the worker.
    pub async fn shutdown(mut self) -> ShutdownOutcome {
        self.supervisor.shutdown().await
    }
}
