//! Worker side of the mailbox protocol.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::dispatch;
use super::inventory::Inventory;
use crate::bridge::codec::{self, EMPTY_DOCUMENT};
use crate::bridge::{BridgeError, Mailbox, Slot};

/// Default pause between reads of the command slot.
pub const DEFAULT_WORKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default inventory file name, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "cars_data.txt";

/// Errors raised by the worker loop.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("inventory file {} failed: {source}", path.display())]
    Inventory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Polls the command slot and answers requests from the inventory.
pub struct WorkerLoop {
    mailbox: Mailbox,
    inventory: Inventory,
    data_path: PathBuf,
    poll_interval: Duration,
    last_id: Option<String>,
}

impl WorkerLoop {
    /// Load (or seed) the inventory and attach to the mailbox.
    ///
    /// The slots are left as they are: the bridge prepares them before
    /// starting the worker, and a command may already be waiting.
    pub async fn open(
        mailbox: Mailbox,
        data_path: impl Into<PathBuf>,
    ) -> Result<Self, BackendError> {
        let data_path = data_path.into();
        let inventory = load_or_seed(&data_path).await?;
        tracing::info!(
            cars = inventory.len(),
            path = %data_path.display(),
            "inventory loaded"
        );

        Ok(Self {
            mailbox,
            inventory,
            data_path,
            poll_interval: DEFAULT_WORKER_POLL_INTERVAL,
            last_id: None,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Serve requests until `shutdown` fires.
    ///
    /// Slot I/O failures are logged and retried on the next tick.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        tracing::info!(dir = %self.mailbox.dir().display(), "worker waiting for commands");
        loop {
            if let Err(err) = self.poll_once().await {
                tracing::warn!(error = %err, "failed to process command");
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        tracing::info!("worker stopped");
    }

    /// Handle the pending command, if any. Returns whether one was answered.
    pub async fn poll_once(&mut self) -> Result<bool, BackendError> {
        let content = self.mailbox.read(Slot::Command).await?;
        let trimmed = content.trim();
        if trimmed.is_empty() || trimmed == EMPTY_DOCUMENT {
            return Ok(false);
        }

        let Some(request) = codec::decode_request(trimmed) else {
            tracing::warn!("unparsable command document, clearing");
            self.mailbox.reset(Slot::Command).await?;
            return Ok(false);
        };

        if request.correlation_id.is_empty()
            || self.last_id.as_deref() == Some(request.correlation_id.as_str())
        {
            return Ok(false);
        }

        tracing::info!(
            operation = %request.operation,
            correlation_id = %request.correlation_id,
            "processing command"
        );
        let handled = dispatch::handle(&mut self.inventory, &request);
        if handled.modified {
            self.save().await?;
        }

        let document = codec::encode_response(&handled.response)?;
        // Clear the command before publishing the result: once the caller
        // sees the result it may immediately write its next command.
        self.mailbox.reset(Slot::Command).await?;
        self.mailbox.write(Slot::Result, &document).await?;
        self.last_id = Some(request.correlation_id);
        Ok(true)
    }

    async fn save(&self) -> Result<(), BackendError> {
        tokio::fs::write(&self.data_path, self.inventory.render())
            .await
            .map_err(|source| BackendError::Inventory {
                path: self.data_path.clone(),
                source,
            })?;
        tracing::debug!(cars = self.inventory.len(), "inventory saved");
        Ok(())
    }
}

async fn load_or_seed(path: &Path) -> Result<Inventory, BackendError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(BackendError::Inventory {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let inventory = Inventory::parse(&content);
    if !inventory.is_empty() {
        return Ok(inventory);
    }

    tracing::info!(path = %path.display(), "no inventory found, seeding default cars");
    let fleet = Inventory::default_fleet();
    tokio::fs::write(path, fleet.render())
        .await
        .map_err(|source| BackendError::Inventory {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(fleet)
}
