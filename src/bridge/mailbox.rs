//! File-backed mailbox slots shared with the worker process.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::codec::EMPTY_DOCUMENT;
use super::error::{BridgeError, BridgeResult};

/// Default file name of the command slot.
pub const DEFAULT_COMMAND_FILE: &str = "command.json";

/// Default file name of the result slot.
pub const DEFAULT_RESULT_FILE: &str = "result.json";

/// Distinguishes temporary files of concurrent writers in one process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// One of the two mailbox slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Caller → worker.
    Command,
    /// Worker → caller.
    Result,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Command => f.write_str("command"),
            Slot::Result => f.write_str("result"),
        }
    }
}

/// The pair of slot files living in the worker's working directory.
///
/// Writes go to a sibling temporary file that is synced and renamed over the
/// slot, so a reader sees either the previous document or the new one.
#[derive(Debug, Clone)]
pub struct Mailbox {
    dir: PathBuf,
    command_path: PathBuf,
    result_path: PathBuf,
}

impl Mailbox {
    /// Open the mailbox in `dir` with the given slot file names.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MailboxUnavailable`] if `dir` is not a directory.
    pub fn open(
        dir: impl Into<PathBuf>,
        command_file: &str,
        result_file: &str,
    ) -> BridgeResult<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(BridgeError::MailboxUnavailable {
                path: dir,
                source: io::Error::new(io::ErrorKind::NotFound, "mailbox directory not found"),
            });
        }

        Ok(Self {
            command_path: dir.join(command_file),
            result_path: dir.join(result_file),
            dir,
        })
    }

    /// Open the mailbox in `dir` with the default slot file names.
    pub fn open_default(dir: impl Into<PathBuf>) -> BridgeResult<Self> {
        Self::open(dir, DEFAULT_COMMAND_FILE, DEFAULT_RESULT_FILE)
    }

    /// Reset both slots to the empty document.
    ///
    /// Called once at startup; any failure here means the application
    /// cannot talk to the worker at all.
    pub async fn initialize(&self) -> BridgeResult<()> {
        for slot in [Slot::Command, Slot::Result] {
            self.reset(slot).await.map_err(|err| match err {
                BridgeError::MailboxIo { source, .. } => BridgeError::MailboxUnavailable {
                    path: self.dir.clone(),
                    source,
                },
                other => other,
            })?;
        }
        tracing::debug!(dir = %self.dir.display(), "mailbox initialized");
        Ok(())
    }

    /// Directory containing the slot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a slot's file.
    pub fn path(&self, slot: Slot) -> &Path {
        match slot {
            Slot::Command => &self.command_path,
            Slot::Result => &self.result_path,
        }
    }

    /// Overwrite a slot with `document`, flushed to disk before returning.
    pub async fn write(&self, slot: Slot, document: &str) -> BridgeResult<()> {
        self.write_atomic(slot, document)
            .await
            .map_err(|source| BridgeError::MailboxIo { slot, source })
    }

    /// Read a slot's document.
    ///
    /// An absent or zero-length file reads as the empty document.
    pub async fn read(&self, slot: Slot) -> BridgeResult<String> {
        match fs::read_to_string(self.path(slot)).await {
            Ok(content) if content.is_empty() => Ok(EMPTY_DOCUMENT.to_string()),
            Ok(content) => Ok(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(EMPTY_DOCUMENT.to_string()),
            Err(source) => Err(BridgeError::MailboxIo { slot, source }),
        }
    }

    /// Replace a slot's contents with the empty document.
    pub async fn reset(&self, slot: Slot) -> BridgeResult<()> {
        self.write(slot, EMPTY_DOCUMENT).await
    }

    async fn write_atomic(&self, slot: Slot, document: &str) -> io::Result<()> {
        let target = self.path(slot);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = target.with_extension(format!("{}-{}.tmp", std::process::id(), seq));

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(document.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Err(err) = fs::rename(&tmp, target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err);
        }
        Ok(())
    }
}
