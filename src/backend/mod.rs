//! Reference car worker.
//!
//! This is the process on the other side of the mailbox: it watches the
//! command slot, runs the requested operation against a file-backed
//! [`Inventory`], and answers in the result slot. The `car-worker` binary
//! wraps [`WorkerLoop`]; the bridge itself never depends on this module.

mod dispatch;
mod inventory;
mod runner;

pub use dispatch::{handle, Handled};
pub use inventory::{Inventory, InventoryError};
pub use runner::{BackendError, WorkerLoop, DEFAULT_DATA_FILE, DEFAULT_WORKER_POLL_INTERVAL};
