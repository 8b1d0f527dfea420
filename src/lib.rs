//! # carbridge
//!
//! Talks to a separate car data worker process through two JSON files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │         CLI / UI  (CarCatalog: list, search, ...)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [cars]
//! ┌─────────────────────────────────────────────────────────┐
//! │      CarService + CarAdapter (image path rewrite)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [bridge]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ExchangeEngine ─ codec ─ Mailbox    Supervisor         │
//! └─────────────────────────────────────────────────────────┘
//!                          │ command.json / result.json
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        car-worker  (backend::WorkerLoop + Inventory)     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod bridge;
pub mod cars;
pub mod config;
pub mod logging;
pub mod session;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::bridge::{BridgeError, BridgeResult, ExchangeEngine, Mailbox, Supervisor};
    pub use crate::cars::{Car, CarCatalog, CarFilter, CarService, SearchField, SortKey};
    pub use crate::config::Settings;
    pub use crate::session::{Session, SessionError};
}

pub use bridge::{BridgeError, BridgeResult};
pub use session::Session;
