//! File-mailbox bridge to the car data worker.
//!
//! The worker is a separate, long-running process. There is no socket or pipe
//! between us; instead both sides share two JSON files in the worker's
//! working directory.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   carbridge (Rust + Tokio)                   │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ Supervisor      - spawns / terminates the worker        │  │
//! │  │ ExchangeEngine  - one correlated request at a time      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │         write │ command.json            result.json ▲ poll   │
//! └───────────────┼───────────────────────────────────────┼──────┘
//!                 ▼                                       │
//! ┌──────────────────────────────────────────────────────────────┐
//! │              Car worker (long-running child process)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! An exchange resets `result.json`, writes the request to `command.json`,
//! and polls `result.json` until a response with the same `correlation_id`
//! shows up. It then empties `command.json` to acknowledge.
//!
//! # Example
//!
//! ```ignore
//! use carbridge::bridge::{ExchangeConfig, ExchangeEngine, Mailbox, Supervisor, SupervisorConfig};
//!
//! let mut supervisor = Supervisor::new(SupervisorConfig::new("./car-worker", "./data"));
//! let mailbox = Mailbox::open_default("./data")?;
//! mailbox.initialize().await?;
//! supervisor.start().await?;
//!
//! let engine = ExchangeEngine::new(mailbox, ExchangeConfig::default());
//! let response = engine.exchange("GET_ALL_CARS", Default::default()).await?;
//!
//! supervisor.shutdown().await;
//! ```

pub mod codec;
mod error;
mod exchange;
mod mailbox;
mod supervisor;

pub use codec::{Decoded, Payload, Request, Response, Status, EMPTY_DOCUMENT};
pub use error::{BridgeError, BridgeResult};
pub use exchange::{
    ExchangeConfig, ExchangeEngine, IdGenerator, UuidGenerator, DEFAULT_POLL_INTERVAL,
    DEFAULT_TIMEOUT,
};
pub use mailbox::{Mailbox, Slot, DEFAULT_COMMAND_FILE, DEFAULT_RESULT_FILE};
pub use supervisor::{ShutdownOutcome, Supervisor, SupervisorConfig, DEFAULT_GRACE_PERIOD};
