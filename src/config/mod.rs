//! Configuration module for carbridge.
//!
//! Handles the worker launch settings, exchange timing, and mailbox layout.

mod settings;

pub use settings::{
    expand_env_vars, ExchangeSettings, ImageSettings, MailboxSettings, Settings, SettingsError,
    WorkerSettings,
};
