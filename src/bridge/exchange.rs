//! Correlated request/response exchange over the mailbox slots.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::codec::{self, Decoded, Payload, Request, Response};
use super::error::{BridgeError, BridgeResult};
use super::mailbox::{Mailbox, Slot};

/// Default time to wait for a correlated response (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between reads of the result slot.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polling bounds for an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Source of correlation identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_id(&self) -> String {
        self()
    }
}

/// Counters for reads that did not produce the awaited response.
#[derive(Debug, Default, Clone, Copy)]
struct PollStats {
    polls: u32,
    malformed: u32,
    mismatched: u32,
}

/// Sends requests to the worker and waits for the matching response.
///
/// There is a single command slot and a single result slot, so only one
/// exchange may be in flight. Concurrent callers queue on an internal lock.
///
/// # Example
///
/// ```ignore
/// let mailbox = Mailbox::open_default("./data")?;
/// let engine = ExchangeEngine::new(mailbox, ExchangeConfig::default());
///
/// let response = engine.exchange("GET_ALL_CARS", Payload::new()).await?;
/// ```
pub struct ExchangeEngine {
    mailbox: Mailbox,
    config: ExchangeConfig,
    ids: Box<dyn IdGenerator>,
    in_flight: Mutex<()>,
}

impl ExchangeEngine {
    pub fn new(mailbox: Mailbox, config: ExchangeConfig) -> Self {
        Self {
            mailbox,
            config,
            ids: Box::new(UuidGenerator),
            in_flight: Mutex::new(()),
        }
    }

    /// Replace the correlation id source.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn config(&self) -> ExchangeConfig {
        self.config
    }

    /// Send one request and wait for its response.
    ///
    /// A worker-reported error is still an `Ok` response here; inspect
    /// [`Response::status`]. The request is never resent.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Timeout`] if no correlated response arrives in time.
    /// - [`BridgeError::MailboxIo`] if a slot cannot be read or written.
    /// - [`BridgeError::InvalidPayload`] / [`BridgeError::Encode`] if the
    ///   request cannot be serialized.
    pub async fn exchange(&self, operation: &str, payload: Payload) -> BridgeResult<Response> {
        self.exchange_with_cancel(operation, payload, &CancellationToken::new())
            .await
    }

    /// Like [`exchange`](Self::exchange), but stops polling when `cancel` fires.
    pub async fn exchange_with_cancel(
        &self,
        operation: &str,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> BridgeResult<Response> {
        let _guard = self.in_flight.lock().await;

        let request = Request::new(operation, self.ids.next_id(), payload);
        let span = tracing::debug_span!(
            "exchange",
            operation = %request.operation,
            correlation_id = %request.correlation_id
        );
        self.run(&request, cancel).instrument(span).await
    }

    async fn run(&self, request: &Request, cancel: &CancellationToken) -> BridgeResult<Response> {
        let document = codec::encode(request)?;

        // A leftover response must never be mistaken for this one.
        self.mailbox.reset(Slot::Result).await?;
        self.mailbox.write(Slot::Command, &document).await?;
        tracing::debug!("command written");

        let mut stats = PollStats::default();
        let deadline = Instant::now() + self.config.timeout;

        loop {
            stats.polls += 1;
            let content = match self.mailbox.read(Slot::Result).await {
                Ok(content) => content,
                Err(err) => {
                    self.clear_command().await;
                    return Err(err);
                }
            };

            match codec::decode(&content) {
                Decoded::Empty => {}
                Decoded::Incomplete => {
                    stats.malformed += 1;
                    tracing::debug!(malformed_reads = stats.malformed, "result not ready yet");
                }
                Decoded::Ready(response) if response.correlation_id == request.correlation_id => {
                    self.clear_command().await;
                    tracing::debug!(
                        status = ?response.status,
                        polls = stats.polls,
                        malformed_reads = stats.malformed,
                        "response received"
                    );
                    return Ok(response);
                }
                Decoded::Ready(response) => {
                    stats.mismatched += 1;
                    tracing::debug!(
                        found = %response.correlation_id,
                        "ignoring uncorrelated response"
                    );
                }
            }

            if Instant::now() >= deadline {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.clear_command().await;
                    tracing::warn!(polls = stats.polls, "exchange cancelled");
                    return Err(BridgeError::Cancelled {
                        operation: request.operation.clone(),
                        correlation_id: request.correlation_id.clone(),
                    });
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        self.clear_command().await;
        tracing::warn!(
            polls = stats.polls,
            malformed_reads = stats.malformed,
            mismatched = stats.mismatched,
            "no response from worker before timeout"
        );
        Err(BridgeError::Timeout {
            operation: request.operation.clone(),
            correlation_id: request.correlation_id.clone(),
            malformed_reads: stats.malformed,
        })
    }

    /// Empty the command slot, telling the worker the request is finished.
    ///
    /// A failure is only logged: the outcome of the exchange is already
    /// decided and the next exchange overwrites the slot anyway.
    async fn clear_command(&self) {
        if let Err(err) = self.mailbox.reset(Slot::Command).await {
            tracing::warn!(error = %err, "failed to clear command slot");
        }
    }
}
