//! Single-flight broker actor.
//!
//! One task owns the request side of the IPC channel and works through a
//! bounded queue, so a request's clear/write/poll sequence never interleaves
//! with another's. Parameter writes only append to the command file, so they
//! travel on their own unbounded lane and land while a request is polling.
//! Handles only enqueue; they never touch the files.

use super::channel::{FileChannel, IpcChannel};
use super::request::{BrokerRequest, FxCommand, RequestKind};
use super::response::{ResponseSet, ready_answer};
use crate::config::{IpcConfig, PollPolicy};
use crate::error::ipc::IpcError;
use crate::message::OutboundMessage;
use crate::registry::ConnectionRegistry;
use crate::stats::BridgeStats;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// How a request ended when the channel itself did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerOutcome {
    /// The host answered; `message` was broadcast to all clients.
    Resolved {
        message: OutboundMessage,
        attempts: u32,
    },
    /// No answer within the kind's budget; nothing was broadcast.
    TimedOut { attempts: u32 },
}

/// Poll policy for each request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerPolicies {
    pub bypass: PollPolicy,
    pub output_read: PollPolicy,
    pub full_read: PollPolicy,
    pub sends_read: PollPolicy,
}

impl BrokerPolicies {
    pub fn for_kind(&self, kind: RequestKind) -> PollPolicy {
        match kind {
            RequestKind::BypassToggle => self.bypass,
            RequestKind::OutputRead => self.output_read,
            RequestKind::FullRead => self.full_read,
            RequestKind::SendsRead => self.sends_read,
        }
    }

    /// Same policy for every kind.
    pub fn uniform(policy: PollPolicy) -> Self {
        Self {
            bypass: policy,
            output_read: policy,
            full_read: policy,
            sends_read: policy,
        }
    }
}

impl From<&IpcConfig> for BrokerPolicies {
    fn from(config: &IpcConfig) -> Self {
        Self {
            bypass: config.bypass,
            output_read: config.output_read,
            full_read: config.full_read,
            sends_read: config.sends_read,
        }
    }
}

impl Default for BrokerPolicies {
    fn default() -> Self {
        Self::from(&IpcConfig::default())
    }
}

type Reply = oneshot::Sender<Result<BrokerOutcome, IpcError>>;

struct BrokerJob {
    request: BrokerRequest,
    reply: Option<Reply>,
}

/// Cloneable front door to the broker actor.
#[derive(Clone)]
pub struct BrokerHandle {
    command_tx: mpsc::Sender<BrokerJob>,
    param_tx: mpsc::UnboundedSender<FxCommand>,
    stats: Arc<BridgeStats>,
}

impl BrokerHandle {
    /// Start the actor over the files named in `config`.
    pub fn from_config(
        config: &IpcConfig,
        registry: Arc<ConnectionRegistry>,
        stats: Arc<BridgeStats>,
    ) -> (Self, JoinHandle<()>) {
        let channel = FileChannel::new(&config.command_file, &config.response_file);
        Self::spawn(
            channel,
            BrokerPolicies::from(config),
            config.queue_capacity,
            registry,
            stats,
        )
    }

    /// Start the actor over any channel.
    ///
    /// `queue_capacity` is how many jobs may wait behind the one running.
    pub fn spawn<C: IpcChannel>(
        channel: C,
        policies: BrokerPolicies,
        queue_capacity: usize,
        registry: Arc<ConnectionRegistry>,
        stats: Arc<BridgeStats>,
    ) -> (Self, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(queue_capacity.max(1));
        let (param_tx, param_rx) = mpsc::unbounded_channel();
        let channel = Arc::new(channel);
        let actor = BrokerActor {
            channel: Arc::clone(&channel),
            policies,
            registry,
            stats: Arc::clone(&stats),
        };
        let writer = ParamWriter {
            channel,
            stats: Arc::clone(&stats),
        };
        let task = tokio::spawn(async move {
            let ((), ()) = tokio::join!(actor.run(command_rx), writer.run(param_rx));
        });
        (
            Self {
                command_tx,
                param_tx,
                stats,
            },
            task,
        )
    }

    /// Queue a request; its result is broadcast, not returned.
    ///
    /// # Errors
    ///
    /// - [`IpcError::Busy`] - the queue is full
    /// - [`IpcError::Closed`] - the actor has stopped
    #[track_caller]
    pub fn submit(&self, request: impl Into<BrokerRequest>) -> Result<(), IpcError> {
        self.enqueue(BrokerJob {
            request: request.into(),
            reply: None,
        })
    }

    /// Append a parameter write to the command file. No answer is expected.
    ///
    /// Never waits behind queued requests and is never rejected as busy.
    ///
    /// # Errors
    ///
    /// - [`IpcError::Closed`] - the writer has stopped
    #[track_caller]
    pub fn write_param(&self, command: FxCommand) -> Result<(), IpcError> {
        let location = ErrorLocation::from(Location::caller());
        self.param_tx.send(command).map_err(|_| IpcError::Closed {
            message: "FX parameter writer has stopped".to_string(),
            location,
        })
    }

    /// Queue a request and wait for how it ended.
    ///
    /// Dropping the returned future does not cancel the request.
    pub async fn request(
        &self,
        request: impl Into<BrokerRequest>,
    ) -> Result<BrokerOutcome, IpcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue(BrokerJob {
            request: request.into(),
            reply: Some(reply_tx),
        })?;
        reply_rx.await.map_err(|_| IpcError::Closed {
            message: "Broker actor dropped the request".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?
    }

    #[track_caller]
    fn enqueue(&self, job: BrokerJob) -> Result<(), IpcError> {
        let location = ErrorLocation::from(Location::caller());
        self.command_tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => {
                self.stats.broker_busy();
                IpcError::Busy {
                    message: "Another IPC request is in flight and the queue is full".to_string(),
                    location,
                }
            }
            TrySendError::Closed(_) => IpcError::Closed {
                message: "Broker actor has stopped".to_string(),
                location,
            },
        })
    }
}

struct BrokerActor<C> {
    channel: Arc<C>,
    policies: BrokerPolicies,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<BridgeStats>,
}

impl<C: IpcChannel> BrokerActor<C> {
    async fn run(self, mut command_rx: mpsc::Receiver<BrokerJob>) {
        info!("IPC broker actor started");

        while let Some(BrokerJob { request, reply }) = command_rx.recv().await {
            let result = self.execute(request).await;
            self.record(request.kind(), &result);
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }

        info!("IPC broker actor stopped");
    }

    /// Clear, write, poll, parse, broadcast.
    async fn execute(&self, request: BrokerRequest) -> Result<BrokerOutcome, IpcError> {
        let kind = request.kind();
        let line = request.command_line();

        self.channel.clear_response().await?;
        self.channel.append_command(&line).await?;
        info!("→ {}: {}", kind.label(), line.trim_end());

        let policy = self.policies.for_kind(kind);
        let mut ticker = interval_at(Instant::now() + policy.interval(), policy.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=policy.max_attempts {
            let _ = ticker.tick().await;

            let content = self.channel.read_response().await?;
            let Some(answer) = ready_answer(&content) else {
                continue;
            };

            // Consumed: leave the slot empty for the next request.
            self.channel.clear_response().await?;

            let answer = ResponseSet::parse(answer);
            if answer.skipped > 0 {
                warn!(
                    "{}: skipped {} unparsable response line(s)",
                    kind.label(),
                    answer.skipped
                );
            }

            let message = request.resolve(answer);
            let report = self.registry.broadcast(&message).await;
            log_resolved(kind, &message, report.delivered);

            return Ok(BrokerOutcome::Resolved {
                message,
                attempts: attempt,
            });
        }

        Ok(BrokerOutcome::TimedOut {
            attempts: policy.max_attempts,
        })
    }

    fn record(&self, kind: RequestKind, result: &Result<BrokerOutcome, IpcError>) {
        match result {
            Ok(BrokerOutcome::Resolved { .. }) => self.stats.broker_resolved(),
            Ok(BrokerOutcome::TimedOut { attempts }) => {
                self.stats.broker_timeout();
                if kind == RequestKind::FullRead {
                    info!("FX Read timeout");
                } else {
                    debug!("{} got no answer after {attempts} polls", kind.label());
                }
            }
            Err(e) => {
                self.stats.broker_io_error();
                error!("{} error: {e}", kind.label());
            }
        }
    }
}

/// Appends `fx` lines as they arrive, independent of the request queue.
struct ParamWriter<C> {
    channel: Arc<C>,
    stats: Arc<BridgeStats>,
}

impl<C: IpcChannel> ParamWriter<C> {
    async fn run(self, mut param_rx: mpsc::UnboundedReceiver<FxCommand>) {
        while let Some(command) = param_rx.recv().await {
            let line = command.command_line();
            match self.channel.append_command(&line).await {
                Ok(()) => info!("→ FX: {}", line.trim_end()),
                Err(e) => {
                    self.stats.broker_io_error();
                    error!("FX command file error: {e}");
                }
            }
        }
    }
}

fn log_resolved(kind: RequestKind, message: &OutboundMessage, recipients: usize) {
    match (kind, message) {
        (RequestKind::FullRead, OutboundMessage::FxValues { params, .. }) => {
            info!("← FX Values: {} params ({recipients} clients)", params.len());
        }
        (RequestKind::BypassToggle, _) => {
            info!("← FX Bypass state updated ({recipients} clients)");
        }
        (RequestKind::SendsRead, OutboundMessage::AllSendValues { tracks }) => {
            info!("← All Send Values: {} tracks ({recipients} clients)", tracks.len());
        }
        _ => debug!("← {} answered ({recipients} clients)", kind.label()),
    }
}
