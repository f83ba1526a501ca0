//! One simulated subscriber.
//!
//! A worker opens a single subscription, logs every event it receives and
//! holds the stream open until the shared cancellation token fires. It never
//! reconnects. Its only side channel to the rest of the process is the shared
//! [`ConnectionCounter`].
use crate::client::{self, HubClient, StreamError};
use crate::counter::{ConnectionCounter, CounterPolicy};
use crate::token::Credential;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TOPIC_PREFIX: &str = "test-topic-";

/// Everything a worker needs besides its id. Shared by every worker of every
/// batch.
#[derive(Debug)]
pub struct WorkerContext {
    pub client: HubClient,
    pub base_url: String,
    pub topic_prefix: String,
    pub credential: Credential,
    pub counter: Arc<ConnectionCounter>,
    pub policy: CounterPolicy,
}

impl WorkerContext {
    pub fn topic(&self, id: u64) -> String {
        format!("{}{}", self.topic_prefix, id)
    }

    pub fn topic_url(&self, id: u64) -> String {
        topic_url(&self.base_url, &self.topic(id))
    }
}

pub fn topic_url(base_url: &str, topic: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}topic={topic}")
}

#[derive(Debug)]
pub enum WorkerOutcome {
    /// Stream was open when cancellation arrived; the slot was released.
    Shutdown,
    /// Connecting or reading failed.
    Failed {
        error: StreamError,
        /// Whether the stream had been established before failing.
        established: bool,
    },
    /// Cancellation arrived before the stream was established.
    Abandoned,
}

#[derive(Debug)]
pub struct WorkerReport {
    pub id: u64,
    pub events_received: u64,
    pub outcome: WorkerOutcome,
}

pub async fn run(id: u64, ctx: Arc<WorkerContext>, cancel: CancellationToken) -> WorkerReport {
    let topic = ctx.topic(id);
    let url = ctx.topic_url(id);
    let mut report = WorkerReport {
        id,
        events_received: 0,
        outcome: WorkerOutcome::Abandoned,
    };

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return report,
        opened = client::subscribe(&ctx.client, &url, &ctx.credential) => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(error) => {
            tracing::warn!(connection = id, error = %error, "connection failed");
            report.outcome = WorkerOutcome::Failed {
                error,
                established: false,
            };
            return report;
        }
    };

    tracing::info!(connection = id, topic = %topic, "connection established");
    let total = ctx.counter.established();
    tracing::info!(total, "current total connections");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                drop(stream);
                tracing::info!(connection = id, "connection shutting down");
                ctx.counter.released();
                report.outcome = WorkerOutcome::Shutdown;
                return report;
            }
            next = stream.next_event() => match next {
                Ok(event) => {
                    report.events_received += 1;
                    tracing::info!(
                        connection = id,
                        event = %event.event,
                        event_id = %event.id,
                        data = %event.data,
                        "received message"
                    );
                }
                Err(error) => {
                    tracing::warn!(connection = id, error = %error, "connection failed");
                    if ctx.policy == CounterPolicy::Balanced {
                        ctx.counter.released();
                    }
                    report.outcome = WorkerOutcome::Failed {
                        error,
                        established: true,
                    };
                    return report;
                }
            }
        }
    }
}
