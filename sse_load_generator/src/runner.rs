use crate::worker::{self, WorkerContext, WorkerReport};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Something that can start a batch of connections.
///
/// The operator loop only depends on this, which keeps it usable without a
/// live hub.
pub trait BatchLauncher {
    fn launch_batch(&self, cancel: &CancellationToken, count: i64);
}

/// Starts connections against the hub described by its [`WorkerContext`].
#[derive(Debug, Clone)]
pub struct Fanout {
    ctx: Arc<WorkerContext>,
}

impl Fanout {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// Spawns workers `1..=count` and returns without waiting on any of them.
    ///
    /// A non-positive `count` spawns nothing. Dropping the returned handles
    /// detaches the workers; they stop on their own when `cancel` fires.
    pub fn launch(
        &self,
        cancel: &CancellationToken,
        count: i64,
    ) -> Vec<JoinHandle<WorkerReport>> {
        let count = u64::try_from(count).unwrap_or(0);
        (1..=count)
            .map(|id| {
                let span = tracing::info_span!("connection", id);
                let worker = worker::run(id, Arc::clone(&self.ctx), cancel.clone());
                tokio::spawn(worker.instrument(span))
            })
            .collect()
    }
}

impl BatchLauncher for Fanout {
    fn launch_batch(&self, cancel: &CancellationToken, count: i64) {
        drop(self.launch(cancel, count));
    }
}
