//! Event stream processing
//!
//! Reads newline-delimited JSON events and hands each one to the ingest
//! pipeline on its own task, with a bound on tasks in flight. Different
//! users run concurrently; one user's events run one at a time in the order
//! they were read. Events that fail are logged and dropped; they are never
//! retried.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use engage_common::{AppError, AppResult};
use engage_core::{ActivityEvent, Snowflake};
use engage_service::{FailureKind, IngestPipeline, ServiceContext};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Counters for one run over an event stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Non-empty lines read
    pub received: u64,
    /// Events processed successfully
    pub handled: u64,
    /// Lines that did not parse or validate
    pub rejected: u64,
    /// Events dropped after a processing failure
    pub failed: u64,
}

impl IngestStats {
    fn record(&mut self, result: Result<bool, JoinError>) {
        match result {
            Ok(true) => self.handled += 1,
            Ok(false) => self.failed += 1,
            Err(e) => {
                error!(error = %e, "Event task panicked");
                self.failed += 1;
            }
        }
    }
}

/// Completion signals of the last event dispatched per user
#[derive(Debug, Default)]
struct UserQueues {
    tails: HashMap<Snowflake, oneshot::Receiver<()>>,
}

impl UserQueues {
    /// Register a new last event for `user_id`. Returns the signal of the
    /// event it must wait for, and the sender it fires when done.
    fn enqueue(
        &mut self,
        user_id: Snowflake,
    ) -> (Option<oneshot::Receiver<()>>, oneshot::Sender<()>) {
        let (done_tx, done_rx) = oneshot::channel();
        (self.tails.insert(user_id, done_rx), done_tx)
    }

    /// Drop entries whose last event already finished
    fn prune(&mut self) {
        self.tails
            .retain(|_, done| matches!(done.try_recv(), Err(TryRecvError::Empty)));
    }

    fn len(&self) -> usize {
        self.tails.len()
    }
}

/// Process every event from `reader` until EOF or `shutdown` resolves.
/// In-flight events are always drained before returning.
pub async fn process_stream<R, S>(
    ctx: Arc<ServiceContext>,
    reader: R,
    concurrency: usize,
    shutdown: S,
) -> AppResult<IngestStats>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut stats = IngestStats::default();
    let mut queues = UserQueues::default();
    let mut lines = reader.lines();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "Shutdown requested, draining in-flight events");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            debug!("Event stream closed");
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.received += 1;

        let event = match ActivityEvent::from_json(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Rejected event");
                stats.rejected += 1;
                continue;
            }
        };

        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(AppError::internal)?;
        let (previous, done) = queues.enqueue(event.user_id());
        let ctx = Arc::clone(&ctx);
        tasks.spawn(async move {
            let _permit = permit;
            if let Some(previous) = previous {
                // Err means the previous task panicked; it is finished either way
                let _ = previous.await;
            }
            let handled = handle_event(&ctx, &event).await;
            let _ = done.send(());
            handled
        });

        if queues.len() > concurrency.max(1) * 4 {
            queues.prune();
        }

        while let Some(done) = tasks.try_join_next() {
            stats.record(done);
        }
    }

    while let Some(done) = tasks.join_next().await {
        stats.record(done);
    }

    Ok(stats)
}

/// Run one event through the pipeline; `false` means it was dropped
async fn handle_event(ctx: &ServiceContext, event: &ActivityEvent) -> bool {
    match IngestPipeline::new(ctx).handle(event).await {
        Ok(outcome) => {
            if let Some(reconciled) = outcome.reconciled() {
                if !reconciled.failed.is_empty() {
                    warn!(
                        user_id = %event.user_id(),
                        failed = reconciled.failed.len(),
                        "Reconciliation finished with failed rules"
                    );
                }
            }
            true
        }
        Err(e) => {
            match e.kind() {
                FailureKind::Durable | FailureKind::Internal => error!(
                    error = %e,
                    code = e.error_code(),
                    event_type = event.event_type(),
                    user_id = %event.user_id(),
                    "Event dropped"
                ),
                FailureKind::Ephemeral | FailureKind::Validation => warn!(
                    error = %e,
                    code = e.error_code(),
                    event_type = event.event_type(),
                    user_id = %event.user_id(),
                    "Event dropped"
                ),
            }
            false
        }
    }
}
