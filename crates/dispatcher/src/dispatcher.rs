//! Dispatcher - single consumer loop delivering queued facts to a sink

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{ContractError, FactEnvelope, FactSink};
use fact_queue::{BoundedQueue, CancellationToken, Dequeued};
use observability::{DeliveryStatsAggregator, DeliverySummary};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::DispatchMetrics;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Upper bound for one delivery attempt
    pub delivery_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

/// Why the dispatcher stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchExit {
    /// Queue closed and fully drained
    Drained,
    /// Dispatch token fired; remaining facts abandoned
    Cancelled,
}

/// Dispatcher run summary
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Facts still buffered when this dispatcher was cancelled
    pub abandoned: u64,
    pub exit: DispatchExit,
    pub summary: DeliverySummary,
}

/// Drains the queue and attempts each fact exactly once
///
/// No retry, no reordering, no batching. A failed delivery never stops the
/// loop. Several dispatchers may share one queue.
pub struct Dispatcher<S: FactSink> {
    sink: S,
    queue: BoundedQueue<FactEnvelope>,
    cancel: CancellationToken,
    config: DispatcherConfig,
    metrics: Arc<DispatchMetrics>,
    stats: DeliveryStatsAggregator,
}

impl<S: FactSink + 'static> Dispatcher<S> {
    pub fn new(
        sink: S,
        queue: BoundedQueue<FactEnvelope>,
        cancel: CancellationToken,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            sink,
            queue,
            cancel,
            config,
            metrics: Arc::new(DispatchMetrics::new()),
            stats: DeliveryStatsAggregator::new(),
        }
    }

    /// Shared metrics, readable while the dispatcher runs
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        self.metrics.clone()
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<DispatchReport> {
        tokio::spawn(self.run())
    }

    /// Run the dispatcher main loop
    ///
    /// Returns when the queue is closed and drained, or when the dispatch
    /// token fires. The sink is flushed and closed either way.
    #[instrument(name = "dispatcher_run", skip(self), fields(sink = %self.sink.name()))]
    pub async fn run(mut self) -> DispatchReport {
        info!(
            delivery_timeout_ms = self.config.delivery_timeout.as_millis() as u64,
            "Dispatcher started"
        );

        let exit = loop {
            match self.queue.dequeue(&self.cancel).await {
                Dequeued::Item(envelope) => self.dispatch(envelope).await,
                Dequeued::Closed => {
                    info!("Queue closed and drained");
                    break DispatchExit::Drained;
                }
                Dequeued::Cancelled => {
                    let abandoned = self.queue.len();
                    if abandoned > 0 {
                        warn!(abandoned, "Dispatch cancelled, abandoning buffered facts");
                    } else {
                        info!("Dispatch cancelled");
                    }
                    self.metrics.add_abandoned(abandoned as u64);
                    observability::record_facts_abandoned(abandoned);
                    break DispatchExit::Cancelled;
                }
            }
        };

        self.shutdown_sink().await;

        let snapshot = self.metrics.snapshot();
        let report = DispatchReport {
            delivered: snapshot.delivered,
            failed: snapshot.failed,
            timed_out: snapshot.timed_out,
            abandoned: snapshot.abandoned,
            exit,
            summary: self.stats.summary(),
        };

        info!(
            delivered = report.delivered,
            failed = report.failed,
            abandoned = report.abandoned,
            exit = ?report.exit,
            "Dispatcher stopped"
        );
        report
    }

    async fn dispatch(&mut self, envelope: FactEnvelope) {
        observability::record_queue_depth(self.queue.len());
        debug!(
            seq = envelope.seq,
            value = envelope.fact.value,
            comment = %envelope.fact.comment,
            "Processing fact"
        );

        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.delivery_timeout;

        let result = match tokio::time::timeout_at(
            deadline,
            self.sink.deliver(&envelope, deadline.into_std()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ContractError::DeliveryTimeout {
                sink_name: self.sink.name().to_string(),
                timeout_ms: self.config.delivery_timeout.as_millis() as u64,
            }),
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_delivery(self.sink.name(), result.is_ok(), latency_ms);

        match &result {
            Ok(()) => {
                self.metrics.inc_delivered();
                info!(seq = envelope.seq, latency_ms, "Fact delivered");
            }
            Err(e) => {
                self.metrics.inc_failed();
                if e.is_timeout() {
                    self.metrics.inc_timed_out();
                }
                error!(seq = envelope.seq, latency_ms, error = %e, "Delivery failed");
            }
        }
        self.stats.update(&result, latency_ms);
    }

    async fn shutdown_sink(&mut self) {
        if let Err(e) = self.sink.flush().await {
            error!(error = %e, "Flush failed on shutdown");
        }
        if let Err(e) = self.sink.close().await {
            error!(error = %e, "Close failed on shutdown");
        }
    }
}
