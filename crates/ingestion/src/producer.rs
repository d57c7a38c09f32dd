//! Producer - pulls facts from a source and offers them to the queue

use std::sync::Arc;
use std::time::Duration;

use contracts::{FactEnvelope, FactSource};
use fact_queue::{BoundedQueue, CancellationToken, DropReason, Enqueue};
use lifecycle::{ShutdownCoordinator, ShutdownReason};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ProducerMetrics, ProducerMetricsSnapshot, ProducerSettings};

/// Why the producer stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerExit {
    /// Source returned no more facts
    Exhausted,
    /// Intake token fired
    Cancelled,
}

/// Producer run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerReport {
    pub produced: u64,
    pub accepted: u64,
    /// Rejected enqueues plus source faults
    pub dropped: u64,
    pub faults: u64,
    pub exit: ProducerExit,
}

impl ProducerReport {
    fn new(snapshot: ProducerMetricsSnapshot, exit: ProducerExit) -> Self {
        Self {
            produced: snapshot.produced,
            accepted: snapshot.accepted,
            dropped: snapshot.dropped(),
            faults: snapshot.faults,
            exit,
        }
    }
}

/// Single producer loop
///
/// Enqueue never waits: a full or closed queue drops the fact and the loop
/// moves on. Cancellation is checked before every enqueue attempt.
pub struct Producer<S: FactSource> {
    source: S,
    queue: BoundedQueue<FactEnvelope>,
    cancel: CancellationToken,
    settings: ProducerSettings,
    metrics: Arc<ProducerMetrics>,
    stop_on_exhaustion: Option<Arc<ShutdownCoordinator>>,
}

enum Step<T> {
    Next(T),
    Cancelled,
}

impl<S: FactSource> Producer<S> {
    pub fn new(source: S, queue: BoundedQueue<FactEnvelope>, cancel: CancellationToken) -> Self {
        Self {
            source,
            queue,
            cancel,
            settings: ProducerSettings::default(),
            metrics: Arc::new(ProducerMetrics::new()),
            stop_on_exhaustion: None,
        }
    }

    pub fn with_settings(mut self, settings: ProducerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Trigger shutdown through `coordinator` once the source is exhausted
    pub fn stop_when_exhausted(mut self, coordinator: Arc<ShutdownCoordinator>) -> Self {
        self.stop_on_exhaustion = Some(coordinator);
        self
    }

    /// Shared metrics, readable while the producer runs
    pub fn metrics(&self) -> Arc<ProducerMetrics> {
        self.metrics.clone()
    }

    /// Run until the source is exhausted or the intake token fires
    #[instrument(name = "producer", skip(self), fields(source = %self.source.name()))]
    pub async fn run(mut self) -> ProducerReport {
        info!(interval = ?self.settings.interval, "producer started");
        let mut seq: u64 = 0;

        let exit = loop {
            if self.cancel.is_cancelled() {
                break ProducerExit::Cancelled;
            }

            let step = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Step::Cancelled,
                next = self.source.next_fact() => Step::Next(next),
            };
            let next = match step {
                Step::Next(next) => next,
                Step::Cancelled => break ProducerExit::Cancelled,
            };

            match next {
                Ok(Some(fact)) => {
                    self.metrics.record_produced();
                    if self.cancel.is_cancelled() {
                        debug!("cancelled before enqueue, fact discarded");
                        break ProducerExit::Cancelled;
                    }
                    seq += 1;
                    self.offer(FactEnvelope::new(seq, fact));
                }
                Ok(None) => {
                    info!("source exhausted");
                    break ProducerExit::Exhausted;
                }
                Err(e) => {
                    self.metrics.record_fault();
                    observability::record_fact_dropped("fault");
                    error!(error = %e, "source fault, fact dropped");
                }
            }

            if let Some(interval) = self.settings.interval {
                if self.pause(interval).await {
                    break ProducerExit::Cancelled;
                }
            }
        };

        if exit == ProducerExit::Exhausted {
            if let Some(coordinator) = &self.stop_on_exhaustion {
                coordinator.trigger(ShutdownReason::SourceExhausted);
            }
        }

        let report = ProducerReport::new(self.metrics.snapshot(), exit);
        info!(
            produced = report.produced,
            accepted = report.accepted,
            dropped = report.dropped,
            faults = report.faults,
            exit = ?report.exit,
            "producer stopped"
        );
        report
    }

    fn offer(&self, envelope: FactEnvelope) {
        let seq = envelope.seq;
        match self.queue.try_enqueue(envelope) {
            Enqueue::Accepted => {
                self.metrics.record_accepted();
                observability::record_fact_accepted();
                observability::record_queue_depth(self.queue.len());
                debug!(seq, depth = self.queue.len(), "fact accepted");
            }
            Enqueue::Dropped(reason) => {
                match reason {
                    DropReason::Full => self.metrics.record_dropped_full(),
                    DropReason::Closed => self.metrics.record_dropped_closed(),
                }
                observability::record_fact_dropped(reason.as_str());
                warn!(seq, reason = reason.as_str(), "queue rejected fact, dropped");
            }
        }
    }

    /// Sleep between facts; `true` if cancelled meanwhile
    async fn pause(&self, interval: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(interval) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SyntheticSource;
    use contracts::{ContractError, Fact, FactTemplate};
    use fact_queue::Dequeued;
    use lifecycle::{DrainPolicy, ShutdownState};

    /// Source scripted with a fixed list of results
    struct ScriptedSource {
        items: std::vec::IntoIter<Result<Option<Fact>, ContractError>>,
    }

    impl ScriptedSource {
        fn new(items: Vec<Result<Option<Fact>, ContractError>>) -> Self {
            Self {
                items: items.into_iter(),
            }
        }
    }

    impl FactSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn next_fact(&mut self) -> Result<Option<Fact>, ContractError> {
            self.items.next().unwrap_or(Ok(None))
        }
    }

    /// Source that never yields
    struct StalledSource;

    impl FactSource for StalledSource {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn next_fact(&mut self) -> Result<Option<Fact>, ContractError> {
            std::future::pending().await
        }
    }

    fn fact(value: i64) -> Fact {
        let t = FactTemplate::default();
        Fact {
            period_start: t.period_start,
            period_end: t.period_end,
            period_key: t.period_key,
            indicator_to_mo_id: t.indicator_to_mo_id,
            indicator_to_mo_fact_id: t.indicator_to_mo_fact_id,
            value,
            fact_time: t.fact_time,
            is_plan: t.is_plan,
            auth_user_id: t.auth_user_id,
            comment: format!("scripted {value}"),
        }
    }

    async fn drain(queue: &BoundedQueue<FactEnvelope>) -> Vec<FactEnvelope> {
        queue.close();
        let token = CancellationToken::new();
        let mut out = Vec::new();
        while let Dequeued::Item(item) = queue.dequeue(&token).await {
            out.push(item);
        }
        out
    }

    #[tokio::test]
    async fn test_enqueues_all_synthetic_facts_in_order() {
        let queue = BoundedQueue::new(100).unwrap();
        let source = SyntheticSource::new(FactTemplate::default(), "buffer test", 10);

        let report = Producer::new(source, queue.clone(), CancellationToken::new())
            .run()
            .await;

        assert_eq!(report.exit, ProducerExit::Exhausted);
        assert_eq!(report.produced, 10);
        assert_eq!(report.accepted, 10);
        assert_eq!(report.dropped, 0);

        let items = drain(&queue).await;
        let seqs: Vec<_> = items.iter().map(|e| e.seq).collect();
        let values: Vec<_> = items.iter().map(|e| e.fact.value).collect();
        assert_eq!(seqs, (1..=10).collect::<Vec<_>>());
        assert_eq!(values, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let queue = BoundedQueue::new(2).unwrap();
        let source = SyntheticSource::new(FactTemplate::default(), "overflow", 5);

        let report = tokio::time::timeout(
            Duration::from_secs(1),
            Producer::new(source, queue.clone(), CancellationToken::new()).run(),
        )
        .await
        .expect("producer blocked on a full queue");

        assert_eq!(report.accepted, 2);
        assert_eq!(report.dropped, 3);
        assert_eq!(queue.metrics().dropped_full(), 3);

        let values: Vec<_> = drain(&queue).await.iter().map(|e| e.fact.value).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_source_fault_is_counted_and_production_continues() {
        let queue = BoundedQueue::new(10).unwrap();
        let source = ScriptedSource::new(vec![
            Ok(Some(fact(1))),
            Err(ContractError::source_read("scripted", "bad line")),
            Ok(Some(fact(3))),
        ]);

        let report = Producer::new(source, queue.clone(), CancellationToken::new())
            .run()
            .await;

        assert_eq!(report.faults, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.accepted, 2);

        let values: Vec<_> = drain(&queue).await.iter().map(|e| e.fact.value).collect();
        assert_eq!(values, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_enqueues_nothing() {
        let queue = BoundedQueue::new(10).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let source = SyntheticSource::new(FactTemplate::default(), "x", 10);
        let report = Producer::new(source, queue.clone(), token).run().await;

        assert_eq!(report.exit, ProducerExit::Cancelled);
        assert_eq!(report.accepted, 0);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_stalled_source() {
        let queue = BoundedQueue::new(10).unwrap();
        let token = CancellationToken::new();

        let handle = tokio::spawn(Producer::new(StalledSource, queue, token.clone()).run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let report = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("producer ignored cancellation")
            .unwrap();
        assert_eq!(report.exit, ProducerExit::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_during_interval() {
        let queue = BoundedQueue::new(10).unwrap();
        let token = CancellationToken::new();
        let source = SyntheticSource::new(FactTemplate::default(), "slow", 100);

        let producer = Producer::new(source, queue.clone(), token.clone())
            .with_settings(ProducerSettings::new(Some(Duration::from_secs(10))));
        let handle = tokio::spawn(producer.run());

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let report = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.exit, ProducerExit::Cancelled);
        assert_eq!(report.accepted, 1);
    }

    #[tokio::test]
    async fn test_exhaustion_triggers_coordinator() {
        let queue = BoundedQueue::new(10).unwrap();
        let coordinator = Arc::new(ShutdownCoordinator::new(
            queue.clone(),
            DrainPolicy::Drain {
                grace: Duration::from_secs(5),
            },
        ));
        let source = SyntheticSource::new(FactTemplate::default(), "x", 3);

        let report = Producer::new(source, queue.clone(), coordinator.intake_token())
            .stop_when_exhausted(Arc::clone(&coordinator))
            .run()
            .await;

        assert_eq!(report.exit, ProducerExit::Exhausted);
        assert_eq!(coordinator.state(), ShutdownState::Triggered);
        assert_eq!(coordinator.reason(), Some(ShutdownReason::SourceExhausted));
        assert!(queue.is_closed());
        assert_eq!(queue.len(), 3);
    }
}
