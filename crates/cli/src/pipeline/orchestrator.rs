//! Pipeline orchestrator - coordinates all components.
//!
//! Three tasks share the queue and the shutdown tokens: producer,
//! dispatcher and shutdown listener. The dispatcher's join is the ordering
//! point; the producer is joined after it and the coordinator is marked
//! complete last.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{FactEnvelope, RelayBlueprint};
use dispatcher::{create_sink, Dispatcher, DispatcherConfig};
use fact_queue::BoundedQueue;
use ingestion::{ConfiguredSource, Producer, ProducerSettings};
use lifecycle::{signal, DrainPolicy, ShutdownCoordinator};
use secrecy::SecretString;
use tracing::{error, info, warn};

use super::RunStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug)]
pub struct PipelineConfig {
    /// Validated relay configuration
    pub blueprint: RelayBlueprint,

    /// Run timeout (None = run until signalled)
    pub timeout: Option<Duration>,

    /// Bearer token overriding `sink.params.auth_token`
    pub auth_token: Option<SecretString>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the relay until shutdown completes
    pub async fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();
        let PipelineConfig {
            blueprint,
            timeout,
            auth_token,
            metrics_port,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let capacity = blueprint.queue.capacity;
        let queue = BoundedQueue::<FactEnvelope>::new(capacity)
            .map_err(|e| CliError::pipeline_setup(e.to_string()))?;

        let policy = DrainPolicy::from_grace(blueprint.shutdown.drain_grace());
        if blueprint.shutdown.stop_when_exhausted && policy == DrainPolicy::Abandon {
            warn!("stop_when_exhausted without drain grace abandons facts still buffered");
        }
        let coordinator = Arc::new(ShutdownCoordinator::new(queue.clone(), policy));

        let source = ConfiguredSource::from_config(&blueprint.producer)
            .await
            .map_err(|e| CliError::pipeline_setup(e.to_string()))
            .context("Failed to open fact source")?;

        let sink = create_sink(&blueprint.sink, auth_token)
            .await
            .map_err(|e| CliError::pipeline_setup(e.to_string()))
            .context("Failed to create sink")?;

        info!(
            capacity,
            source = ?blueprint.producer.source,
            sink = %blueprint.sink.name,
            sink_type = ?blueprint.sink.sink_type,
            policy = ?policy,
            timeout = ?timeout,
            "Relay configured"
        );

        // Shutdown listener
        let listener = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.listen(signal::shutdown_signal(timeout)).await })
        };

        // Dispatcher
        let dispatcher = Dispatcher::new(
            sink,
            queue.clone(),
            coordinator.dispatch_token(),
            DispatcherConfig {
                delivery_timeout: blueprint.sink.delivery_timeout(),
            },
        );
        let dispatch_handle = dispatcher.spawn();

        // Producer
        let mut producer = Producer::new(source, queue, coordinator.intake_token())
            .with_settings(ProducerSettings::from(&blueprint.producer));
        if blueprint.shutdown.stop_when_exhausted {
            producer = producer.stop_when_exhausted(Arc::clone(&coordinator));
        }
        let producer_handle = tokio::spawn(producer.run());

        info!("Relay running, press Ctrl+C to stop");

        let dispatch = match dispatch_handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "Dispatcher task failed");
                coordinator.cancel();
                None
            }
        };

        let producer = match producer_handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "Producer task failed");
                None
            }
        };

        coordinator.complete();
        if let Err(e) = listener.await {
            error!(error = %e, "Shutdown listener failed");
        }

        let stats = RunStats {
            duration: start_time.elapsed(),
            capacity,
            shutdown_reason: coordinator.reason(),
            producer,
            dispatch,
        };

        info!(
            accepted = stats.accepted(),
            delivered = stats.delivered(),
            duration_secs = stats.duration.as_secs_f64(),
            reason = ?stats.shutdown_reason,
            "Fact relay finished"
        );

        Ok(stats)
    }
}
