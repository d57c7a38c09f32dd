//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{RelayBlueprint, SinkType, SourceType};
use std::time::Duration;
use tracing::info;

use super::{cli_auth_token, load_blueprint};
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        capacity = blueprint.queue.capacity,
        source = ?blueprint.producer.source,
        sink = %blueprint.sink.name,
        sink_type = ?blueprint.sink.sink_type,
        drain_grace_ms = blueprint.shutdown.drain_grace_ms,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        auth_token: cli_auth_token(args.auth_token.as_deref()),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    info!("Starting relay...");
    let stats = Pipeline::new(pipeline_config)
        .run()
        .await
        .context("Relay execution failed")?;

    stats.print_summary();
    Ok(())
}

/// Apply CLI overrides, then re-validate the result
fn apply_overrides(blueprint: &mut RelayBlueprint, args: &RunArgs) -> Result<(), CliError> {
    if let Some(capacity) = args.capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        blueprint.queue.capacity = capacity;
    }
    if let Some(ref url) = args.url {
        if blueprint.sink.sink_type != SinkType::Http {
            return Err(CliError::invalid_override(
                "url",
                format!("sink '{}' is not an http sink", blueprint.sink.name),
            ));
        }
        info!(url = %url, "Overriding sink url from CLI");
        blueprint.sink.params.insert("url".to_string(), url.clone());
    }
    if let Some(count) = args.count {
        if blueprint.producer.source != SourceType::Synthetic {
            return Err(CliError::invalid_override(
                "count",
                "only the synthetic source takes a count",
            ));
        }
        info!(count, "Overriding synthetic fact count from CLI");
        blueprint.producer.count = count;
    }
    if let Some(grace_ms) = args.drain_grace_ms {
        info!(grace_ms, "Overriding drain grace from CLI");
        blueprint.shutdown.drain_grace_ms = grace_ms;
    }
    if args.stop_when_exhausted {
        blueprint.shutdown.stop_when_exhausted = true;
    }

    config_loader::ConfigLoader::validate(blueprint)?;
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RelayBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Queue:");
    println!("  Capacity: {}", blueprint.queue.capacity);

    let producer = &blueprint.producer;
    println!("\nProducer:");
    println!("  Source: {:?}", producer.source);
    match producer.source {
        SourceType::Synthetic => {
            println!("  Count: {}", producer.count);
            println!("  Comment prefix: {}", producer.comment_prefix);
        }
        SourceType::JsonLines => {
            if let Some(ref path) = producer.path {
                println!("  Path: {}", path.display());
            }
        }
    }
    if let Some(interval) = producer.interval() {
        println!("  Interval: {:?}", interval);
    }

    let sink = &blueprint.sink;
    println!("\nSink:");
    println!("  {} ({:?})", sink.name, sink.sink_type);
    println!("  Delivery timeout: {:?}", sink.delivery_timeout());
    if let Some(url) = sink.params.get("url") {
        println!("  Url: {}", url);
    }

    println!("\nShutdown:");
    match blueprint.shutdown.drain_grace() {
        Some(grace) => println!("  Policy: drain for up to {:?}", grace),
        None => println!("  Policy: abandon buffered facts"),
    }
    println!(
        "  Stop when exhausted: {}",
        blueprint.shutdown.stop_when_exhausted
    );

    println!();
}
