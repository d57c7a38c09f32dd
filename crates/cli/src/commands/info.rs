//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{FactTemplate, RelayBlueprint, SinkType, SourceType};
use serde::Serialize;
use tracing::info;

use super::{has_auth_token, load_blueprint};
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    queue: QueueInfo,
    producer: ProducerInfo,
    sink: SinkInfo,
    shutdown: ShutdownInfo,
}

#[derive(Serialize)]
struct QueueInfo {
    capacity: usize,
}

#[derive(Serialize)]
struct ProducerInfo {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<FactTemplate>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    delivery_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    authenticated: bool,
}

#[derive(Serialize)]
struct ShutdownInfo {
    policy: String,
    drain_grace_ms: u64,
    stop_when_exhausted: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &RelayBlueprint, args: &InfoArgs) -> ConfigInfo {
    let producer = &blueprint.producer;
    let synthetic = producer.source == SourceType::Synthetic;

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        queue: QueueInfo {
            capacity: blueprint.queue.capacity,
        },
        producer: ProducerInfo {
            source: format!("{:?}", producer.source),
            count: synthetic.then_some(producer.count),
            path: producer.path.as_ref().map(|p| p.display().to_string()),
            interval_ms: producer.interval_ms,
            template: (synthetic && args.template).then(|| producer.template.clone()),
        },
        sink: SinkInfo {
            name: blueprint.sink.name.clone(),
            sink_type: format!("{:?}", blueprint.sink.sink_type),
            delivery_timeout_ms: blueprint.sink.delivery_timeout_ms,
            url: blueprint.sink.params.get("url").cloned(),
            authenticated: has_auth_token(blueprint, args.auth_token.as_deref()),
        },
        shutdown: ShutdownInfo {
            policy: policy_label(blueprint).to_string(),
            drain_grace_ms: blueprint.shutdown.drain_grace_ms,
            stop_when_exhausted: blueprint.shutdown.stop_when_exhausted,
        },
    }
}

fn policy_label(blueprint: &RelayBlueprint) -> &'static str {
    if blueprint.shutdown.drain_grace().is_some() {
        "drain"
    } else {
        "abandon"
    }
}

fn print_config_info(blueprint: &RelayBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Fact Relay Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📦 Queue");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   └─ Capacity: {}", blueprint.queue.capacity);

    let producer = &blueprint.producer;
    println!("\n📥 Producer");
    println!("   ├─ Source: {:?}", producer.source);
    match producer.source {
        SourceType::Synthetic => {
            println!("   ├─ Count: {}", producer.count);
            println!("   ├─ Comment prefix: {}", producer.comment_prefix);
        }
        SourceType::JsonLines => {
            let path = producer
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!("   ├─ Path: {}", path);
        }
    }
    println!("   └─ Interval (ms): {}", producer.interval_ms);

    if args.template && producer.source == SourceType::Synthetic {
        let t = &producer.template;
        println!("      📝 Template:");
        println!("         ├─ period: {} .. {} ({})", t.period_start, t.period_end, t.period_key);
        println!("         ├─ indicator_to_mo_id: {}", t.indicator_to_mo_id);
        println!("         ├─ indicator_to_mo_fact_id: {}", t.indicator_to_mo_fact_id);
        println!("         ├─ fact_time: {}", t.fact_time);
        println!("         ├─ is_plan: {}", t.is_plan);
        println!("         └─ auth_user_id: {}", t.auth_user_id);
    }

    let sink = &blueprint.sink;
    println!("\n📤 Sink");
    println!("   ├─ {} ({:?})", sink.name, sink.sink_type);
    if let Some(url) = sink.params.get("url") {
        println!("   ├─ Url: {}", url);
    }
    if let Some(path) = sink.params.get("path") {
        println!("   ├─ Path: {}", path);
    }
    if sink.sink_type == SinkType::Http {
        println!(
            "   ├─ Bearer token: {}",
            if has_auth_token(blueprint, args.auth_token.as_deref()) {
                "set"
            } else {
                "missing"
            }
        );
    }
    println!("   └─ Delivery timeout (ms): {}", sink.delivery_timeout_ms);

    println!("\n⚙️  Shutdown");
    println!("   ├─ Policy: {}", policy_label(blueprint));
    println!("   ├─ Drain grace (ms): {}", blueprint.shutdown.drain_grace_ms);
    println!(
        "   └─ Stop when exhausted: {}",
        blueprint.shutdown.stop_when_exhausted
    );

    println!();
}
