//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RelayBlueprint, SinkType, SourceType};
use serde::Serialize;
use tracing::info;

use super::{has_auth_token, load_blueprint};
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    capacity: usize,
    source: String,
    sink: String,
    sink_type: String,
    drain_grace_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_blueprint(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint, args.auth_token.as_deref());
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    capacity: blueprint.queue.capacity,
                    source: format!("{:?}", blueprint.producer.source),
                    sink: blueprint.sink.name.clone(),
                    sink_type: format!("{:?}", blueprint.sink.sink_type),
                    drain_grace_ms: blueprint.shutdown.drain_grace_ms,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RelayBlueprint, auth_token: Option<&str>) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sink.sink_type == SinkType::Http && !has_auth_token(blueprint, auth_token) {
        warnings.push(
            "No sink.params.auth_token - set FACT_RELAY_AUTH_TOKEN or pass --auth-token"
                .to_string(),
        );
    }

    if blueprint.producer.source == SourceType::Synthetic
        && blueprint.queue.capacity < blueprint.producer.count as usize
        && blueprint.producer.interval().is_none()
    {
        warnings.push(format!(
            "queue.capacity ({}) is below producer.count ({}) with no interval - facts may be dropped",
            blueprint.queue.capacity, blueprint.producer.count
        ));
    }

    if blueprint.shutdown.stop_when_exhausted && blueprint.shutdown.drain_grace().is_none() {
        warnings.push(
            "stop_when_exhausted with drain_grace_ms = 0 abandons facts still buffered".to_string(),
        );
    }

    if let Some(grace) = blueprint.shutdown.drain_grace() {
        if grace < blueprint.sink.delivery_timeout() {
            warnings.push(format!(
                "drain_grace_ms ({}) is shorter than delivery_timeout_ms ({})",
                blueprint.shutdown.drain_grace_ms, blueprint.sink.delivery_timeout_ms
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Capacity: {}", summary.capacity);
            println!("  Source: {}", summary.source);
            println!("  Sink: {} ({})", summary.sink, summary.sink_type);
            println!("  Drain grace (ms): {}", summary.drain_grace_ms);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
