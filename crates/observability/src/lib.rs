//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出
//! - 投递结果统计 (延迟、成功率)
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::metrics;
//!
//! observability::init_logging(&observability::LoggingConfig::default())?;
//!
//! let started = std::time::Instant::now();
//! let result = sink.deliver(&fact, deadline).await;
//! let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
//! metrics::record_delivery(sink.name(), result.is_ok(), latency_ms);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_delivery, record_fact_accepted, record_fact_dropped, record_facts_abandoned,
    record_queue_depth, record_shutdown, DeliveryStatsAggregator, DeliverySummary, RunningStats,
    StatsSummary,
};

/// 日志初始化配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志格式
    pub format: LogFormat,
    /// 未设置 RUST_LOG 时的默认级别
    pub default_level: &'static str,
    /// 为 true 时忽略 RUST_LOG，固定使用 `default_level`
    pub ignore_env: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_level: "info",
            ignore_env: false,
        }
    }
}

impl LoggingConfig {
    /// 由 `-v` 次数与 `-q` 推导级别
    ///
    /// `quiet` 固定为 warn；否则 0 = info, 1 = debug, 2+ = trace。
    pub fn from_verbosity(format: LogFormat, verbose: u8, quiet: bool) -> Self {
        let default_level = if quiet {
            "warn"
        } else {
            match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        Self {
            format,
            default_level,
            ignore_env: quiet,
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.ignore_env {
            return EnvFilter::new(self.default_level);
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_level))
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    #[default]
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 初始化全局 tracing subscriber
///
/// 只能成功调用一次；重复调用返回错误。
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(
        format = ?config.format,
        default_level = config.default_level,
        "Logging initialized"
    );
    Ok(())
}

/// 仅初始化 Prometheus 指标（不初始化 Tracing）
///
/// 在 `init_logging` 之后调用；`port` 上提供 `/metrics`。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
