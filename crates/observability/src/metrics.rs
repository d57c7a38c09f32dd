//! 转发指标收集模块
//!
//! 通过 `metrics` facade 记录入队、丢弃、投递和关闭事件，
//! 并在内存中聚合投递结果用于运行结束时的摘要。

use contracts::ContractError;
use metrics::{counter, gauge, histogram};

/// 记录事实入队成功
pub fn record_fact_accepted() {
    counter!("fact_relay_facts_accepted_total").increment(1);
}

/// 记录事实被丢弃
///
/// `reason`: "full" / "closed" / "fault"
pub fn record_fact_dropped(reason: &str) {
    counter!(
        "fact_relay_facts_dropped_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 记录队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("fact_relay_queue_depth").set(depth as f64);
}

/// 记录单次投递结果及延迟
pub fn record_delivery(sink_name: &str, success: bool, latency_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "fact_relay_deliveries_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("fact_relay_delivery_latency_ms").record(latency_ms);
}

/// 记录关闭时被放弃的事实
pub fn record_facts_abandoned(count: usize) {
    if count > 0 {
        counter!("fact_relay_facts_abandoned_total").increment(count as u64);
    }
}

/// 记录关闭触发
pub fn record_shutdown(reason: &str) {
    counter!(
        "fact_relay_shutdowns_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 投递结果聚合器
///
/// 在内存中聚合投递结果，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DeliveryStatsAggregator {
    /// 投递尝试总数
    pub total_attempts: u64,

    /// 成功数
    pub delivered: u64,

    /// 失败数 (含超时)
    pub failed: u64,

    /// 超时数
    pub timed_out: u64,

    /// 被远端拒绝数 (非 200)
    pub rejected: u64,

    /// 投递延迟统计 (毫秒)
    pub latency_ms: RunningStats,
}

impl DeliveryStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, result: &Result<(), ContractError>, latency_ms: f64) {
        self.total_attempts += 1;
        self.latency_ms.push(latency_ms);

        match result {
            Ok(()) => self.delivered += 1,
            Err(e) => {
                self.failed += 1;
                if e.is_timeout() {
                    self.timed_out += 1;
                }
                if matches!(e, ContractError::SinkRejected { .. }) {
                    self.rejected += 1;
                }
            }
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DeliverySummary {
        DeliverySummary {
            total_attempts: self.total_attempts,
            delivered: self.delivered,
            failed: self.failed,
            timed_out: self.timed_out,
            rejected: self.rejected,
            success_rate: if self.total_attempts > 0 {
                self.delivered as f64 / self.total_attempts as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_ms),
        }
    }
}

/// 投递摘要
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    pub total_attempts: u64,
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub rejected: u64,
    pub success_rate: f64,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Delivery Summary ===")?;
        writeln!(f, "Attempts: {}", self.total_attempts)?;
        writeln!(
            f,
            "Delivered: {} ({:.2}%)",
            self.delivered, self.success_rate
        )?;
        writeln!(
            f,
            "Failed: {} (timed out: {}, rejected: {})",
            self.failed, self.timed_out, self.rejected
        )?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_classifies_failures() {
        let mut aggregator = DeliveryStatsAggregator::new();

        aggregator.update(&Ok(()), 12.0);
        aggregator.update(
            &Err(ContractError::DeliveryTimeout {
                sink_name: "kpi".into(),
                timeout_ms: 50,
            }),
            50.0,
        );
        aggregator.update(
            &Err(ContractError::SinkRejected {
                sink_name: "kpi".into(),
                status: 500,
                body: "boom".into(),
            }),
            8.0,
        );
        aggregator.update(&Err(ContractError::sink_delivery("kpi", "reset")), 3.0);

        assert_eq!(aggregator.total_attempts, 4);
        assert_eq!(aggregator.delivered, 1);
        assert_eq!(aggregator.failed, 3);
        assert_eq!(aggregator.timed_out, 1);
        assert_eq!(aggregator.rejected, 1);

        let summary = aggregator.summary();
        assert!((summary.success_rate - 25.0).abs() < 1e-10);
        assert_eq!(summary.latency_ms.count, 4);
        assert!((summary.latency_ms.max - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = DeliveryStatsAggregator::new().summary();
        let output = summary.to_string();
        assert!(output.contains("Attempts: 0"));
        assert!(output.contains("Latency (ms): N/A"));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DeliveryStatsAggregator::new();
        aggregator.update(&Ok(()), 10.0);
        aggregator.update(&Ok(()), 20.0);

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Delivered: 2 (100.00%)"));
        assert!(output.contains("n=2"));
    }

    #[test]
    fn test_record_functions_without_recorder() {
        record_fact_accepted();
        record_fact_dropped("full");
        record_queue_depth(3);
        record_delivery("kpi", true, 1.5);
        record_facts_abandoned(0);
        record_shutdown("signal");
    }
}
