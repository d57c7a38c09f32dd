//! RelayBlueprint - Config Loader 输出
//!
//! 描述完整的转发配置：队列容量、事实来源、投递目标、关闭策略。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的转发配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 队列设置
    #[serde(default)]
    pub queue: QueueConfig,

    /// 事实来源设置
    #[serde(default)]
    pub producer: ProducerConfig,

    /// 投递目标
    pub sink: SinkConfig,

    /// 关闭策略
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// 有界队列配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// 队列容量，必须 > 0
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1000
}

/// 事实来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// 按模板生成的合成数据
    #[default]
    Synthetic,
    /// 每行一个 JSON 事实的文件
    JsonLines,
}

/// 生产者配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// 来源类型
    #[serde(default)]
    pub source: SourceType,

    /// 合成事实数量 (仅 synthetic)
    #[serde(default = "default_fact_count")]
    pub count: u64,

    /// 两次入队之间的间隔 (毫秒)，0 = 不等待
    #[serde(default)]
    pub interval_ms: u64,

    /// comment 字段前缀 (仅 synthetic)
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,

    /// 输入文件路径 (仅 json_lines)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// 合成事实模板
    #[serde(default)]
    pub template: FactTemplate,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            source: SourceType::default(),
            count: default_fact_count(),
            interval_ms: 0,
            comment_prefix: default_comment_prefix(),
            path: None,
            template: FactTemplate::default(),
        }
    }
}

impl ProducerConfig {
    /// 入队间隔，None = 不等待
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }
}

fn default_fact_count() -> u64 {
    10
}

fn default_comment_prefix() -> String {
    "buffer test".to_string()
}

/// 合成事实模板 (除 value / comment 外的固定字段)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactTemplate {
    pub period_start: String,
    pub period_end: String,
    pub period_key: String,
    pub indicator_to_mo_id: i64,
    pub indicator_to_mo_fact_id: i64,
    pub fact_time: String,
    pub is_plan: i64,
    pub auth_user_id: i64,
}

impl Default for FactTemplate {
    fn default() -> Self {
        Self {
            period_start: "2024-12-01".to_string(),
            period_end: "2024-12-31".to_string(),
            period_key: "month".to_string(),
            indicator_to_mo_id: 227373,
            indicator_to_mo_fact_id: 0,
            fact_time: "2024-12-31".to_string(),
            is_plan: 0,
            auth_user_id: 40,
        }
    }
}

/// 投递目标配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// 名称 (日志/指标标签)
    pub name: String,

    /// 目标类型
    pub sink_type: SinkType,

    /// 单次投递超时 (毫秒)
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,

    /// 目标特定参数 (url / auth_token / path ...)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// 单次投递超时
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

fn default_delivery_timeout_ms() -> u64 {
    10_000
}

/// 投递目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 表单编码 HTTP POST
    Http,
    /// 仅记录日志
    Log,
    /// 追加写入 JSON Lines 文件
    File,
}

/// 关闭策略配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 关闭后继续排空队列的最长时间 (毫秒)，0 = 立即放弃剩余事实
    #[serde(default)]
    pub drain_grace_ms: u64,

    /// 来源耗尽后自动触发关闭
    #[serde(default)]
    pub stop_when_exhausted: bool,
}

impl ShutdownConfig {
    /// 排空宽限期，None = 放弃剩余事实
    pub fn drain_grace(&self) -> Option<Duration> {
        (self.drain_grace_ms > 0).then(|| Duration::from_millis(self.drain_grace_ms))
    }
}
