//! # Dispatcher
//!
//! 事实投递模块。
//!
//! 负责：
//! - 从有界队列消费 `FactEnvelope`
//! - 每个事实只投递一次 (无重试、无重排、无批量)
//! - 单次投递受超时约束，失败只记录不中断
//! - 关闭时 flush / close sink

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use contracts::{FactEnvelope, FactSink};
pub use dispatcher::{DispatchExit, DispatchReport, Dispatcher, DispatcherConfig};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use sinks::{
    create_sink, ConfiguredSink, FileSink, FileSinkConfig, HttpSink, HttpSinkConfig, LogSink,
};
