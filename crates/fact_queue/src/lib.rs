//! # Fact Queue
//!
//! 有界事实队列。
//!
//! 负责：
//! - 非阻塞入队，满时丢弃新条目 (`Enqueue::Dropped`)
//! - FIFO 出队，可被取消令牌中断
//! - 关闭写端后继续排空，最后返回 `Dequeued::Closed`

mod error;
mod metrics;
mod queue;

pub use error::QueueError;
pub use metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use queue::{BoundedQueue, Dequeued, DropReason, Enqueue};
pub use tokio_util::sync::CancellationToken;
