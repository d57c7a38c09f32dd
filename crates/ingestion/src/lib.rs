//! # Ingestion
//!
//! Fact production module.
//!
//! Responsibilities:
//! - Pull facts from a `FactSource` (synthetic generator or JSON Lines file)
//! - Offer them to the bounded queue without ever blocking
//! - Stop promptly on cancellation, optionally trigger shutdown on exhaustion
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{ConfiguredSource, Producer, ProducerSettings};
//!
//! let source = ConfiguredSource::from_config(&blueprint.producer).await?;
//! let producer = Producer::new(source, queue.clone(), coordinator.intake_token())
//!     .with_settings(ProducerSettings::from(&blueprint.producer));
//! let report = tokio::spawn(producer.run()).await?;
//! println!("accepted {} facts", report.accepted);
//! ```

mod config;
mod error;
mod producer;
mod sources;

// Re-exports
pub use config::{ProducerMetrics, ProducerMetricsSnapshot, ProducerSettings};
pub use contracts::{Fact, FactEnvelope, FactSource};
pub use error::{IngestionError, Result};
pub use producer::{Producer, ProducerExit, ProducerReport};
pub use sources::{ConfiguredSource, JsonLinesSource, SyntheticSource};
