//! Fact source implementations
//!
//! Contains SyntheticSource and JsonLinesSource.

mod json_lines;
mod synthetic;

pub use self::json_lines::JsonLinesSource;
pub use self::synthetic::SyntheticSource;

use contracts::{ContractError, Fact, FactSource, ProducerConfig, SourceType};

use crate::error::{IngestionError, Result};

/// Source selected by configuration
pub enum ConfiguredSource {
    Synthetic(SyntheticSource),
    JsonLines(JsonLinesSource),
}

impl ConfiguredSource {
    /// Build the source described by `config`
    pub async fn from_config(config: &ProducerConfig) -> Result<Self> {
        match config.source {
            SourceType::Synthetic => Ok(Self::Synthetic(SyntheticSource::from_config(config))),
            SourceType::JsonLines => {
                let path = config
                    .path
                    .as_ref()
                    .ok_or_else(|| IngestionError::MissingSetting {
                        source_name: "json_lines".to_string(),
                        field: "path".to_string(),
                    })?;
                Ok(Self::JsonLines(JsonLinesSource::open(path).await?))
            }
        }
    }
}

impl FactSource for ConfiguredSource {
    fn name(&self) -> &str {
        match self {
            Self::Synthetic(s) => s.name(),
            Self::JsonLines(s) => s.name(),
        }
    }

    async fn next_fact(&mut self) -> std::result::Result<Option<Fact>, ContractError> {
        match self {
            Self::Synthetic(s) => s.next_fact().await,
            Self::JsonLines(s) => s.next_fact().await,
        }
    }
}
