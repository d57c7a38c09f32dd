//! Sink implementations
//!
//! Contains HttpSink, LogSink and FileSink, plus the config-driven
//! [`ConfiguredSink`] wrapper used by the CLI.

mod file;
mod http;
mod log;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::http::{HttpSink, HttpSinkConfig, DEFAULT_REQUEST_TIMEOUT};
pub use self::log::LogSink;

use std::time::Instant;

use contracts::{ContractError, FactEnvelope, FactSink, SinkConfig, SinkType};
use secrecy::SecretString;
use tracing::instrument;

use crate::error::DispatcherError;

/// Sink selected by configuration
pub enum ConfiguredSink {
    Http(HttpSink),
    Log(LogSink),
    File(FileSink),
}

/// Create a sink from configuration
///
/// `auth_token` overrides `sink.params.auth_token` for the HTTP sink.
#[instrument(
    name = "dispatcher_create_sink",
    skip(config, auth_token),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink(
    config: &SinkConfig,
    auth_token: Option<SecretString>,
) -> Result<ConfiguredSink, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(ConfiguredSink::Log(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(ConfiguredSink::File(sink))
        }
        SinkType::Http => {
            let mut http_config = HttpSinkConfig::from_params(&config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e))?;
            if let Some(token) = auth_token {
                http_config.auth_token = Some(token);
            }
            let sink = HttpSink::new(&config.name, http_config)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(ConfiguredSink::Http(sink))
        }
    }
}

impl FactSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Http(s) => s.name(),
            Self::Log(s) => s.name(),
            Self::File(s) => s.name(),
        }
    }

    async fn deliver(&mut self, fact: &FactEnvelope, deadline: Instant) -> Result<(), ContractError> {
        match self {
            Self::Http(s) => s.deliver(fact, deadline).await,
            Self::Log(s) => s.deliver(fact, deadline).await,
            Self::File(s) => s.deliver(fact, deadline).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Http(s) => s.flush().await,
            Self::Log(s) => s.flush().await,
            Self::File(s) => s.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Http(s) => s.close().await,
            Self::Log(s) => s.close().await,
            Self::File(s) => s.close().await,
        }
    }
}
