//! FileSink - appends one JSON line per fact

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use contracts::{ContractError, FactEnvelope, FactSink};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file, appended to
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;
        Ok(Self { path })
    }
}

/// Sink that captures facts to a JSON Lines file
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl FileSink {
    /// Open (or create) the output file in append mode
    pub async fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await?;

        let name = name.into();
        debug!(sink = %name, path = %config.path.display(), "FileSink opened");

        Ok(Self {
            name,
            config,
            writer: Some(BufWriter::new(file)),
            written: 0,
        })
    }

    /// Create from params map (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Self::new(name, config).await
    }

    /// Facts written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, ContractError> {
        self.writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_delivery(&self.name, "file already closed"))
    }
}

impl FactSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_deliver",
        skip(self, fact, _deadline),
        fields(sink = %self.name, seq = fact.seq)
    )]
    async fn deliver(&mut self, fact: &FactEnvelope, _deadline: Instant) -> Result<(), ContractError> {
        let mut line = serde_json::to_vec(&fact.fact)
            .map_err(|e| ContractError::sink_delivery(&self.name, format!("json error: {e}")))?;
        line.push(b'\n');

        self.writer()?.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().await?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            writer.shutdown().await?;
        }
        debug!(
            sink = %self.name,
            path = %self.config.path.display(),
            written = self.written,
            "FileSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::tests::sample_envelope;
    use contracts::Fact;
    use std::time::Duration;

    #[tokio::test]
    async fn test_file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("facts.jsonl");
        let config = FileSinkConfig { path: path.clone() };
        let deadline = Instant::now() + Duration::from_secs(1);

        let mut sink = FileSink::new("capture", config.clone()).await.unwrap();
        sink.deliver(&sample_envelope(1), deadline).await.unwrap();
        sink.deliver(&sample_envelope(2), deadline).await.unwrap();
        sink.close().await.unwrap();

        // reopening appends instead of truncating
        let mut sink = FileSink::new("capture", config).await.unwrap();
        sink.deliver(&sample_envelope(3), deadline).await.unwrap();
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let values: Vec<i64> = content
            .lines()
            .map(|l| serde_json::from_str::<Fact>(l).unwrap().value)
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_deliver_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("facts.jsonl"),
        };
        let mut sink = FileSink::new("capture", config).await.unwrap();
        sink.close().await.unwrap();

        let result = sink
            .deliver(&sample_envelope(1), Instant::now() + Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(ContractError::SinkDelivery { .. })));
    }

    #[test]
    fn test_config_requires_path() {
        assert!(FileSinkConfig::from_params(&HashMap::new()).is_err());
    }
}
