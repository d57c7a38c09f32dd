//! LogSink - logs each fact via tracing

use std::time::Instant;

use contracts::{ContractError, FactEnvelope, FactSink};
use tracing::{info, instrument};

/// Sink that only logs facts (dry runs / debugging)
pub struct LogSink {
    name: String,
    logged: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logged: 0,
        }
    }

    /// Facts logged so far
    pub fn logged(&self) -> u64 {
        self.logged
    }
}

impl FactSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_deliver",
        skip(self, fact, _deadline),
        fields(sink = %self.name, seq = fact.seq)
    )]
    async fn deliver(&mut self, fact: &FactEnvelope, _deadline: Instant) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            seq = fact.seq,
            indicator = fact.fact.indicator_to_mo_id,
            value = fact.fact.value,
            period = %fact.fact.period_key,
            comment = %fact.fact.comment,
            "Fact received"
        );
        self.logged += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, logged = self.logged, "LogSink closed");
        Ok(())
    }
}
