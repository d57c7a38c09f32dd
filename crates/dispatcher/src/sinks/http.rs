//! HttpSink - form-encoded POST with bearer auth

use std::collections::HashMap;
use std::time::{Duration, Instant};

use contracts::{ContractError, FactEnvelope, FactSink};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument};

/// Client-side request timeout when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for HttpSink
#[derive(Debug)]
pub struct HttpSinkConfig {
    /// Endpoint receiving the POST
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present
    pub auth_token: Option<SecretString>,
    /// Upper bound for one request, further capped by the delivery deadline
    pub request_timeout: Duration,
}

impl HttpSinkConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }

    /// Create config from params map
    ///
    /// Recognised keys: `url` (required), `auth_token`, `request_timeout_ms`.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let url = params
            .get("url")
            .ok_or_else(|| "missing 'url' parameter".to_string())?;

        let request_timeout = match params.get("request_timeout_ms") {
            Some(raw) => {
                let ms: u64 = raw
                    .parse()
                    .map_err(|e| format!("invalid request_timeout_ms '{raw}': {e}"))?;
                Duration::from_millis(ms)
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            url: url.clone(),
            auth_token: params
                .get("auth_token")
                .map(|t| SecretString::from(t.as_str())),
            request_timeout,
        })
    }
}

/// Sink that POSTs each fact to a remote endpoint
pub struct HttpSink {
    name: String,
    config: HttpSinkConfig,
    client: Client,
}

impl HttpSink {
    /// Create a new HttpSink
    pub fn new(name: impl Into<String>, config: HttpSinkConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        debug!(
            sink = %name,
            url = %config.url,
            authenticated = config.auth_token.is_some(),
            "HttpSink created"
        );

        Ok(Self {
            name,
            config,
            client,
        })
    }

    /// Create from params (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = HttpSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;
        Self::new(name, config)
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn timeout_error(&self, timeout: Duration) -> ContractError {
        ContractError::DeliveryTimeout {
            sink_name: self.name.clone(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

impl FactSink for HttpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sink_deliver",
        skip(self, fact, deadline),
        fields(sink = %self.name, seq = fact.seq)
    )]
    async fn deliver(&mut self, fact: &FactEnvelope, deadline: Instant) -> Result<(), ContractError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(self.timeout_error(remaining));
        }
        let timeout = remaining.min(self.config.request_timeout);

        let mut request = self
            .client
            .post(self.config.url.as_str())
            .timeout(timeout)
            .form(&fact.fact);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error(timeout)
            } else {
                ContractError::sink_delivery(&self.name, format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error(timeout)
            } else {
                ContractError::sink_delivery(&self.name, format!("failed to read response: {e}"))
            }
        })?;

        info!(
            sink = %self.name,
            seq = fact.seq,
            status = status.as_u16(),
            body = %body,
            "Server response"
        );

        if status != StatusCode::OK {
            return Err(ContractError::SinkRejected {
                sink_name: self.name.clone(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    #[instrument(name = "http_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Every delivery is a complete request
        Ok(())
    }

    #[instrument(name = "http_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "HttpSink closed");
        Ok(())
    }
}
