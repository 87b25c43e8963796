//! Client for the JPL Horizons ephemeris service

pub mod cached;
pub mod parser;
pub mod query;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::HorizonsConfig;
use crate::models::{ObserverRow, StateVector};
use crate::{AstroViewError, Result};

pub use cached::CachedSource;
pub use query::{Center, ObserverQuery, Params, VectorsQuery};

/// Anything that can produce ephemerides
#[async_trait]
pub trait EphemerisSource: Send + Sync {
    /// Cartesian state vectors, one per epoch, in request order
    async fn vectors(&self, query: &VectorsQuery) -> Result<Vec<StateVector>>;

    /// Observer-table rows, one per epoch, in request order
    async fn observer(&self, query: &ObserverQuery) -> Result<Vec<ObserverRow>>;
}

/// JSON envelope returned by the API
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    signature: Option<ApiSignature>,
}

#[derive(Debug, Deserialize)]
struct ApiSignature {
    version: String,
    source: String,
}

/// Live Horizons API client
pub struct HorizonsClient {
    client: ClientWithMiddleware,
    base_url: String,
    max_rows: u64,
}

impl HorizonsClient {
    pub fn new(config: &HorizonsConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("AstroView/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AstroViewError::network(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('?').to_string(),
            max_rows: config.max_rows.into(),
        })
    }

    fn check_size(&self, estimated: u64) -> Result<()> {
        if estimated > self.max_rows {
            return Err(AstroViewError::validation(format!(
                "request would produce about {estimated} rows, more than the limit of {}",
                self.max_rows
            )));
        }
        Ok(())
    }

    /// Send one request and return the plain-text `result` payload
    async fn fetch(&self, params: &Params) -> Result<String> {
        let url = format!("{}?{}", self.base_url, query::encode_params(params));
        debug!("Horizons API request URL: {}", url);
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("Horizons request failed: {}", e);
            AstroViewError::network(e.to_string())
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AstroViewError::network(format!("Failed to read response body: {e}")))?;

        let duration = start_time.elapsed();
        info!(
            "Horizons answered {} in {:.3}s ({} bytes)",
            status,
            duration.as_secs_f64(),
            body.len()
        );
        if duration.as_secs() > 10 {
            warn!("Slow Horizons response detected: {:.3}s", duration.as_secs_f64());
        }

        decode_body(status, &body)
    }
}

/// Unwrap the JSON envelope, turning service errors into `Api` errors
fn decode_body(status: reqwest::StatusCode, body: &str) -> Result<String> {
    let envelope: Option<ApiResponse> = serde_json::from_str(body).ok();

    if let Some(message) = envelope.as_ref().and_then(|e| e.error.as_deref()) {
        return Err(AstroViewError::api(message.trim()));
    }
    if !status.is_success() {
        let excerpt: String = body.chars().take(200).collect();
        return Err(AstroViewError::api(format!("HTTP {status}: {}", excerpt.trim())));
    }

    let envelope = envelope
        .ok_or_else(|| AstroViewError::parse("response body is not the expected JSON"))?;
    if let Some(signature) = &envelope.signature {
        debug!(
            "Horizons signature: {} version {}",
            signature.source, signature.version
        );
    }
    envelope
        .result
        .ok_or_else(|| AstroViewError::parse("response carries neither result nor error"))
}

#[async_trait]
impl EphemerisSource for HorizonsClient {
    #[instrument(skip(self, query), fields(target = %query.target))]
    async fn vectors(&self, query: &VectorsQuery) -> Result<Vec<StateVector>> {
        self.check_size(query.epochs.estimated_points())?;
        let result = self.fetch(&query.params()).await?;
        parser::parse_vectors(&result, &query.target.id)
    }

    #[instrument(skip(self, query), fields(target = %query.target, site = %query.site))]
    async fn observer(&self, query: &ObserverQuery) -> Result<Vec<ObserverRow>> {
        self.check_size(query.epochs.estimated_points())?;
        let result = self.fetch(&query.params()).await?;
        parser::parse_observer(&result, &query.target.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_decode_body_result() {
        let body = r#"{"signature":{"version":"1.2","source":"NASA/JPL Horizons API"},"result":"$$SOE\n$$EOE"}"#;
        assert_eq!(decode_body(StatusCode::OK, body).unwrap(), "$$SOE\n$$EOE");
    }

    #[test]
    fn test_decode_body_service_error() {
        let body = r#"{"error":"Unknown parameter: FOO","signature":{"version":"1.2","source":"x"}}"#;
        match decode_body(StatusCode::BAD_REQUEST, body) {
            Err(AstroViewError::Api { message }) => assert_eq!(message, "Unknown parameter: FOO"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_body_http_error_without_json() {
        let result = decode_body(StatusCode::SERVICE_UNAVAILABLE, "<html>down</html>");
        assert!(matches!(result, Err(AstroViewError::Api { .. })));
    }

    #[test]
    fn test_decode_body_garbage() {
        let result = decode_body(StatusCode::OK, "not json");
        assert!(matches!(result, Err(AstroViewError::Parse { .. })));
    }

    #[test]
    fn test_row_limit() {
        let config = HorizonsConfig {
            max_rows: 10,
            ..HorizonsConfig::default()
        };
        let client = HorizonsClient::new(&config).unwrap();
        assert!(client.check_size(10).is_ok());
        assert!(matches!(
            client.check_size(11),
            Err(AstroViewError::Validation { .. })
        ));
    }
}
