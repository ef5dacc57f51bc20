use std::time::Instant;

use gpipe_definition::Pipeline;
use gpipe_encoding::{WireFormat, encode};
use gpipe_value::Value;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};

const JOBS_PATH: &str = "/api/jobs";

/// Submits pipelines to the orchestrator's jobs endpoint.
///
/// A client is validated when it is built and holds no other state than its
/// connection settings, so it can be shared and reused across submissions.
#[derive(Debug, Clone)]
pub struct Client {
  base_url: String,
  api_key: Option<String>,
  http: reqwest::Client,
}

impl Client {
  /// Create a client for `base_url`, which must be an `http://` or
  /// `https://` URL. A trailing `/` is ignored. An empty key is treated as
  /// no key.
  pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, ClientError> {
    let mut config = ClientConfig::new(base_url);
    config.api_key = api_key.map(str::to_string);
    Self::from_config(&config)
  }

  pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
    let base_url = config
      .base_url
      .as_deref()
      .ok_or_else(|| ClientError::InvalidArgument("base url is not configured".to_string()))?;
    let base_url = validate_base_url(base_url)?;

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.timeout() {
      builder = builder.timeout(timeout);
    }
    let http = builder.build().map_err(TransportError::Request)?;

    Ok(Self {
      base_url,
      api_key: config.api_key().map(str::to_string),
      http,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Endpoint every submission is posted to.
  pub fn jobs_url(&self) -> String {
    format!("{}{}", self.base_url, JOBS_PATH)
  }

  /// Submit a pipeline as a structured document and return the parsed
  /// response body.
  pub async fn run(&self, pipeline: &Pipeline) -> Result<Value, ClientError> {
    self.submit(pipeline, WireFormat::Json).await
  }

  /// Submit a pipeline in the given wire format.
  pub async fn run_as(&self, pipeline: &Pipeline, format: WireFormat) -> Result<Value, ClientError> {
    self.submit(pipeline, format).await
  }

  /// Like [`Client::run_as`], abandoning the request when `cancel` fires.
  pub async fn run_with_cancel(
    &self,
    pipeline: &Pipeline,
    format: WireFormat,
    cancel: CancellationToken,
  ) -> Result<Value, ClientError> {
    tokio::select! {
      result = self.submit(pipeline, format) => result,
      _ = cancel.cancelled() => {
        warn!(url = %self.jobs_url(), "submission cancelled");
        Err(TransportError::Cancelled.into())
      }
    }
  }

  #[instrument(
    name = "submit_pipeline",
    skip(self, pipeline),
    fields(
      base_url = %self.base_url,
      format = %format,
      steps = pipeline.len(),
    )
  )]
  async fn submit(&self, pipeline: &Pipeline, format: WireFormat) -> Result<Value, ClientError> {
    let body = encode(pipeline, format)?;

    let url = self.jobs_url();
    debug!(url = %url, bytes = body.len(), "sending request");

    let mut request = self
      .http
      .post(&url)
      .header(CONTENT_TYPE, format.content_type())
      .body(body);
    if let Some(key) = &self.api_key {
      request = request.bearer_auth(key);
    }

    let started = Instant::now();
    let response = request.send().await.map_err(TransportError::Request)?;
    let status = response.status();
    let text = response.text().await.map_err(TransportError::Request)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if !status.is_success() {
      warn!(status = status.as_u16(), elapsed_ms, "orchestrator rejected pipeline");
      return Err(
        TransportError::Status {
          status: status.as_u16(),
          body: text,
        }
        .into(),
      );
    }

    info!(status = status.as_u16(), elapsed_ms, "pipeline submitted");

    serde_json::from_str(&text).map_err(|source| ClientError::ResponseParse { body: text, source })
  }
}

/// Accept only absolute http(s) URLs with a host. Returns the URL as given,
/// without trailing slashes.
fn validate_base_url(base_url: &str) -> Result<String, ClientError> {
  let parsed = Url::parse(base_url)
    .map_err(|e| ClientError::InvalidArgument(format!("invalid base url '{}': {}", base_url, e)))?;

  if !matches!(parsed.scheme(), "http" | "https") {
    return Err(ClientError::InvalidArgument(format!(
      "base url '{}' must start with http:// or https://",
      base_url
    )));
  }
  if parsed.host_str().is_none_or(str::is_empty) {
    return Err(ClientError::InvalidArgument(format!(
      "base url '{}' has no host",
      base_url
    )));
  }

  Ok(base_url.trim_end_matches('/').to_string())
}
