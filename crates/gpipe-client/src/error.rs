use std::path::PathBuf;

use gpipe_value::EncodingError;
use thiserror::Error;

/// Errors returned by [`crate::Client`].
#[derive(Debug, Error)]
pub enum ClientError {
  /// Bad construction argument, such as a base URL without an http(s) scheme.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// The config file exists but could not be read or parsed.
  #[error("invalid config file {}: {message}", path.display())]
  Config { path: PathBuf, message: String },

  /// The pipeline could not be normalized or encoded.
  #[error("failed to encode pipeline: {0}")]
  Encoding(#[from] EncodingError),

  /// The request did not complete with a success status.
  #[error(transparent)]
  Transport(#[from] TransportError),

  /// The request succeeded but the body is not a valid document.
  #[error("failed to parse response body: {source}")]
  ResponseParse {
    body: String,
    #[source]
    source: serde_json::Error,
  },
}

impl ClientError {
  /// Whether retrying the same submission may succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      ClientError::Transport(e) => e.is_retryable(),
      _ => false,
    }
  }
}

/// Failures at the HTTP layer.
#[derive(Debug, Error)]
pub enum TransportError {
  /// Connection failure, timeout, or an error reading the body.
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  /// The orchestrator answered with a non-success status.
  #[error("orchestrator returned status {status}: {body}")]
  Status { status: u16, body: String },

  #[error("request cancelled")]
  Cancelled,
}

impl TransportError {
  pub fn status(&self) -> Option<u16> {
    match self {
      TransportError::Status { status, .. } => Some(*status),
      TransportError::Request(e) => e.status().map(|s| s.as_u16()),
      TransportError::Cancelled => None,
    }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, TransportError::Request(e) if e.is_timeout())
  }

  /// Timeouts, connection failures, 429 and 5xx responses. The client
  /// itself never retries.
  pub fn is_retryable(&self) -> bool {
    match self {
      TransportError::Request(e) => e.is_timeout() || e.is_connect(),
      TransportError::Status { status, .. } => *status == 429 || *status >= 500,
      TransportError::Cancelled => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn status(code: u16) -> TransportError {
    TransportError::Status {
      status: code,
      body: String::new(),
    }
  }

  #[test]
  fn test_status_retryability() {
    assert!(status(500).is_retryable());
    assert!(status(503).is_retryable());
    assert!(status(429).is_retryable());
    assert!(!status(400).is_retryable());
    assert!(!status(404).is_retryable());
  }

  #[test]
  fn test_cancelled_is_not_retryable() {
    assert!(!TransportError::Cancelled.is_retryable());
    assert_eq!(TransportError::Cancelled.status(), None);
  }

  #[test]
  fn test_client_error_delegates_retryability() {
    assert!(ClientError::from(status(502)).is_retryable());
    assert!(!ClientError::InvalidArgument("x".to_string()).is_retryable());
  }

  #[test]
  fn test_status_message_carries_body() {
    let err = TransportError::Status {
      status: 422,
      body: "bad step".to_string(),
    };
    assert_eq!(err.to_string(), "orchestrator returned status 422: bad step");
    assert_eq!(err.status(), Some(422));
  }
}
