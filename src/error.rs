use thiserror::Error;

/// Errors raised by the storefront services.
#[derive(Debug, Error)]
pub enum StorefrontError {
  /// The request never produced a response (DNS, connect, timeout, ...).
  #[error("Request to {url} failed: {message}")]
  Transport { url: String, message: String },

  /// The remote answered with a non-success status.
  #[error("Request to {url} failed with status {status}")]
  Status { url: String, status: u16 },

  /// The remote answered, but not with the shape we expect.
  #[error("Unexpected response from {url}: {message}")]
  MalformedResponse { url: String, message: String },

  #[error("Invalid configuration: {0}")]
  Config(String),

  #[error("Storage error: {0}")]
  Storage(#[from] rusqlite::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Not signed in.")]
  Unauthenticated,

  #[error("Invalid username or password.")]
  InvalidCredentials,

  #[error("{0}")]
  InvalidInput(String),
}

impl StorefrontError {
  pub(crate) fn transport(url: &str, error: reqwest::Error) -> Self {
    StorefrontError::Transport {
      url: url.to_string(),
      message: error.to_string(),
    }
  }

  pub(crate) fn malformed(url: &str, message: impl ToString) -> Self {
    StorefrontError::MalformedResponse {
      url: url.to_string(),
      message: message.to_string(),
    }
  }
}

pub type StorefrontResult<T> = Result<T, StorefrontError>;
