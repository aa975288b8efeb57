use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{StorefrontError, StorefrontResult};

pub const CONFIG_FILE: &str = "storefront.json";
pub const API_URL_ENV: &str = "STOREFRONT_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";
const DEFAULT_PAGE_SIZE: u32 = 24;
const DEFAULT_FACET_LIMIT: u32 = 1000;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_CONSULTATION_URL: &str = "https://wa.me";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StorefrontConfig {
  pub api_base_url: String,
  pub page_size: u32,
  /// Row cap for the unpaged query that decides which filter options have matches.
  pub facet_limit: u32,
  pub search_debounce_ms: u64,
  pub request_timeout_seconds: u64,
  pub consultation_url: String,
  /// Phone number or handle the consultation link is addressed to.
  pub consultation_contact: String,
}

impl Default for StorefrontConfig {
  fn default() -> Self {
    Self {
      api_base_url: DEFAULT_API_BASE_URL.to_string(),
      page_size: DEFAULT_PAGE_SIZE,
      facet_limit: DEFAULT_FACET_LIMIT,
      search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
      request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
      consultation_url: DEFAULT_CONSULTATION_URL.to_string(),
      consultation_contact: String::new(),
    }
  }
}

impl StorefrontConfig {
  /// Reads `storefront.json` from `app_data_dir` when present, then applies
  /// the environment override for the API base URL.
  pub fn load(app_data_dir: &Path) -> StorefrontResult<Self> {
    let path = app_data_dir.join(CONFIG_FILE);
    let config = if path.exists() {
      let raw = fs::read_to_string(&path)?;
      Self::from_json_str(&raw)?
    } else {
      log::info!("No {} in {}, using defaults.", CONFIG_FILE, app_data_dir.display());
      Self::default()
    };

    config.with_env_override(std::env::var(API_URL_ENV).ok()).validate()
  }

  pub fn from_json_str(raw: &str) -> StorefrontResult<Self> {
    serde_json::from_str(raw)
      .map_err(|e| StorefrontError::Config(format!("Unable to parse {}: {}", CONFIG_FILE, e)))
  }

  pub fn with_env_override(mut self, api_base_url: Option<String>) -> Self {
    if let Some(url) = api_base_url.map(|url| url.trim().to_string()) {
      if !url.is_empty() {
        self.api_base_url = url;
      }
    }
    self
  }

  pub fn validate(self) -> StorefrontResult<Self> {
    Url::parse(&self.api_base_url).map_err(|e| {
      StorefrontError::Config(format!("apiBaseUrl '{}' is not a valid URL: {}", self.api_base_url, e))
    })?;
    Url::parse(&self.consultation_url).map_err(|e| {
      StorefrontError::Config(format!(
        "consultationUrl '{}' is not a valid URL: {}",
        self.consultation_url, e
      ))
    })?;
    if self.page_size == 0 {
      return Err(StorefrontError::Config("pageSize must be at least 1.".to_string()));
    }
    if self.facet_limit == 0 {
      return Err(StorefrontError::Config("facetLimit must be at least 1.".to_string()));
    }
    Ok(self)
  }

  pub fn search_debounce(&self) -> Duration {
    Duration::from_millis(self.search_debounce_ms)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_seconds)
  }
}
