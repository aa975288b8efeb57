use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::Authenticator;
use crate::config::StorefrontConfig;
use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{Category, Collection, Page, ProductDraft, ProductSummary};
use crate::source::{ProductQuery, ProductSource};

const CLIENT_USER_AGENT: &str = concat!("storefront-desktop/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct DataPayload<T> {
  data: Vec<T>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
  token: String,
}

/// reqwest client for the storefront REST API.
#[derive(Clone)]
pub struct HttpStorefrontApi {
  client: Client,
  base_url: String,
}

impl HttpStorefrontApi {
  pub fn new(config: &StorefrontConfig) -> StorefrontResult<Self> {
    let client = Client::builder()
      .timeout(config.request_timeout())
      .build()
      .map_err(|e| StorefrontError::Config(e.to_string()))?;

    Ok(Self {
      client,
      base_url: config.api_base_url.trim_end_matches('/').to_string(),
    })
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.base_url, path.trim_start_matches('/'))
  }

  async fn send(&self, url: &str, request: RequestBuilder) -> StorefrontResult<String> {
    let response = request
      .header(USER_AGENT, CLIENT_USER_AGENT)
      .header(ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| StorefrontError::transport(url, e))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
      return Err(StorefrontError::Unauthenticated);
    }
    if !status.is_success() {
      return Err(StorefrontError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    response.text().await.map_err(|e| StorefrontError::transport(url, e))
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> StorefrontResult<T> {
    let url = self.endpoint(path);
    log::debug!("GET {} {:?}", url, params);
    let body = self.send(&url, self.client.get(&url).query(params)).await?;
    serde_json::from_str(&body).map_err(|e| StorefrontError::malformed(&url, e))
  }

  /// Metadata lists come back bare or wrapped in `{ "data": [...] }`.
  async fn get_list<T: DeserializeOwned>(&self, path: &str) -> StorefrontResult<Vec<T>> {
    let url = self.endpoint(path);
    let body = self.send(&url, self.client.get(&url)).await?;

    if let Ok(parsed) = serde_json::from_str::<Vec<T>>(&body) {
      return Ok(parsed);
    }
    if let Ok(parsed) = serde_json::from_str::<DataPayload<T>>(&body) {
      return Ok(parsed.data);
    }
    Err(StorefrontError::malformed(&url, "expected a JSON array"))
  }

  pub async fn create_product(&self, token: &str, draft: &ProductDraft) -> StorefrontResult<ProductSummary> {
    let url = self.endpoint("products");
    let body = self
      .send(&url, self.client.post(&url).bearer_auth(token).json(draft))
      .await?;
    serde_json::from_str(&body).map_err(|e| StorefrontError::malformed(&url, e))
  }

  pub async fn update_product(
    &self,
    token: &str,
    product_id: &str,
    draft: &ProductDraft,
  ) -> StorefrontResult<ProductSummary> {
    let url = self.endpoint(&format!("products/{}", product_id));
    let body = self
      .send(&url, self.client.put(&url).bearer_auth(token).json(draft))
      .await?;
    serde_json::from_str(&body).map_err(|e| StorefrontError::malformed(&url, e))
  }

  pub async fn delete_product(&self, token: &str, product_id: &str) -> StorefrontResult<()> {
    let url = self.endpoint(&format!("products/{}", product_id));
    self.send(&url, self.client.delete(&url).bearer_auth(token)).await?;
    Ok(())
  }
}

#[async_trait]
impl ProductSource for HttpStorefrontApi {
  async fn list_products(&self, query: &ProductQuery) -> StorefrontResult<Page<ProductSummary>> {
    self.get_json("products", &query.to_params()).await
  }

  async fn list_categories(&self) -> StorefrontResult<Vec<Category>> {
    self.get_list("categories").await
  }

  async fn list_collections(&self) -> StorefrontResult<Vec<Collection>> {
    self.get_list("collections").await
  }
}

#[async_trait]
impl Authenticator for HttpStorefrontApi {
  async fn login(&self, username: &str, password: &str) -> StorefrontResult<String> {
    let url = self.endpoint("auth/login");
    let request = self.client.post(&url).json(&LoginRequest { username, password });
    let body = match self.send(&url, request).await {
      Err(StorefrontError::Unauthenticated) => return Err(StorefrontError::InvalidCredentials),
      other => other?,
    };
    let parsed: LoginResponse = serde_json::from_str(&body).map_err(|e| StorefrontError::malformed(&url, e))?;
    Ok(parsed.token)
  }
}
