use std::sync::Arc;

use crate::api::HttpStorefrontApi;
use crate::auth::AuthService;
use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{ProductDraft, ProductSummary};

/// Product CRUD for signed-in admins.
#[derive(Clone)]
pub struct AdminClient {
  api: HttpStorefrontApi,
  auth: Arc<AuthService>,
}

impl AdminClient {
  pub fn new(api: HttpStorefrontApi, auth: Arc<AuthService>) -> Self {
    Self { api, auth }
  }

  fn token(&self) -> StorefrontResult<String> {
    self.auth.token().ok_or(StorefrontError::Unauthenticated)
  }

  /// A rejected token ends the local session too.
  fn check_session<T>(&self, result: StorefrontResult<T>) -> StorefrontResult<T> {
    if let Err(StorefrontError::Unauthenticated) = &result {
      log::warn!("Admin token rejected, signing out.");
      self.auth.logout()?;
    }
    result
  }

  pub async fn create_product(&self, draft: &ProductDraft) -> StorefrontResult<ProductSummary> {
    draft.validate().map_err(StorefrontError::InvalidInput)?;
    let token = self.token()?;
    let created = self.check_session(self.api.create_product(&token, draft).await)?;
    log::info!("Created product {} ({}).", created.id, created.name);
    Ok(created)
  }

  pub async fn update_product(&self, product_id: &str, draft: &ProductDraft) -> StorefrontResult<ProductSummary> {
    let product_id = product_id.trim();
    if product_id.is_empty() {
      return Err(StorefrontError::InvalidInput("Product id is required.".to_string()));
    }
    draft.validate().map_err(StorefrontError::InvalidInput)?;
    let token = self.token()?;
    self.check_session(self.api.update_product(&token, product_id, draft).await)
  }

  pub async fn delete_product(&self, product_id: &str) -> StorefrontResult<()> {
    let product_id = product_id.trim();
    if product_id.is_empty() {
      return Err(StorefrontError::InvalidInput("Product id is required.".to_string()));
    }
    let token = self.token()?;
    self.check_session(self.api.delete_product(&token, product_id).await)?;
    log::info!("Deleted product {}.", product_id);
    Ok(())
  }
}
