use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{StorefrontError, StorefrontResult};
use crate::store::KeyValueStore;

pub const TOKEN_STORAGE_KEY: &str = "storefront.auth_token";

/// Exchanges admin credentials for a bearer token.
#[async_trait]
pub trait Authenticator: Send + Sync {
  async fn login(&self, username: &str, password: &str) -> StorefrontResult<String>;
}

pub struct AuthService {
  authenticator: Arc<dyn Authenticator>,
  tokens: Arc<dyn KeyValueStore>,
}

impl AuthService {
  pub fn new(authenticator: Arc<dyn Authenticator>, tokens: Arc<dyn KeyValueStore>) -> Self {
    Self { authenticator, tokens }
  }

  pub async fn login(&self, username: &str, password: &str) -> StorefrontResult<()> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
      return Err(StorefrontError::InvalidInput(
        "Username and password are required.".to_string(),
      ));
    }

    let token = self.authenticator.login(username, password).await?;
    if token.trim().is_empty() {
      return Err(StorefrontError::InvalidCredentials);
    }
    self.tokens.set(TOKEN_STORAGE_KEY, &token)?;
    log::info!("Admin '{}' signed in.", username);
    Ok(())
  }

  pub fn logout(&self) -> StorefrontResult<()> {
    self.tokens.remove(TOKEN_STORAGE_KEY)
  }

  pub fn is_authenticated(&self) -> bool {
    self.token().is_some()
  }

  pub fn token(&self) -> Option<String> {
    match self.tokens.get(TOKEN_STORAGE_KEY) {
      Ok(token) => token.filter(|token| !token.is_empty()),
      Err(e) => {
        log::warn!("Unable to read auth token: {}", e);
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryKeyValueStore;

  struct StaticAuthenticator {
    password: &'static str,
  }

  #[async_trait]
  impl Authenticator for StaticAuthenticator {
    async fn login(&self, _username: &str, password: &str) -> StorefrontResult<String> {
      if password == self.password {
        Ok("token-123".to_string())
      } else {
        Err(StorefrontError::InvalidCredentials)
      }
    }
  }

  fn service() -> AuthService {
    AuthService::new(
      Arc::new(StaticAuthenticator { password: "secret" }),
      Arc::new(MemoryKeyValueStore::new()),
    )
  }

  #[tokio::test]
  async fn login_stores_token_and_logout_clears_it() {
    let auth = service();
    assert!(!auth.is_authenticated());

    auth.login("admin", "secret").await.unwrap();
    assert_eq!(auth.token().as_deref(), Some("token-123"));

    auth.logout().unwrap();
    assert!(!auth.is_authenticated());
  }

  #[tokio::test]
  async fn wrong_password_leaves_session_signed_out() {
    let auth = service();
    let result = auth.login("admin", "nope").await;
    assert!(matches!(result, Err(StorefrontError::InvalidCredentials)));
    assert!(!auth.is_authenticated());
  }

  #[tokio::test]
  async fn blank_credentials_are_rejected_before_any_request() {
    let auth = service();
    assert!(matches!(
      auth.login("  ", "secret").await,
      Err(StorefrontError::InvalidInput(_))
    ));
  }
}
