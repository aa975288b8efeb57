//! Storefront desktop client.
//!
//! The webview renders; this crate decides. It owns the catalog filter
//! engine (debounced search, URL sync, collection/category narrowing,
//! last-request-wins fetching, paging), the consultation cart and its
//! hand-off to a messaging channel, and the admin product API.

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod consultation;
pub mod debounce;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod models;
pub mod source;
pub mod store;
pub mod url_sync;

#[cfg(feature = "desktop")]
mod commands;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::admin::AdminClient;
use crate::api::HttpStorefrontApi;
use crate::auth::AuthService;
use crate::cart::CartService;
use crate::catalog::CatalogEngine;
use crate::config::StorefrontConfig;
use crate::error::StorefrontResult;
use crate::store::{KeyValueStore, SqliteKeyValueStore};

pub use crate::catalog::CatalogView;
pub use crate::error::StorefrontError;

const DATABASE_FILE: &str = "storefront.db";

/// Services for one application session.
pub struct AppState {
  pub app_data_dir: PathBuf,
  pub db_path: PathBuf,
  pub config: StorefrontConfig,
  pub catalog: CatalogEngine<HttpStorefrontApi>,
  pub cart: Arc<CartService>,
  pub auth: Arc<AuthService>,
  pub admin: AdminClient,
}

impl AppState {
  pub fn initialize(app_data_dir: &Path) -> StorefrontResult<Self> {
    let config = StorefrontConfig::load(app_data_dir)?;
    let db_path = app_data_dir.join(DATABASE_FILE);
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::open(&db_path)?);

    let api = HttpStorefrontApi::new(&config)?;
    let auth = Arc::new(AuthService::new(Arc::new(api.clone()), store.clone()));
    let cart = Arc::new(CartService::load(store)?);
    let admin = AdminClient::new(api.clone(), auth.clone());
    let catalog = CatalogEngine::new(api, &config);

    log::info!("Storefront session ready, API at {}.", config.api_base_url);
    Ok(AppState {
      app_data_dir: app_data_dir.to_path_buf(),
      db_path,
      config,
      catalog,
      cart,
      auth,
      admin,
    })
  }
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  commands::run()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cart::CartItem;
  use tempfile::TempDir;

  #[test]
  fn initialize_wires_services_over_one_database() {
    let dir = TempDir::new().unwrap();
    let state = AppState::initialize(dir.path()).unwrap();
    assert!(state.db_path.exists());
    assert!(!state.auth.is_authenticated());

    state
      .cart
      .add(CartItem {
        product_id: "42".to_string(),
        name: "Lightsaber".to_string(),
        image: None,
        added_at: "2026-01-01T00:00:00+00:00".to_string(),
      })
      .unwrap();
    drop(state);

    let reopened = AppState::initialize(dir.path()).unwrap();
    assert!(reopened.cart.contains("42"));
    assert_eq!(reopened.catalog.view().pagination.total_pages, 1);
  }
}
