//! Consultation cart. Nothing here is transactional: the cart is a list of
//! products the visitor wants to ask about, persisted as one JSON array.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StorefrontResult;
use crate::models::ProductSummary;
use crate::store::KeyValueStore;

pub const CART_STORAGE_KEY: &str = "storefront.cart";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub product_id: String,
  pub name: String,
  pub image: Option<String>,
  pub added_at: String,
}

impl CartItem {
  pub fn from_product(product: &ProductSummary) -> Self {
    CartItem {
      product_id: product.id.clone(),
      name: product.name.clone(),
      image: product.image.clone(),
      added_at: Utc::now().to_rfc3339(),
    }
  }
}

pub struct CartService {
  store: Arc<dyn KeyValueStore>,
  items: Mutex<Vec<CartItem>>,
}

impl CartService {
  /// Loads the saved cart. A missing or unreadable entry starts an empty cart.
  pub fn load(store: Arc<dyn KeyValueStore>) -> StorefrontResult<Self> {
    let items = match store.get(CART_STORAGE_KEY)? {
      Some(raw) => serde_json::from_str::<Vec<CartItem>>(&raw).unwrap_or_else(|e| {
        log::warn!("Discarding unreadable saved cart: {}", e);
        Vec::new()
      }),
      None => Vec::new(),
    };

    Ok(Self {
      store,
      items: Mutex::new(items),
    })
  }

  fn lock(&self) -> MutexGuard<'_, Vec<CartItem>> {
    self.items.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn persist(&self, items: &[CartItem]) -> StorefrontResult<()> {
    let raw = serde_json::to_string(items)?;
    self.store.set(CART_STORAGE_KEY, &raw)
  }

  pub fn items(&self) -> Vec<CartItem> {
    self.lock().clone()
  }

  /// Returns false when the product is already in the cart.
  pub fn add(&self, item: CartItem) -> StorefrontResult<bool> {
    let mut items = self.lock();
    if items.iter().any(|existing| existing.product_id == item.product_id) {
      return Ok(false);
    }
    items.push(item);
    self.persist(&items)?;
    Ok(true)
  }

  pub fn remove(&self, product_id: &str) -> StorefrontResult<bool> {
    let mut items = self.lock();
    let before = items.len();
    items.retain(|item| item.product_id != product_id);
    if items.len() == before {
      return Ok(false);
    }
    self.persist(&items)?;
    Ok(true)
  }

  pub fn clear(&self) -> StorefrontResult<()> {
    let mut items = self.lock();
    items.clear();
    self.persist(&items)
  }

  pub fn contains(&self, product_id: &str) -> bool {
    self.lock().iter().any(|item| item.product_id == product_id)
  }

  pub fn count(&self) -> usize {
    self.lock().len()
  }
}
