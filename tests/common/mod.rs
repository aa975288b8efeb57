#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

use storefront_lib::config::StorefrontConfig;
use storefront_lib::error::{StorefrontError, StorefrontResult};
use storefront_lib::models::{Category, Collection, Page, ProductSummary};
use storefront_lib::source::{ProductQuery, ProductSource};

pub const PAGE_SIZE: u32 = 24;

pub fn config() -> StorefrontConfig {
  StorefrontConfig::default()
}

pub fn product(id: usize, name: &str, collection: &str, category: &str, in_stock: bool) -> ProductSummary {
  ProductSummary {
    id: id.to_string(),
    name: name.to_string(),
    image: None,
    description: None,
    in_stock,
    category: Some(category.to_string()),
    collection: Some(collection.to_string()),
  }
}

fn category(id: &str, slug: &str) -> Category {
  Category {
    id: id.to_string(),
    name: slug.to_string(),
    slug: slug.to_string(),
  }
}

fn collection(id: &str, slug: &str) -> Collection {
  Collection {
    id: id.to_string(),
    name: slug.to_string(),
    slug: slug.to_string(),
  }
}

/// In-memory catalog that filters like the real API and records every call.
pub struct FakeSource {
  products: Mutex<Vec<ProductSummary>>,
  requests: Mutex<Vec<ProductQuery>>,
  gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
  facet_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
  fail_products: AtomicBool,
  fail_metadata: AtomicBool,
}

impl FakeSource {
  pub fn new(products: Vec<ProductSummary>) -> Self {
    Self {
      products: Mutex::new(products),
      requests: Mutex::new(Vec::new()),
      gates: Mutex::new(HashMap::new()),
      facet_gates: Mutex::new(HashMap::new()),
      fail_products: AtomicBool::new(false),
      fail_metadata: AtomicBool::new(false),
    }
  }

  /// Star Wars vehicles and droids plus Marvel heroes.
  pub fn galaxy() -> Self {
    Self::new(vec![
      product(1, "X-Wing", "star-wars", "vehicles", true),
      product(2, "Millennium Falcon", "star-wars", "vehicles", false),
      product(3, "R2-D2", "star-wars", "droids", true),
      product(4, "Iron Man", "marvel", "heroes", true),
      product(5, "Thor", "marvel", "heroes", true),
    ])
  }

  pub fn numbered(count: usize, collection: &str) -> Self {
    Self::new(
      (1..=count)
        .map(|id| product(id, &format!("Figure {}", id), collection, "heroes", true))
        .collect(),
    )
  }

  pub fn replace_products(&self, products: Vec<ProductSummary>) {
    *self.products.lock().unwrap() = products;
  }

  pub fn fail_products(&self, fail: bool) {
    self.fail_products.store(fail, Ordering::SeqCst);
  }

  pub fn fail_metadata(&self, fail: bool) {
    self.fail_metadata.store(fail, Ordering::SeqCst);
  }

  /// Holds page requests searching for `search` until the sender fires.
  pub fn gate(&self, search: &str) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.gates.lock().unwrap().insert(search.to_string(), rx);
    tx
  }

  /// Holds collection facet requests searching for `search` until the
  /// sender fires.
  pub fn gate_facets(&self, search: &str) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.facet_gates.lock().unwrap().insert(search.to_string(), rx);
    tx
  }

  pub fn requests(&self) -> Vec<ProductQuery> {
    self.requests.lock().unwrap().clone()
  }

  /// Paged listing calls, facet calls excluded.
  pub fn page_requests(&self) -> Vec<ProductQuery> {
    self
      .requests()
      .into_iter()
      .filter(|query| query.limit == PAGE_SIZE)
      .collect()
  }

  pub fn facet_requests(&self) -> Vec<ProductQuery> {
    self
      .requests()
      .into_iter()
      .filter(|query| query.limit != PAGE_SIZE)
      .collect()
  }
}

fn matches(product: &ProductSummary, query: &ProductQuery) -> bool {
  if let Some(collection) = &query.collection {
    if product.collection.as_ref() != Some(collection) {
      return false;
    }
  }
  if let Some(category) = &query.category {
    if product.category.as_ref() != Some(category) {
      return false;
    }
  }
  if let Some(search) = &query.search {
    if !product.name.to_lowercase().contains(&search.to_lowercase()) {
      return false;
    }
  }
  !query.in_stock_only || product.in_stock
}

#[async_trait]
impl ProductSource for FakeSource {
  async fn list_products(&self, query: &ProductQuery) -> StorefrontResult<Page<ProductSummary>> {
    self.requests.lock().unwrap().push(query.clone());

    let key = query.search.clone().unwrap_or_default();
    let gate = if query.limit == PAGE_SIZE {
      self.gates.lock().unwrap().remove(&key)
    } else if query.collection.is_none() {
      self.facet_gates.lock().unwrap().remove(&key)
    } else {
      None
    };
    if let Some(gate) = gate {
      let _ = gate.await;
    }

    if self.fail_products.load(Ordering::SeqCst) {
      return Err(StorefrontError::Status {
        url: "http://fake/products".to_string(),
        status: 500,
      });
    }

    let matching: Vec<ProductSummary> = self
      .products
      .lock()
      .unwrap()
      .iter()
      .filter(|product| matches(product, query))
      .cloned()
      .collect();
    let offset = (query.page.max(1) as usize - 1) * query.limit as usize;
    Ok(Page {
      total: matching.len() as u64,
      items: matching.into_iter().skip(offset).take(query.limit as usize).collect(),
    })
  }

  async fn list_categories(&self) -> StorefrontResult<Vec<Category>> {
    if self.fail_metadata.load(Ordering::SeqCst) {
      return Err(StorefrontError::MalformedResponse {
        url: "http://fake/categories".to_string(),
        message: "expected a JSON array".to_string(),
      });
    }
    Ok(vec![
      category("1", "vehicles"),
      category("2", "droids"),
      category("3", "heroes"),
      category("4", "villains"),
    ])
  }

  async fn list_collections(&self) -> StorefrontResult<Vec<Collection>> {
    if self.fail_metadata.load(Ordering::SeqCst) {
      return Err(StorefrontError::MalformedResponse {
        url: "http://fake/collections".to_string(),
        message: "expected a JSON array".to_string(),
      });
    }
    Ok(vec![
      collection("1", "star-wars"),
      collection("2", "marvel"),
      collection("3", "dc"),
    ])
  }
}
