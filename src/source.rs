use async_trait::async_trait;

use crate::error::StorefrontResult;
use crate::filters::FilterState;
use crate::models::{Category, Collection, Page, ProductSummary};

/// Parameters of one `GET /products` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductQuery {
  pub category: Option<String>,
  pub collection: Option<String>,
  pub search: Option<String>,
  pub in_stock_only: bool,
  pub page: u32,
  pub limit: u32,
}

impl ProductQuery {
  pub fn for_page(state: &FilterState, page_size: u32) -> Self {
    ProductQuery {
      category: state.category().map(str::to_string),
      collection: state.collection().map(str::to_string),
      search: Some(state.search().to_string()).filter(|search| !search.is_empty()),
      in_stock_only: state.in_stock_only(),
      page: state.page(),
      limit: page_size,
    }
  }

  /// Unpaged query deciding which collections have matches: the current
  /// search and stock toggle, without the collection scope itself.
  pub fn for_collection_facets(state: &FilterState, limit: u32) -> Self {
    ProductQuery {
      category: None,
      collection: None,
      page: 1,
      ..ProductQuery::for_page(state, limit)
    }
  }

  /// Unpaged query deciding which categories of the selected collection have
  /// matches. `None` while no collection is selected.
  pub fn for_category_facets(state: &FilterState, limit: u32) -> Option<Self> {
    state.collection()?;
    Some(ProductQuery {
      category: None,
      page: 1,
      ..ProductQuery::for_page(state, limit)
    })
  }

  pub fn to_params(&self) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(category) = &self.category {
      params.push(("category", category.clone()));
    }
    if let Some(collection) = &self.collection {
      params.push(("collection", collection.clone()));
    }
    if let Some(search) = &self.search {
      params.push(("search", search.clone()));
    }
    if self.in_stock_only {
      params.push(("inStock", "true".to_string()));
    }
    params.push(("page", self.page.to_string()));
    params.push(("limit", self.limit.to_string()));
    params
  }
}

/// The remote catalog the engine reads from.
#[async_trait]
pub trait ProductSource: Send + Sync + 'static {
  async fn list_products(&self, query: &ProductQuery) -> StorefrontResult<Page<ProductSummary>>;

  async fn list_categories(&self) -> StorefrontResult<Vec<Category>>;

  async fn list_collections(&self) -> StorefrontResult<Vec<Collection>>;
}
