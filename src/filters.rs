//! Catalog filter state and the transitions the filter UI can request.
//!
//! Categories are scoped per collection, so a category can only be held
//! inside [`CollectionScope::CollectionSelected`]. Every accepted transition
//! other than a page change puts the view back on page 1.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum CollectionScope {
  #[default]
  NoCollection,
  CollectionSelected {
    collection: String,
    category: Option<String>,
  },
}

impl CollectionScope {
  pub fn collection(&self) -> Option<&str> {
    match self {
      CollectionScope::NoCollection => None,
      CollectionScope::CollectionSelected { collection, .. } => Some(collection),
    }
  }

  pub fn category(&self) -> Option<&str> {
    match self {
      CollectionScope::NoCollection => None,
      CollectionScope::CollectionSelected { category, .. } => category.as_deref(),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterAction {
  SetSearch(String),
  SelectCollection(String),
  ClearCollection,
  SelectCategory(String),
  ClearCategory,
  SetInStockOnly(bool),
  SetPage(u32),
  ClearFilters,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
  Applied,
  /// Rejected transition; the state was left untouched.
  Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "FilterStateDto")]
pub struct FilterState {
  search: String,
  scope: CollectionScope,
  in_stock_only: bool,
  page: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterStateDto {
  search: String,
  category: Option<String>,
  collection: Option<String>,
  in_stock_only: bool,
  page: u32,
}

impl From<FilterState> for FilterStateDto {
  fn from(state: FilterState) -> Self {
    FilterStateDto {
      category: state.scope.category().map(str::to_string),
      collection: state.scope.collection().map(str::to_string),
      search: state.search,
      in_stock_only: state.in_stock_only,
      page: state.page,
    }
  }
}

impl Default for FilterState {
  fn default() -> Self {
    Self {
      search: String::new(),
      scope: CollectionScope::NoCollection,
      in_stock_only: false,
      page: 1,
    }
  }
}

impl FilterState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn search(&self) -> &str {
    &self.search
  }

  pub fn collection(&self) -> Option<&str> {
    self.scope.collection()
  }

  pub fn category(&self) -> Option<&str> {
    self.scope.category()
  }

  pub fn scope(&self) -> &CollectionScope {
    &self.scope
  }

  pub fn in_stock_only(&self) -> bool {
    self.in_stock_only
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  /// True when both states would produce the same result set, paging aside.
  pub fn same_criteria(&self, other: &FilterState) -> bool {
    self.search == other.search && self.scope == other.scope && self.in_stock_only == other.in_stock_only
  }

  pub fn apply(&mut self, action: FilterAction) -> Transition {
    match action {
      FilterAction::SetPage(page) => {
        self.page = page.max(1);
        return Transition::Applied;
      }
      FilterAction::SetSearch(text) => self.search = text,
      FilterAction::SelectCollection(slug) => {
        let slug = slug.trim();
        self.scope = if slug.is_empty() {
          CollectionScope::NoCollection
        } else {
          CollectionScope::CollectionSelected {
            collection: slug.to_string(),
            category: None,
          }
        };
      }
      FilterAction::ClearCollection => self.scope = CollectionScope::NoCollection,
      FilterAction::SelectCategory(slug) => {
        let slug = slug.trim();
        match &mut self.scope {
          CollectionScope::NoCollection => {
            log::warn!("Ignoring category '{}' selected without a collection.", slug);
            return Transition::Ignored;
          }
          CollectionScope::CollectionSelected { category, .. } => {
            *category = if slug.is_empty() { None } else { Some(slug.to_string()) };
          }
        }
      }
      FilterAction::ClearCategory => {
        if let CollectionScope::CollectionSelected { category, .. } = &mut self.scope {
          *category = None;
        }
      }
      FilterAction::SetInStockOnly(in_stock_only) => self.in_stock_only = in_stock_only,
      FilterAction::ClearFilters => {
        *self = FilterState::default();
      }
    }

    self.page = 1;
    Transition::Applied
  }
}
