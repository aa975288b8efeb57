//! Request bookkeeping for the catalog: sequence-tagged result slots, load
//! status, facet sets and page arithmetic.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::StorefrontResult;
use crate::models::{Page, ProductSummary};

pub fn total_pages(total: u64, page_size: u32) -> u32 {
  let page_size = u64::from(page_size.max(1));
  let pages = total.div_ceil(page_size).max(1);
  u32::try_from(pages).unwrap_or(u32::MAX)
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page: u32,
  pub total_pages: u32,
  pub has_previous: bool,
  pub has_next: bool,
}

impl Pagination {
  /// `page` is clamped into `1..=total_pages`, so a shrunken result set is
  /// never reported as "page 3 of 1".
  pub fn new(page: u32, total: u64, page_size: u32) -> Self {
    let total_pages = total_pages(total, page_size);
    let page = page.clamp(1, total_pages);
    Pagination {
      page,
      total_pages,
      has_previous: page > 1,
      has_next: page < total_pages,
    }
  }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LoadStatus {
  Idle,
  Loading,
  Ready,
  Failed { message: String },
}

/// Holds the value of the latest request only. Every request takes a
/// sequence number from `issue`; `commit` refuses anything but the newest.
#[derive(Clone, Debug)]
pub struct SequencedSlot<T> {
  issued: u64,
  committed: u64,
  value: T,
}

impl<T> SequencedSlot<T> {
  pub fn new(value: T) -> Self {
    Self {
      issued: 0,
      committed: 0,
      value,
    }
  }

  pub fn issue(&mut self) -> u64 {
    self.issued += 1;
    self.issued
  }

  pub fn is_latest(&self, sequence: u64) -> bool {
    sequence == self.issued
  }

  pub fn commit(&mut self, sequence: u64, value: T) -> bool {
    if !self.is_latest(sequence) {
      log::debug!("Dropping response #{} superseded by #{}.", sequence, self.issued);
      return false;
    }
    self.value = value;
    self.committed = sequence;
    true
  }

  /// True when no issued request is still outstanding.
  pub fn is_settled(&self) -> bool {
    self.committed == self.issued
  }

  pub fn value(&self) -> &T {
    &self.value
  }
}

/// Outcome of a product page fetch. Failures become an empty page plus a
/// `Failed` status.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchedPage {
  pub page: Page<ProductSummary>,
  pub status: LoadStatus,
}

impl FetchedPage {
  pub fn idle() -> Self {
    FetchedPage {
      page: Page::empty(),
      status: LoadStatus::Idle,
    }
  }

  pub fn from_outcome(outcome: StorefrontResult<Page<ProductSummary>>) -> Self {
    match outcome {
      Ok(page) => FetchedPage {
        page,
        status: LoadStatus::Ready,
      },
      Err(e) => {
        log::warn!("Could not load products: {}", e);
        FetchedPage {
          page: Page::empty(),
          status: LoadStatus::Failed { message: e.to_string() },
        }
      }
    }
  }
}

/// Slugs that currently have at least one matching product. `None` means
/// unknown (not loaded yet, or the facet query failed).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Facets {
  pub collections: Option<BTreeSet<String>>,
  pub categories: Option<BTreeSet<String>>,
}

impl Facets {
  pub fn collection_slugs(page: &Page<ProductSummary>) -> BTreeSet<String> {
    page.items.iter().filter_map(|item| item.collection.clone()).collect()
  }

  pub fn category_slugs(page: &Page<ProductSummary>) -> BTreeSet<String> {
    page.items.iter().filter_map(|item| item.category.clone()).collect()
  }

  pub fn offers_collection(&self, slug: &str) -> bool {
    self.collections.as_ref().map(|set| set.contains(slug)).unwrap_or(true)
  }

  pub fn offers_category(&self, slug: &str) -> bool {
    self.categories.as_ref().map(|set| set.contains(slug)).unwrap_or(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::StorefrontError;
  use pretty_assertions::assert_eq;

  #[test]
  fn total_pages_boundaries() {
    assert_eq!(total_pages(0, 24), 1);
    assert_eq!(total_pages(1, 24), 1);
    assert_eq!(total_pages(24, 24), 1);
    assert_eq!(total_pages(25, 24), 2);
    assert_eq!(total_pages(48, 24), 2);
    assert_eq!(total_pages(49, 24), 3);
  }

  #[test]
  fn pagination_disables_navigation_at_bounds() {
    let first = Pagination::new(1, 50, 24);
    assert_eq!((first.has_previous, first.has_next), (false, true));

    let last = Pagination::new(3, 50, 24);
    assert_eq!((last.has_previous, last.has_next), (true, false));

    let only = Pagination::new(1, 0, 24);
    assert_eq!((only.page, only.total_pages, only.has_previous, only.has_next), (1, 1, false, false));
  }

  #[test]
  fn pagination_never_reports_a_page_past_the_end() {
    let clamped = Pagination::new(3, 0, 24);
    assert_eq!(clamped.page, 1);
    assert_eq!(clamped.total_pages, 1);
  }

  #[test]
  fn slot_keeps_only_the_latest_request() {
    let mut slot = SequencedSlot::new("initial");
    let a = slot.issue();
    let b = slot.issue();
    assert!(!slot.is_settled());

    assert!(slot.commit(b, "b"));
    assert!(!slot.commit(a, "a"));
    assert_eq!(*slot.value(), "b");
    assert!(slot.is_settled());
  }

  #[test]
  fn failed_fetch_becomes_empty_page() {
    let fetched = FetchedPage::from_outcome(Err(StorefrontError::Status {
      url: "http://shop/products".to_string(),
      status: 502,
    }));
    assert_eq!(fetched.page, Page::empty());
    assert!(matches!(fetched.status, LoadStatus::Failed { .. }));
  }

  #[test]
  fn unknown_facets_offer_everything() {
    let facets = Facets::default();
    assert!(facets.offers_collection("marvel"));

    let narrowed = Facets {
      collections: Some(BTreeSet::from(["marvel".to_string()])),
      categories: Some(BTreeSet::new()),
    };
    assert!(narrowed.offers_collection("marvel"));
    assert!(!narrowed.offers_collection("star-wars"));
    assert!(!narrowed.offers_category("heroes"));
  }
}
