//! Two-way sync between [`FilterState`] and the address bar query string.
//!
//! Only `category`, `collection` and `search` travel through the URL; paging
//! and the stock toggle stay in memory. Reading a location applies only the
//! keys it contains, so a partial URL never wipes in-session choices.

use url::form_urlencoded;

use crate::filters::{FilterAction, FilterState};

const CATEGORY_KEY: &str = "category";
const COLLECTION_KEY: &str = "collection";
const SEARCH_KEY: &str = "search";

/// Keys found in a query string. `Some("")` means the key was present but
/// empty, which clears the field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocationFilters {
  pub category: Option<String>,
  pub collection: Option<String>,
  pub search: Option<String>,
}

impl LocationFilters {
  pub fn parse(query: &str) -> Self {
    let query = query.trim().trim_start_matches('?');
    let mut filters = LocationFilters::default();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
      match &*key {
        CATEGORY_KEY => filters.category = Some(value.into_owned()),
        COLLECTION_KEY => filters.collection = Some(value.into_owned()),
        SEARCH_KEY => filters.search = Some(value.into_owned()),
        _ => {}
      }
    }
    filters
  }

  pub fn from_state(state: &FilterState) -> Self {
    LocationFilters {
      category: state.category().map(str::to_string),
      collection: state.collection().map(str::to_string),
      search: Some(state.search().to_string()),
    }
  }

  /// Canonical query string: fixed key order, empty values left out.
  pub fn to_query_string(&self) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in [
      (CATEGORY_KEY, &self.category),
      (COLLECTION_KEY, &self.collection),
      (SEARCH_KEY, &self.search),
    ] {
      if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
        serializer.append_pair(key, value);
      }
    }
    serializer.finish()
  }

  /// Applies the present keys to `state`, collection first so the narrowing
  /// rule sees the collection the URL asks for, then resets to page 1.
  pub fn apply_to(&self, state: &mut FilterState) {
    if let Some(collection) = self.collection.as_deref() {
      if state.collection() != Some(collection).filter(|slug| !slug.is_empty()) {
        if collection.is_empty() {
          state.apply(FilterAction::ClearCollection);
        } else {
          state.apply(FilterAction::SelectCollection(collection.to_string()));
        }
      }
    }

    if let Some(category) = self.category.as_deref() {
      if category.is_empty() {
        state.apply(FilterAction::ClearCategory);
      } else {
        state.apply(FilterAction::SelectCategory(category.to_string()));
      }
    }

    if let Some(search) = self.search.as_ref() {
      state.apply(FilterAction::SetSearch(search.clone()));
    }

    state.apply(FilterAction::SetPage(1));
  }
}

pub fn to_query_string(state: &FilterState) -> String {
  LocationFilters::from_state(state).to_query_string()
}

fn canonical(query: &str) -> String {
  LocationFilters::parse(query).to_query_string()
}

/// Tracks the last query string written or observed so that the two sync
/// directions never feed each other.
#[derive(Clone, Debug, Default)]
pub struct UrlSynchronizer {
  last_query: String,
}

impl UrlSynchronizer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn current_query(&self) -> &str {
    &self.last_query
  }

  /// State -> URL. Returns the query to write (with replace semantics), or
  /// `None` when the address bar already shows it.
  pub fn state_to_url(&mut self, state: &FilterState) -> Option<String> {
    let next = to_query_string(state);
    if next == self.last_query {
      return None;
    }
    self.last_query = next.clone();
    Some(next)
  }

  /// URL -> State, for mount and for navigation events. Returns false when
  /// the location is the one we last wrote and nothing was applied.
  pub fn url_to_state(&mut self, query: &str, state: &mut FilterState) -> bool {
    let incoming = canonical(query);
    if incoming == self.last_query && !self.last_query.is_empty() {
      return false;
    }
    LocationFilters::parse(query).apply_to(state);
    self.last_query = incoming;
    true
  }

  /// Applies `query` unconditionally; used when a view mounts.
  pub fn seed(&mut self, query: &str, state: &mut FilterState) {
    LocationFilters::parse(query).apply_to(state);
    self.last_query = canonical(query);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn state(collection: Option<&str>, category: Option<&str>, search: &str) -> FilterState {
    let mut state = FilterState::new();
    if let Some(collection) = collection {
      state.apply(FilterAction::SelectCollection(collection.to_string()));
    }
    if let Some(category) = category {
      state.apply(FilterAction::SelectCategory(category.to_string()));
    }
    state.apply(FilterAction::SetSearch(search.to_string()));
    state
  }

  #[test]
  fn omits_empty_keys() {
    assert_eq!(to_query_string(&FilterState::new()), "");
    assert_eq!(to_query_string(&state(Some("marvel"), None, "")), "collection=marvel");
  }

  #[test]
  fn query_round_trips_search_category_and_collection() {
    let cases = [
      state(None, None, ""),
      state(None, None, "bob"),
      state(Some("star-wars"), None, "x wing & co"),
      state(Some("star-wars"), Some("vehicles"), "100% föam"),
    ];

    for original in cases {
      let query = to_query_string(&original);
      let mut parsed = FilterState::new();
      LocationFilters::parse(&query).apply_to(&mut parsed);
      assert_eq!(parsed.search(), original.search(), "{}", query);
      assert_eq!(parsed.collection(), original.collection(), "{}", query);
      assert_eq!(parsed.category(), original.category(), "{}", query);
    }
  }

  #[test]
  fn absent_keys_do_not_clobber_current_values() {
    let mut current = state(Some("marvel"), Some("heroes"), "iron");
    current.apply(FilterAction::SetPage(5));

    LocationFilters::parse("?category=villains").apply_to(&mut current);

    assert_eq!(current.collection(), Some("marvel"));
    assert_eq!(current.category(), Some("villains"));
    assert_eq!(current.search(), "iron");
    assert_eq!(current.page(), 1);
  }

  #[test]
  fn explicit_empty_keys_clear_fields() {
    let mut current = state(Some("marvel"), Some("heroes"), "iron");
    LocationFilters::parse("collection=&search=").apply_to(&mut current);
    assert_eq!(current.collection(), None);
    assert_eq!(current.category(), None);
    assert_eq!(current.search(), "");
  }

  #[test]
  fn same_collection_in_url_keeps_category() {
    let mut current = state(Some("marvel"), Some("heroes"), "");
    LocationFilters::parse("collection=marvel").apply_to(&mut current);
    assert_eq!(current.category(), Some("heroes"));
  }

  #[test]
  fn category_without_collection_in_url_is_ignored() {
    let mut current = FilterState::new();
    LocationFilters::parse("category=vehicles").apply_to(&mut current);
    assert_eq!(current.category(), None);
  }

  #[test]
  fn writes_only_when_query_changes() {
    let mut sync = UrlSynchronizer::new();
    let current = state(Some("marvel"), None, "");

    assert_eq!(sync.state_to_url(&current).as_deref(), Some("collection=marvel"));
    assert_eq!(sync.state_to_url(&current), None);

    let mut paged = current.clone();
    paged.apply(FilterAction::SetPage(2));
    assert_eq!(sync.state_to_url(&paged), None);
  }

  #[test]
  fn echo_of_own_write_is_ignored() {
    let mut sync = UrlSynchronizer::new();
    let mut current = state(Some("marvel"), None, "thor");
    let written = sync.state_to_url(&current).unwrap();
    current.apply(FilterAction::SetPage(3));

    assert!(!sync.url_to_state(&format!("?{}", written), &mut current));
    assert_eq!(current.page(), 3);

    assert!(sync.url_to_state("?collection=star-wars", &mut current));
    assert_eq!(current.collection(), Some("star-wars"));
    assert_eq!(current.search(), "thor");
    assert_eq!(sync.current_query(), "collection=star-wars");
  }
}
