//! The catalog view engine.
//!
//! One [`CatalogEngine`] backs one mounted catalog view. Filter changes are
//! applied synchronously under a lock; the resulting product and facet
//! requests run afterwards, tagged with sequence numbers so that only the
//! newest response of each kind reaches the published [`CatalogView`].

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::StorefrontConfig;
use crate::debounce::Debouncer;
use crate::fetcher::{total_pages, Facets, FetchedPage, LoadStatus, Pagination, SequencedSlot};
use crate::filters::{FilterAction, FilterState, Transition};
use crate::models::{Category, Collection, ProductSummary};
use crate::source::{ProductQuery, ProductSource};
use crate::url_sync::UrlSynchronizer;

/// Everything the catalog UI renders.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
  pub filters: FilterState,
  /// Raw text of the search box, ahead of the debounced `filters.search`.
  pub search_input: String,
  /// Query string the address bar should show (replace, not push).
  pub location_query: String,
  pub items: Vec<ProductSummary>,
  pub total: u64,
  pub status: LoadStatus,
  pub pagination: Pagination,
  pub collection_options: Vec<Collection>,
  /// Empty while no collection is selected.
  pub category_options: Vec<Category>,
  pub show_categories: bool,
  pub metadata_error: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct Metadata {
  categories: Vec<Category>,
  collections: Vec<Collection>,
  error: Option<String>,
}

struct SearchPipeline {
  debouncer: Debouncer<String>,
  pump: JoinHandle<()>,
}

impl SearchPipeline {
  fn shutdown(mut self) {
    self.debouncer.cancel();
    self.pump.abort();
  }
}

struct CatalogState {
  filters: FilterState,
  search_input: String,
  url: UrlSynchronizer,
  results: SequencedSlot<FetchedPage>,
  facets: SequencedSlot<Facets>,
  metadata: SequencedSlot<Metadata>,
  search: Option<SearchPipeline>,
  /// False before `mount` and after `unmount`; handlers leave state alone.
  mounted: bool,
}

impl CatalogState {
  fn new() -> Self {
    Self {
      filters: FilterState::new(),
      search_input: String::new(),
      url: UrlSynchronizer::new(),
      results: SequencedSlot::new(FetchedPage::idle()),
      facets: SequencedSlot::new(Facets::default()),
      metadata: SequencedSlot::new(Metadata::default()),
      search: None,
      mounted: false,
    }
  }
}

struct ResultsTicket {
  sequence: u64,
  snapshot: FilterState,
  query: ProductQuery,
}

struct FacetsTicket {
  sequence: u64,
  collections: ProductQuery,
  categories: Option<ProductQuery>,
}

struct FetchPlan {
  results: Option<ResultsTicket>,
  facets: Option<FacetsTicket>,
}

struct Shared<S> {
  source: S,
  page_size: u32,
  facet_limit: u32,
  search_delay: Duration,
  state: Mutex<CatalogState>,
  view_tx: watch::Sender<CatalogView>,
}

pub struct CatalogEngine<S> {
  shared: Arc<Shared<S>>,
}

impl<S> Clone for CatalogEngine<S> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<S: ProductSource> CatalogEngine<S> {
  pub fn new(source: S, config: &StorefrontConfig) -> Self {
    let state = CatalogState::new();
    let initial = render(&state, config.page_size);
    let (view_tx, _) = watch::channel(initial);
    Self {
      shared: Arc::new(Shared {
        source,
        page_size: config.page_size.max(1),
        facet_limit: config.facet_limit.max(1),
        search_delay: config.search_debounce(),
        state: Mutex::new(state),
        view_tx,
      }),
    }
  }

  pub fn source(&self) -> &S {
    &self.shared.source
  }

  fn lock(&self) -> MutexGuard<'_, CatalogState> {
    self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn view(&self) -> CatalogView {
    render(&self.lock(), self.shared.page_size)
  }

  /// Receives a fresh [`CatalogView`] after every change, including the
  /// ones caused by settled searches and late responses.
  pub fn subscribe(&self) -> watch::Receiver<CatalogView> {
    self.shared.view_tx.subscribe()
  }

  fn publish(&self) -> CatalogView {
    let view = self.view();
    self.shared.view_tx.send_replace(view.clone());
    view
  }

  /// Seeds the filters from `location_query` and loads metadata, the first
  /// page and the facets.
  pub async fn mount(&self, location_query: &str) -> CatalogView {
    let (plan, metadata_sequence) = {
      let mut guard = self.lock();
      let state = &mut *guard;
      if let Some(pipeline) = state.search.take() {
        pipeline.shutdown();
      }
      state.filters = FilterState::new();
      state.url = UrlSynchronizer::new();
      state.url.seed(location_query, &mut state.filters);
      state.search_input = state.filters.search().to_string();
      state.mounted = true;
      self.start_search_pipeline(state);
      log::info!("Catalog mounted at '{}'.", state.url.current_query());

      let plan = FetchPlan {
        results: Some(self.issue_results(state)),
        facets: Some(self.issue_facets(state)),
      };
      (plan, state.metadata.issue())
    };

    let (_, view) = tokio::join!(self.load_metadata(metadata_sequence), self.execute(plan));
    view
  }

  /// Cancels the pending search and drops every response still in flight.
  pub fn unmount(&self) {
    {
      let mut state = self.lock();
      state.mounted = false;
      if let Some(pipeline) = state.search.take() {
        pipeline.shutdown();
      }
      state.results.issue();
      state.facets.issue();
      state.metadata.issue();
    }
    log::info!("Catalog unmounted.");
  }

  pub async fn on_collection_change(&self, slug: Option<String>) -> CatalogView {
    let action = match slug {
      Some(slug) => FilterAction::SelectCollection(slug),
      None => FilterAction::ClearCollection,
    };
    self.dispatch(action).await
  }

  pub async fn on_category_change(&self, slug: Option<String>) -> CatalogView {
    let action = match slug {
      Some(slug) => FilterAction::SelectCategory(slug),
      None => FilterAction::ClearCategory,
    };
    self.dispatch(action).await
  }

  pub async fn on_stock_filter_change(&self, in_stock_only: bool) -> CatalogView {
    self.dispatch(FilterAction::SetInStockOnly(in_stock_only)).await
  }

  /// Records a keystroke. The search filter follows once typing pauses for
  /// the configured delay. Must run inside a tokio runtime.
  pub fn on_search_change(&self, text: String) -> CatalogView {
    {
      let mut guard = self.lock();
      let state = &mut *guard;
      if !state.mounted {
        log::debug!("Ignoring search input while unmounted.");
        return render(state, self.shared.page_size);
      }
      state.search_input = text.clone();
      self.start_search_pipeline(state);
      if let Some(pipeline) = state.search.as_mut() {
        pipeline.debouncer.schedule(text);
      }
    }
    self.publish()
  }

  pub async fn on_clear_filters(&self) -> CatalogView {
    {
      let mut state = self.lock();
      if !state.mounted {
        return render(&state, self.shared.page_size);
      }
      if let Some(pipeline) = state.search.as_mut() {
        pipeline.debouncer.cancel();
      }
      state.search_input.clear();
    }
    self.dispatch(FilterAction::ClearFilters).await
  }

  /// Moves to `page`, bounded by the page count the view currently shows.
  pub async fn go_to_page(&self, page: u32) -> CatalogView {
    let bounded = {
      let state = self.lock();
      page.clamp(1, total_pages(state.results.value().page.total, self.shared.page_size))
    };
    self.dispatch(FilterAction::SetPage(bounded)).await
  }

  pub async fn next_page(&self) -> CatalogView {
    let next = {
      let state = self.lock();
      let pagination = Pagination::new(state.filters.page(), state.results.value().page.total, self.shared.page_size);
      pagination.has_next.then(|| pagination.page + 1)
    };
    match next {
      Some(page) => self.dispatch(FilterAction::SetPage(page)).await,
      None => self.view(),
    }
  }

  pub async fn previous_page(&self) -> CatalogView {
    let previous = {
      let state = self.lock();
      let pagination = Pagination::new(state.filters.page(), state.results.value().page.total, self.shared.page_size);
      pagination.has_previous.then(|| pagination.page - 1)
    };
    match previous {
      Some(page) => self.dispatch(FilterAction::SetPage(page)).await,
      None => self.view(),
    }
  }

  /// Navigation event (back/forward or an external link) carrying a new
  /// query string.
  pub async fn on_location_change(&self, location_query: &str) -> CatalogView {
    let plan = {
      let mut guard = self.lock();
      let state = &mut *guard;
      if !state.mounted {
        log::debug!("Ignoring location '{}' while unmounted.", location_query);
        return render(state, self.shared.page_size);
      }
      let before = state.filters.clone();
      if !state.url.url_to_state(location_query, &mut state.filters) {
        return render(state, self.shared.page_size);
      }
      if let Some(pipeline) = state.search.as_mut() {
        pipeline.debouncer.cancel();
      }
      state.search_input = state.filters.search().to_string();
      self.plan_after(state, &before)
    };
    self.execute(plan).await
  }

  async fn apply_settled_search(&self, text: String) {
    log::debug!("Search settled on '{}'.", text);
    self.dispatch(FilterAction::SetSearch(text)).await;
  }

  async fn dispatch(&self, action: FilterAction) -> CatalogView {
    let plan = {
      let mut guard = self.lock();
      let state = &mut *guard;
      if !state.mounted {
        log::debug!("Ignoring {:?} while unmounted.", action);
        return render(state, self.shared.page_size);
      }
      let before = state.filters.clone();
      if state.filters.apply(action) == Transition::Ignored {
        return render(state, self.shared.page_size);
      }
      if let Some(query) = state.url.state_to_url(&state.filters) {
        log::debug!("Location query is now '{}'.", query);
      }
      self.plan_after(state, &before)
    };
    self.execute(plan).await
  }

  fn plan_after(&self, state: &mut CatalogState, before: &FilterState) -> FetchPlan {
    let criteria_changed = !state.filters.same_criteria(before);
    let page_changed = state.filters.page() != before.page();
    FetchPlan {
      results: (criteria_changed || page_changed).then(|| self.issue_results(state)),
      facets: criteria_changed.then(|| self.issue_facets(state)),
    }
  }

  fn issue_results(&self, state: &mut CatalogState) -> ResultsTicket {
    ResultsTicket {
      sequence: state.results.issue(),
      snapshot: state.filters.clone(),
      query: ProductQuery::for_page(&state.filters, self.shared.page_size),
    }
  }

  fn issue_facets(&self, state: &mut CatalogState) -> FacetsTicket {
    FacetsTicket {
      sequence: state.facets.issue(),
      collections: ProductQuery::for_collection_facets(&state.filters, self.shared.facet_limit),
      categories: ProductQuery::for_category_facets(&state.filters, self.shared.facet_limit),
    }
  }

  fn start_search_pipeline(&self, state: &mut CatalogState) {
    if state.search.is_some() {
      return;
    }
    let (debouncer, mut settled) = Debouncer::new(self.shared.search_delay);
    let weak = Arc::downgrade(&self.shared);
    let pump = tokio::spawn(async move {
      while let Some(text) = settled.recv().await {
        let Some(shared) = weak.upgrade() else {
          break;
        };
        CatalogEngine { shared }.apply_settled_search(text).await;
      }
    });
    state.search = Some(SearchPipeline { debouncer, pump });
  }

  async fn execute(&self, plan: FetchPlan) -> CatalogView {
    self.publish();
    let results = async {
      if let Some(ticket) = plan.results {
        self.fetch_results(ticket).await;
      }
    };
    let facets = async {
      if let Some(ticket) = plan.facets {
        self.fetch_facets(ticket).await;
      }
    };
    tokio::join!(results, facets);
    self.view()
  }

  async fn fetch_results(&self, ticket: ResultsTicket) {
    let mut ticket = ticket;
    loop {
      let outcome = self.shared.source.list_products(&ticket.query).await;
      let follow_up = {
        let mut guard = self.lock();
        let state = &mut *guard;
        let fetched = FetchedPage::from_outcome(outcome);
        let loaded = fetched.status == LoadStatus::Ready;
        let last_page = total_pages(fetched.page.total, self.shared.page_size);
        let total = fetched.page.total;
        if !state.results.commit(ticket.sequence, fetched) {
          return;
        }

        // The set shrank under the requested page; fall back to its last page.
        if ticket.snapshot.page() > last_page && state.filters == ticket.snapshot {
          log::info!(
            "Page {} is past the end ({} page(s)), moving to page {}.",
            ticket.snapshot.page(),
            last_page,
            last_page
          );
          state.filters.apply(FilterAction::SetPage(last_page));
          (loaded && total > 0).then(|| self.issue_results(state))
        } else {
          None
        }
      };

      self.publish();
      match follow_up {
        Some(next) => ticket = next,
        None => return,
      }
    }
  }

  async fn fetch_facets(&self, ticket: FacetsTicket) {
    let source = &self.shared.source;
    let categories = async {
      match &ticket.categories {
        Some(query) => Some(source.list_products(query).await),
        None => None,
      }
    };
    let (collections, categories) = tokio::join!(source.list_products(&ticket.collections), categories);

    let facets = Facets {
      collections: match collections {
        Ok(page) => Some(Facets::collection_slugs(&page)),
        Err(e) => {
          log::warn!("Could not load collection facets: {}", e);
          None
        }
      },
      categories: match categories {
        Some(Ok(page)) => Some(Facets::category_slugs(&page)),
        Some(Err(e)) => {
          log::warn!("Could not load category facets: {}", e);
          None
        }
        None => Some(Default::default()),
      },
    };

    let committed = self.lock().facets.commit(ticket.sequence, facets);
    if committed {
      self.publish();
    }
  }

  async fn load_metadata(&self, sequence: u64) {
    let source = &self.shared.source;
    let (categories, collections) = tokio::join!(source.list_categories(), source.list_collections());

    let mut errors = Vec::new();
    let categories = categories.unwrap_or_else(|e| {
      errors.push(e.to_string());
      Vec::new()
    });
    let collections = collections.unwrap_or_else(|e| {
      errors.push(e.to_string());
      Vec::new()
    });
    if !errors.is_empty() {
      log::warn!("Could not load catalog metadata: {}", errors.join("; "));
    }

    let metadata = Metadata {
      categories,
      collections,
      error: (!errors.is_empty()).then(|| errors.join("; ")),
    };
    let committed = self.lock().metadata.commit(sequence, metadata);
    if committed {
      self.publish();
    }
  }
}

fn render(state: &CatalogState, page_size: u32) -> CatalogView {
  let fetched = state.results.value();
  let facets = state.facets.value();
  let metadata = state.metadata.value();
  let filters = &state.filters;

  let status = if state.results.is_settled() {
    fetched.status.clone()
  } else {
    LoadStatus::Loading
  };

  let collection_options = metadata
    .collections
    .iter()
    .filter(|collection| {
      filters.collection() == Some(collection.slug.as_str()) || facets.offers_collection(&collection.slug)
    })
    .cloned()
    .collect();

  let show_categories = filters.collection().is_some();
  let category_options = if show_categories {
    metadata
      .categories
      .iter()
      .filter(|category| {
        filters.category() == Some(category.slug.as_str()) || facets.offers_category(&category.slug)
      })
      .cloned()
      .collect()
  } else {
    Vec::new()
  };

  CatalogView {
    filters: filters.clone(),
    search_input: state.search_input.clone(),
    location_query: state.url.current_query().to_string(),
    items: fetched.page.items.clone(),
    total: fetched.page.total,
    status,
    pagination: Pagination::new(filters.page(), fetched.page.total, page_size),
    collection_options,
    category_options,
    show_categories,
    metadata_error: metadata.error.clone(),
  }
}
