//! The result set shown to the user, and the fetches that fill it.
//!
//! Every dispatch bumps a generation counter and remembers the value it was
//! issued under. A response is applied only if no newer dispatch happened
//! in the meantime, so a slow answer for an old query can never overwrite
//! a newer one.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex};

use kisetsu_api::{
    AnimeCatalog, AnimeSummary, ApiError, PaginationInfo, ResultPage, SearchFilters,
};

use crate::query::ActiveQuery;

/// Page size used for the top ranking.
pub const TOP_PAGE_SIZE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

/// Everything a renderer needs to draw the result list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub results: Vec<AnimeSummary>,
    pub pagination: Option<PaginationInfo>,
    pub loading: bool,
    /// User-facing message for the last failed fetch.
    pub error: Option<String>,
    pub status: FetchStatus,
    pub query: ActiveQuery,
    pub current_page: u32,
    /// Bumped on every page jump; the renderer scrolls to top when it changes.
    pub scroll_epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Replace,
    Append,
}

struct Inner {
    view: ViewState,
    filters: SearchFilters,
    generation: u64,
}

/// A fetch decided under the lock, executed outside it.
struct Dispatch {
    generation: u64,
    query: ActiveQuery,
    page: u32,
    filters: SearchFilters,
    merge: Merge,
}

pub struct ResultStore<C> {
    catalog: Arc<C>,
    inner: Mutex<Inner>,
    published: watch::Sender<ViewState>,
}

impl<C: AnimeCatalog> ResultStore<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        let (published, _) = watch::channel(ViewState::default());
        Self {
            catalog,
            inner: Mutex::new(Inner {
                view: ViewState::default(),
                filters: SearchFilters::default(),
                generation: 0,
            }),
            published,
        }
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ViewState {
        self.published.borrow().clone()
    }

    /// Receives every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.published.subscribe()
    }

    /// Fetch `page` of `query` and replace the result set with it. A new
    /// query identity clears the visible results immediately.
    pub async fn run_query(&self, query: ActiveQuery, page: u32, filters: SearchFilters) {
        if query.is_none() {
            self.reset().await;
            return;
        }

        let dispatch = {
            let mut inner = self.inner.lock().await;
            if inner.view.query != query {
                inner.view.results.clear();
                inner.view.pagination = None;
            }
            inner.view.query = query.clone();
            inner.view.current_page = page.max(1);
            inner.filters = filters;
            self.begin(&mut inner, page.max(1), Merge::Replace)
        };
        self.execute(dispatch).await;
    }

    /// Append the next page. Returns `false` (and does nothing) unless a
    /// next page exists and no fetch is running.
    pub async fn load_more(&self) -> bool {
        let dispatch = {
            let mut inner = self.inner.lock().await;
            let has_next = inner.view.pagination.is_some_and(|p| p.has_next_page);
            if !has_next || inner.view.loading || inner.view.query.is_none() {
                tracing::debug!(has_next, loading = inner.view.loading, "load more ignored");
                return false;
            }
            let next = inner.view.current_page + 1;
            self.begin(&mut inner, next, Merge::Append)
        };
        self.execute(dispatch).await;
        true
    }

    /// Jump to `page`, replacing the result set. Returns `false` for pages
    /// outside `1..=last_page`.
    pub async fn change_page(&self, page: u32) -> bool {
        let dispatch = {
            let mut inner = self.inner.lock().await;
            let in_range = inner.view.pagination.is_some_and(|p| p.contains(page));
            if !in_range || inner.view.query.is_none() {
                tracing::debug!(page, "page out of range");
                return false;
            }
            inner.view.scroll_epoch += 1;
            self.begin(&mut inner, page, Merge::Replace)
        };
        self.execute(dispatch).await;
        true
    }

    /// Re-run the current query at the current page.
    pub async fn retry(&self) -> bool {
        let dispatch = {
            let mut inner = self.inner.lock().await;
            if inner.view.query.is_none() {
                return false;
            }
            let page = inner.view.current_page.max(1);
            self.begin(&mut inner, page, Merge::Replace)
        };
        self.execute(dispatch).await;
        true
    }

    /// Back to idle. Anything still in flight is discarded when it lands.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        let scroll_epoch = inner.view.scroll_epoch;
        inner.view = ViewState {
            scroll_epoch,
            ..ViewState::default()
        };
        self.publish(&inner);
    }

    fn begin(&self, inner: &mut Inner, page: u32, merge: Merge) -> Dispatch {
        inner.generation += 1;
        inner.view.loading = true;
        inner.view.error = None;
        inner.view.status = FetchStatus::Loading;
        self.publish(inner);

        tracing::debug!(
            generation = inner.generation,
            query = ?inner.view.query,
            page,
            ?merge,
            "dispatching fetch"
        );
        Dispatch {
            generation: inner.generation,
            query: inner.view.query.clone(),
            page,
            filters: inner.filters.clone(),
            merge,
        }
    }

    async fn execute(&self, dispatch: Dispatch) {
        let result = self.fetch(&dispatch).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != dispatch.generation {
            tracing::debug!(
                generation = dispatch.generation,
                current = inner.generation,
                "discarding stale response"
            );
            return;
        }

        match result {
            Ok(page) => apply_page(&mut inner.view, &dispatch, page),
            Err(e) if e.is_cancelled() => {
                // Nothing newer was dispatched through this store, but the
                // catalog dropped the request. Keep what is shown; the query
                // stays active, so this is not Idle.
                tracing::debug!(generation = dispatch.generation, "fetch cancelled");
                inner.view.loading = false;
                inner.view.status = FetchStatus::Success;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    query = ?dispatch.query,
                    page = dispatch.page,
                    "fetch failed"
                );
                inner.view.loading = false;
                inner.view.error = Some(e.user_message());
                inner.view.status = FetchStatus::Failed;
            }
        }
        self.publish(&inner);
    }

    async fn fetch(&self, dispatch: &Dispatch) -> Result<ResultPage, ApiError> {
        let page = dispatch.page;
        let mut result = match &dispatch.query {
            ActiveQuery::Search(text) => self.catalog.search(text, page, &dispatch.filters).await?,
            ActiveQuery::Season(s) => self.catalog.get_by_season(s.year, s.season, page).await?,
            ActiveQuery::Top => self.catalog.get_top(TOP_PAGE_SIZE, page).await?,
            ActiveQuery::None => ResultPage::empty(page),
        };

        // Listings have no server-side filters; narrow the fetched page.
        if !dispatch.query.filters_server_side() {
            result.data.retain(|a| dispatch.filters.matches(a));
            dispatch.filters.sort_in_place(&mut result.data);
        }
        Ok(result)
    }

    fn publish(&self, inner: &Inner) {
        self.published.send_replace(inner.view.clone());
    }
}

fn apply_page(view: &mut ViewState, dispatch: &Dispatch, page: ResultPage) {
    match dispatch.merge {
        Merge::Replace => view.results = page.data,
        Merge::Append => {
            let mut seen: HashSet<u64> = view.results.iter().map(|a| a.mal_id).collect();
            let fresh = page.data.into_iter().filter(|a| seen.insert(a.mal_id));
            view.results.extend(fresh);
        }
    }
    view.pagination = Some(page.pagination);
    view.current_page = dispatch.page;
    view.loading = false;
    view.error = None;
    view.status = FetchStatus::Success;
}
