//! The event loop behind one browsing window.
//!
//! A [`Session`] reads [`Message`]s from a channel, runs them through the
//! [`QueryCoordinator`], and drives the resulting store operations. Fetches
//! run concurrently in a `FuturesUnordered` so a newer input never waits
//! for an older fetch to land; the store's generation check decides which
//! answer wins.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use kisetsu_api::AnimeCatalog;

use crate::coordinator::{Command, QueryCoordinator};
use crate::query::SelectedSeason;
use crate::seasons::SeasonCatalog;
use crate::store::ResultStore;

pub use crate::coordinator::Message;

/// What a finished fetch reports back to the loop.
enum Settled {
    Done,
    /// A page move finished; the store now sits on this page.
    Page(u32),
}

pub struct Session<C> {
    coordinator: QueryCoordinator,
    store: Arc<ResultStore<C>>,
    seasons: Option<SeasonCatalog>,
    in_flight: FuturesUnordered<BoxFuture<'static, Settled>>,
}

impl<C: AnimeCatalog + 'static> Session<C> {
    pub fn new(store: Arc<ResultStore<C>>, debounce: Duration) -> Self {
        Self {
            coordinator: QueryCoordinator::new(debounce),
            store,
            seasons: None,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn store(&self) -> &Arc<ResultStore<C>> {
        &self.store
    }

    pub fn coordinator(&self) -> &QueryCoordinator {
        &self.coordinator
    }

    /// The season archive, once [`start`](Self::start) has loaded it.
    pub fn season_catalog(&self) -> Option<&SeasonCatalog> {
        self.seasons.as_ref()
    }

    /// Open on `season` instead of the default (e.g. from a route).
    pub fn preselect_season(&mut self, season: SelectedSeason) {
        self.coordinator.preselect_season(season);
    }

    /// Load the season archive and issue the first fetch. With nothing
    /// selected, the newest season offered so far is shown.
    pub async fn start(&mut self) {
        match SeasonCatalog::fetch(self.store.catalog().as_ref()).await {
            Ok(catalog) => self.seasons = Some(catalog),
            Err(e) => tracing::warn!(error = %e, "season catalog unavailable"),
        }
        let fallback = self
            .seasons
            .as_ref()
            .map(SeasonCatalog::default_season)
            .unwrap_or_else(SelectedSeason::current);

        let cmd = self.coordinator.initial_load(fallback);
        self.dispatch(cmd);
    }

    /// Handle one input event at `now`.
    pub fn handle(&mut self, msg: Message, now: Instant) {
        if let Message::PageRequested(page) = msg {
            let in_range = self.store.view().pagination.is_some_and(|p| p.contains(page));
            if !in_range {
                tracing::debug!(page, "ignoring page outside the result set");
                return;
            }
        }
        let cmd = self.coordinator.update(msg, now);
        self.dispatch(cmd);
    }

    /// Run until the message channel closes, then let in-flight fetches
    /// finish. Text still waiting out its quiet period is dropped.
    pub async fn run(mut self, mut messages: mpsc::Receiver<Message>) {
        self.start().await;

        loop {
            let deadline = self.coordinator.debounce_deadline();
            tokio::select! {
                msg = messages.recv() => match msg {
                    Some(msg) => self.handle(msg, Instant::now()),
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let cmd = self.coordinator.commit_due(Instant::now());
                    self.dispatch(cmd);
                }
                Some(settled) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.settle(settled);
                }
            }
        }

        while let Some(settled) = self.in_flight.next().await {
            self.settle(settled);
        }
        tracing::debug!("session closed");
    }

    fn dispatch(&mut self, cmd: Command) {
        let store = self.store.clone();
        let fut: BoxFuture<'static, Settled> = match cmd {
            Command::None => return,
            Command::Run {
                query,
                page,
                filters,
            } => Box::pin(async move {
                store.run_query(query, page, filters).await;
                Settled::Done
            }),
            Command::ChangePage(page) => Box::pin(async move {
                store.change_page(page).await;
                Settled::Page(store.view().current_page)
            }),
            Command::LoadMore => Box::pin(async move {
                store.load_more().await;
                Settled::Page(store.view().current_page)
            }),
            Command::Reset => Box::pin(async move {
                store.reset().await;
                Settled::Done
            }),
        };
        self.in_flight.push(fut);
    }

    fn settle(&mut self, settled: Settled) {
        if let Settled::Page(page) = settled {
            self.coordinator.sync_page(page);
        }
        if let Some(pagination) = self.store.view().pagination {
            self.coordinator.sync_last_page(pagination.last_page);
        }
    }
}
