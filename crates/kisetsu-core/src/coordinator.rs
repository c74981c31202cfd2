//! Turns user input into store commands.
//!
//! The coordinator owns no network access and no timers: callers pass the
//! current instant in and poll [`QueryCoordinator::commit_due`] once
//! [`QueryCoordinator::debounce_deadline`] has passed. Every transition
//! diffs against the committed state, so repeating an input is a no-op.

use std::time::Duration;

use tokio::time::Instant;

use kisetsu_api::SearchFilters;

use crate::query::{ActiveQuery, QueryState, SelectedSeason};

/// Quiet period before typed text is committed as a search.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// User input events.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    TextChanged(String),
    FiltersChanged(SearchFilters),
    SeasonSelected(SelectedSeason),
    SeasonCleared,
    PageRequested(u32),
    LoadMore,
    Retry,
}

/// What the result store should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    None,
    /// Fetch `page` of `query`, replacing the result set.
    Run {
        query: ActiveQuery,
        page: u32,
        filters: SearchFilters,
    },
    ChangePage(u32),
    LoadMore,
    /// Drop back to idle: no query, no results.
    Reset,
}

#[derive(Debug, Clone)]
struct PendingText {
    text: String,
    deadline: Instant,
}

pub struct QueryCoordinator {
    state: QueryState,
    pending: Option<PendingText>,
    debounce: Duration,
    /// Page count of the current result set, once a page has arrived.
    last_page: Option<u32>,
}

impl QueryCoordinator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: QueryState::new(),
            pending: None,
            debounce,
            last_page: None,
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// When the pending text should be committed, if any is pending.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Select a season without issuing a fetch (e.g. restored from a route).
    /// The fetch happens on [`initial_load`](Self::initial_load).
    pub fn preselect_season(&mut self, season: SelectedSeason) {
        self.state.selected_season = Some(season);
        self.state.debounced_query.clear();
        self.state.current_page = 1;
        self.last_page = None;
    }

    /// First fetch of a session. With nothing selected and nothing typed the
    /// `fallback` season is selected instead of leaving the view empty.
    pub fn initial_load(&mut self, fallback: SelectedSeason) -> Command {
        match self.state.active() {
            ActiveQuery::None if self.state.raw_input.trim().is_empty() => {
                tracing::debug!(season = %fallback, "selecting default season");
                self.select_season(fallback)
            }
            ActiveQuery::None => Command::None,
            query => Command::Run {
                query,
                page: self.state.current_page,
                filters: self.state.filters.clone(),
            },
        }
    }

    pub fn update(&mut self, msg: Message, now: Instant) -> Command {
        match msg {
            Message::TextChanged(text) => {
                self.state.raw_input = text.clone();
                self.pending = Some(PendingText {
                    text,
                    deadline: now + self.debounce,
                });
                Command::None
            }
            Message::SeasonSelected(season) => {
                if self.state.selected_season == Some(season)
                    && self.state.debounced_query.is_empty()
                    && self.pending.is_none()
                {
                    return Command::None;
                }
                self.select_season(season)
            }
            Message::SeasonCleared => {
                if self.state.selected_season.take().is_none() {
                    return Command::None;
                }
                self.state.current_page = 1;
                self.last_page = None;
                match self.state.active() {
                    ActiveQuery::None => Command::Reset,
                    _ => Command::None,
                }
            }
            Message::FiltersChanged(filters) => {
                if filters == self.state.filters {
                    return Command::None;
                }
                self.state.filters = filters;
                match self.state.active() {
                    ActiveQuery::None => Command::None,
                    query => {
                        self.state.current_page = 1;
                        self.last_page = None;
                        Command::Run {
                            query,
                            page: 1,
                            filters: self.state.filters.clone(),
                        }
                    }
                }
            }
            Message::PageRequested(page) => {
                let past_end = self.last_page.is_some_and(|last| page > last);
                if page == 0
                    || past_end
                    || page == self.state.current_page
                    || self.state.active().is_none()
                {
                    return Command::None;
                }
                self.state.current_page = page;
                Command::ChangePage(page)
            }
            Message::LoadMore => {
                if self.state.active().is_none() {
                    return Command::None;
                }
                Command::LoadMore
            }
            Message::Retry => match self.state.active() {
                ActiveQuery::None => Command::None,
                query => Command::Run {
                    query,
                    page: self.state.current_page,
                    filters: self.state.filters.clone(),
                },
            },
        }
    }

    /// Commit the pending text if its quiet period is over.
    pub fn commit_due(&mut self, now: Instant) -> Command {
        match self.pending.take() {
            Some(p) if p.deadline <= now => self.commit_text(&p.text),
            other => {
                self.pending = other;
                Command::None
            }
        }
    }

    /// Record the page the store actually settled on (after a load-more or
    /// a page jump resolved or failed).
    pub fn sync_page(&mut self, page: u32) {
        if page > 0 {
            self.state.current_page = page;
        }
    }

    /// Record how many pages the current result set has. Page requests
    /// past it are ignored until the query changes.
    pub fn sync_last_page(&mut self, last_page: u32) {
        self.last_page = Some(last_page);
    }

    fn commit_text(&mut self, text: &str) -> Command {
        let query = text.trim();

        if query.is_empty() {
            if self.state.debounced_query.is_empty() {
                return Command::None;
            }
            self.state.debounced_query.clear();
            self.state.current_page = 1;
            self.last_page = None;
            return match self.state.active() {
                ActiveQuery::None => Command::Reset,
                active => Command::Run {
                    query: active,
                    page: 1,
                    filters: self.state.filters.clone(),
                },
            };
        }

        if query == self.state.debounced_query {
            return Command::None;
        }

        tracing::debug!(query, "committing search text");
        self.state.debounced_query = query.to_string();
        self.state.selected_season = None;
        self.state.current_page = 1;
        self.last_page = None;
        Command::Run {
            query: ActiveQuery::Search(self.state.debounced_query.clone()),
            page: 1,
            filters: self.state.filters.clone(),
        }
    }

    fn select_season(&mut self, season: SelectedSeason) -> Command {
        self.pending = None;
        self.state.raw_input.clear();
        self.state.debounced_query.clear();
        self.state.selected_season = Some(season);
        self.state.current_page = 1;
        self.last_page = None;
        Command::Run {
            query: ActiveQuery::Season(season),
            page: 1,
            filters: self.state.filters.clone(),
        }
    }
}

impl Default for QueryCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
