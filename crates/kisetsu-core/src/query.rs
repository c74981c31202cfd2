use chrono::Datelike;
use serde::{Deserialize, Serialize};

use kisetsu_api::{AnimeSeason, SearchFilters};

/// A broadcast season picked for browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SelectedSeason {
    pub year: u32,
    pub season: AnimeSeason,
}

impl SelectedSeason {
    pub fn new(year: u32, season: AnimeSeason) -> Self {
        Self { year, season }
    }

    /// The season the calendar is in right now.
    pub fn current() -> Self {
        let now = chrono::Utc::now();
        Self::new(now.year() as u32, AnimeSeason::from_month(now.month()))
    }

    /// Parse the `<year>/<season>` form used in the `season` route parameter.
    pub fn parse_path(s: &str) -> Option<Self> {
        let (year, season) = s.split_once('/')?;
        Some(Self::new(year.trim().parse().ok()?, AnimeSeason::parse(season)?))
    }

    pub fn to_path(self) -> String {
        format!("{}/{}", self.year, self.season.as_str())
    }
}

impl std::fmt::Display for SelectedSeason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.season, self.year)
    }
}

/// What the result set is currently "about". Search text and a season can
/// never both be active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActiveQuery {
    #[default]
    None,
    Search(String),
    Season(SelectedSeason),
    /// The top ranking; used when nothing else is selected.
    Top,
}

impl ActiveQuery {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether filters are applied by the service (search) or to the
    /// fetched page (season and top listings).
    pub fn filters_server_side(&self) -> bool {
        matches!(self, Self::Search(_))
    }
}

/// The coordinator's working state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryState {
    /// Text as typed, before debouncing.
    pub raw_input: String,
    /// Trimmed text committed after the quiet period. Empty means no search.
    pub debounced_query: String,
    pub filters: SearchFilters,
    pub selected_season: Option<SelectedSeason>,
    pub current_page: u32,
}

impl QueryState {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            ..Default::default()
        }
    }

    /// The fetch mode this state selects. Search wins over a season.
    pub fn active(&self) -> ActiveQuery {
        if !self.debounced_query.is_empty() {
            ActiveQuery::Search(self.debounced_query.clone())
        } else if let Some(season) = self.selected_season {
            ActiveQuery::Season(season)
        } else {
            ActiveQuery::None
        }
    }
}
