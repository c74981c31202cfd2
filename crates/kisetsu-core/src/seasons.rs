use kisetsu_api::{AnimeCatalog, AnimeSeason, ApiError, SeasonArchiveEntry};

use crate::query::SelectedSeason;

/// The seasons the service can list, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonCatalog {
    seasons: Vec<SelectedSeason>,
}

impl SeasonCatalog {
    pub fn from_entries(entries: &[SeasonArchiveEntry]) -> Self {
        let mut seasons: Vec<SelectedSeason> = entries
            .iter()
            .flat_map(|e| e.seasons.iter().map(|&s| SelectedSeason::new(e.year, s)))
            .collect();
        seasons.sort_unstable_by(|a, b| b.cmp(a));
        seasons.dedup();
        Self { seasons }
    }

    pub async fn fetch<C: AnimeCatalog>(catalog: &C) -> Result<Self, ApiError> {
        let entries = catalog.list_available_seasons().await?;
        let catalog = Self::from_entries(&entries);
        tracing::debug!(seasons = catalog.seasons.len(), "loaded season catalog");
        Ok(catalog)
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    /// All offered seasons, newest first.
    pub fn all(&self) -> &[SelectedSeason] {
        &self.seasons
    }

    pub fn contains(&self, season: SelectedSeason) -> bool {
        self.seasons.binary_search_by(|s| season.cmp(s)).is_ok()
    }

    /// Years offering `season`, newest first. Feeds the per-season menus.
    pub fn by_season(&self, season: AnimeSeason) -> Vec<u32> {
        self.seasons
            .iter()
            .filter(|s| s.season == season)
            .map(|s| s.year)
            .collect()
    }

    /// The newest offered season that is not later than `limit`. The
    /// archive lists upcoming seasons too; those are skipped.
    pub fn latest_until(&self, limit: SelectedSeason) -> Option<SelectedSeason> {
        self.seasons.iter().copied().find(|&s| s <= limit)
    }

    /// The season to open with when nothing is selected.
    pub fn default_season(&self) -> SelectedSeason {
        let now = SelectedSeason::current();
        self.latest_until(now).unwrap_or(now)
    }
}
