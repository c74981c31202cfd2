use std::fmt;

use url::Url;

use crate::error::CoreError;
use crate::query::SelectedSeason;

/// Base used to resolve relative route strings; never shown.
const ROUTE_BASE: &str = "app://kisetsu/";

/// A place in the UI: the browse/search home or an anime's detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home { season: Option<SelectedSeason> },
    Detail { id: u64 },
}

impl Route {
    /// Parse a path with optional query, e.g. `/?season=2025/fall` or
    /// `/anime/52991`. An unreadable season is dropped; an unreadable
    /// detail id is an error.
    pub fn parse(path_and_query: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidRoute(path_and_query.to_string());

        let base = Url::parse(ROUTE_BASE).map_err(|_| invalid())?;
        let url = base.join(path_and_query).map_err(|_| invalid())?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => {
                let season = url
                    .query_pairs()
                    .find(|(k, _)| k == "season")
                    .and_then(|(_, v)| SelectedSeason::parse_path(&v));
                Ok(Route::Home { season })
            }
            ["anime", id] => {
                let id = id.parse().map_err(|_| invalid())?;
                Ok(Route::Detail { id })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home { season: None } => write!(f, "/"),
            Route::Home { season: Some(s) } => write!(f, "/?season={}", s.to_path()),
            Route::Detail { id } => write!(f, "/anime/{id}"),
        }
    }
}
