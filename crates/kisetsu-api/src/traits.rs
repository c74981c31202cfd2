//! Trait definitions for the remote anime catalog.
//!
//! `JikanClient` implements [`AnimeCatalog`]; the result store and session
//! are generic over it so they can run against a scripted catalog in tests.

use std::future::Future;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::filters::SearchFilters;
use crate::types::{AnimeDetail, Recommendation, ResultPage, SeasonArchiveEntry};

/// Read-only access to a remote anime metadata service.
pub trait AnimeCatalog: Send + Sync {
    /// Filtered title search. At most one search is in flight per catalog;
    /// starting a new one resolves the previous with
    /// [`ApiError::RequestCancelled`]. A 404 is an empty page, not an error.
    fn search(
        &self,
        query: &str,
        page: u32,
        filters: &SearchFilters,
    ) -> impl Future<Output = Result<ResultPage, ApiError>> + Send;

    /// Full detail record for one anime.
    fn get_by_id(&self, id: u64) -> impl Future<Output = Result<AnimeDetail, ApiError>> + Send;

    /// One page of a broadcast season.
    fn get_by_season(
        &self,
        year: u32,
        season: AnimeSeason,
        page: u32,
    ) -> impl Future<Output = Result<ResultPage, ApiError>> + Send;

    /// One page of the top ranking.
    fn get_top(
        &self,
        limit: u32,
        page: u32,
    ) -> impl Future<Output = Result<ResultPage, ApiError>> + Send;

    /// User recommendations for an anime.
    fn get_recommendations(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Vec<Recommendation>, ApiError>> + Send;

    /// Every year the service has season listings for.
    fn list_available_seasons(
        &self,
    ) -> impl Future<Output = Result<Vec<SeasonArchiveEntry>, ApiError>> + Send;
}

/// Anime season (quarter of the year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeSeason {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl AnimeSeason {
    pub const ALL: &[AnimeSeason] = &[Self::Winter, Self::Spring, Self::Summer, Self::Fall];

    /// Path segment used by the season endpoints.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
        }
    }

    /// Parse an upstream season name. Case-insensitive; "autumn" is accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Some(Self::Winter),
            "spring" => Some(Self::Spring),
            "summer" => Some(Self::Summer),
            "fall" | "autumn" => Some(Self::Fall),
            _ => None,
        }
    }

    /// Season a calendar month (1-12) falls in.
    pub fn from_month(month: u32) -> Self {
        match month {
            1..=3 => Self::Winter,
            4..=6 => Self::Spring,
            7..=9 => Self::Summer,
            _ => Self::Fall,
        }
    }

    /// Determine the current anime season from the current month.
    pub fn current() -> Self {
        Self::from_month(chrono::Utc::now().month())
    }
}

impl std::fmt::Display for AnimeSeason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Winter => write!(f, "Winter"),
            Self::Spring => write!(f, "Spring"),
            Self::Summer => write!(f, "Summer"),
            Self::Fall => write!(f, "Fall"),
        }
    }
}

impl std::str::FromStr for AnimeSeason {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ApiError::InvalidResponse(format!("unknown season '{s}'")))
    }
}
