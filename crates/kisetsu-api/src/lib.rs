//! Client for the Jikan anime metadata API.
//!
//! All requests pass through a [`RateGate`]; title searches additionally go
//! through a [`SearchSupersession`] so only the newest one can complete.

pub mod cancel;
pub mod client;
pub mod error;
pub mod filters;
pub mod rate_limit;
pub mod traits;
pub mod types;

pub use cancel::{SearchSupersession, SearchTicket};
pub use client::{ClientConfig, JikanClient};
pub use error::ApiError;
pub use filters::{AnimeRating, AnimeStatus, AnimeType, SearchFilters, SortOrder};
pub use rate_limit::RateGate;
pub use traits::{AnimeCatalog, AnimeSeason};
pub use types::{
    AnimeDetail, AnimeSummary, PaginationInfo, Recommendation, ResultPage, SeasonArchiveEntry,
};
