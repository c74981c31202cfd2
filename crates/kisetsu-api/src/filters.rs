//! Search filters: the server-side query parameters for title search and
//! the equivalent client-side predicate for season and top listings.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::AnimeSummary;

// ── Enums ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeType {
    Tv,
    Movie,
    Ova,
    Special,
    Ona,
    Music,
}

impl AnimeType {
    pub const ALL: &[AnimeType] = &[
        Self::Tv,
        Self::Movie,
        Self::Ova,
        Self::Special,
        Self::Ona,
        Self::Music,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tv => "tv",
            Self::Movie => "movie",
            Self::Ova => "ova",
            Self::Special => "special",
            Self::Ona => "ona",
            Self::Music => "music",
        }
    }
}

impl std::fmt::Display for AnimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tv => write!(f, "TV"),
            Self::Movie => write!(f, "Movie"),
            Self::Ova => write!(f, "OVA"),
            Self::Special => write!(f, "Special"),
            Self::Ona => write!(f, "ONA"),
            Self::Music => write!(f, "Music"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeStatus {
    Airing,
    Complete,
    Upcoming,
}

impl AnimeStatus {
    pub const ALL: &[AnimeStatus] = &[Self::Airing, Self::Complete, Self::Upcoming];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Airing => "airing",
            Self::Complete => "complete",
            Self::Upcoming => "upcoming",
        }
    }

    /// Status text as it appears on anime records.
    pub fn record_label(self) -> &'static str {
        match self {
            Self::Airing => "Currently Airing",
            Self::Complete => "Finished Airing",
            Self::Upcoming => "Not yet aired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeRating {
    G,
    Pg,
    Pg13,
    R17,
    R,
    Rx,
}

impl AnimeRating {
    pub const ALL: &[AnimeRating] = &[Self::G, Self::Pg, Self::Pg13, Self::R17, Self::R, Self::Rx];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::Pg => "pg",
            Self::Pg13 => "pg13",
            Self::R17 => "r17",
            Self::R => "r",
            Self::Rx => "rx",
        }
    }

    /// Code before the " - " in a record's rating, e.g. "PG-13" in
    /// "PG-13 - Teens 13 or older".
    fn record_code(self) -> &'static str {
        match self {
            Self::G => "G",
            Self::Pg => "PG",
            Self::Pg13 => "PG-13",
            Self::R17 => "R",
            Self::R => "R+",
            Self::Rx => "Rx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Genres offered by the filter panel (MAL genre ids).
pub const GENRES: &[(u32, &str)] = &[
    (1, "Action"),
    (2, "Adventure"),
    (4, "Comedy"),
    (8, "Drama"),
    (10, "Fantasy"),
    (14, "Horror"),
    (7, "Mystery"),
    (22, "Romance"),
    (24, "Sci-Fi"),
    (36, "Slice of Life"),
    (30, "Sports"),
    (37, "Supernatural"),
    (41, "Thriller"),
    (9, "Ecchi"),
    (49, "Isekai"),
    (62, "Iyashikei"),
];

// ── Filters ──────────────────────────────────────────────────────

/// Filter set for one request. Replaced wholesale on change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub kind: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    pub rating: Option<AnimeRating>,
    pub genres: BTreeSet<u32>,
    pub min_score: Option<f32>,
    pub order_by: Option<String>,
    pub sort: SortOrder,
}

impl SearchFilters {
    pub fn with_kind(mut self, kind: AnimeType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_status(mut self, status: AnimeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_rating(mut self, rating: AnimeRating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_genre(mut self, genre_id: u32) -> Self {
        self.genres.insert(genre_id);
        self
    }

    /// Minimum score, clamped to 0–10.
    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score.clamp(0.0, 10.0));
        self
    }

    pub fn with_order(mut self, order_by: impl Into<String>, sort: SortOrder) -> Self {
        self.order_by = Some(order_by.into());
        self.sort = sort;
        self
    }

    /// Add the genre if absent, remove it if present.
    pub fn toggle_genre(mut self, genre_id: u32) -> Self {
        if !self.genres.remove(&genre_id) {
            self.genres.insert(genre_id);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Query parameters for the search endpoint. Absent filters are omitted;
    /// `sort` is only sent alongside `order_by`.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(kind) = self.kind {
            pairs.push(("type", kind.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(rating) = self.rating {
            pairs.push(("rating", rating.as_str().to_string()));
        }
        if !self.genres.is_empty() {
            let ids: Vec<String> = self.genres.iter().map(|g| g.to_string()).collect();
            pairs.push(("genres", ids.join(",")));
        }
        if let Some(score) = self.min_score {
            pairs.push(("min_score", score.to_string()));
        }
        if let Some(ref order_by) = self.order_by {
            pairs.push(("order_by", order_by.clone()));
            pairs.push(("sort", self.sort.as_str().to_string()));
        }
        pairs
    }

    /// Client-side equivalent of the server filters. Every selected genre
    /// must be present; unscored entries fail a minimum score.
    pub fn matches(&self, anime: &AnimeSummary) -> bool {
        if let Some(kind) = self.kind {
            let same = anime
                .kind
                .as_deref()
                .is_some_and(|k| k.eq_ignore_ascii_case(kind.as_str()));
            if !same {
                return false;
            }
        }
        if let Some(status) = self.status {
            let same = anime
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(status.record_label()));
            if !same {
                return false;
            }
        }
        if let Some(rating) = self.rating {
            let same = anime
                .rating
                .as_deref()
                .and_then(|r| r.split(" - ").next())
                .is_some_and(|code| code.trim() == rating.record_code());
            if !same {
                return false;
            }
        }
        if !self.genres.iter().all(|&g| anime.has_genre(g)) {
            return false;
        }
        if let Some(min) = self.min_score {
            if !anime.score.is_some_and(|s| s >= min) {
                return false;
            }
        }
        true
    }

    /// Apply `order_by`/`sort` to an already fetched list. Unknown keys
    /// leave the service order untouched; missing values sort last.
    pub fn sort_in_place(&self, items: &mut [AnimeSummary]) {
        let Some(key) = self.order_by.as_deref() else {
            return;
        };
        let cmp: fn(&AnimeSummary, &AnimeSummary) -> Option<Ordering> = match key {
            "score" => |a, b| cmp_opt(a.score, b.score, |x, y| x.partial_cmp(y)),
            "episodes" => |a, b| cmp_opt(a.episodes, b.episodes, |x, y| Some(x.cmp(y))),
            "members" => |a, b| cmp_opt(a.members, b.members, |x, y| Some(x.cmp(y))),
            "popularity" => |a, b| cmp_opt(a.popularity, b.popularity, |x, y| Some(x.cmp(y))),
            "rank" => |a, b| cmp_opt(a.rank, b.rank, |x, y| Some(x.cmp(y))),
            "start_date" => |a, b| {
                cmp_opt(a.aired.from.as_deref(), b.aired.from.as_deref(), |x, y| {
                    Some(x.cmp(y))
                })
            },
            "title" => |a, b| Some(a.title.to_lowercase().cmp(&b.title.to_lowercase())),
            _ => return,
        };

        let sort = self.sort;
        items.sort_by(|a, b| match cmp(a, b) {
            // `None` marks "a or b has no value"; those always go last.
            None => missing_last(a, b, key),
            Some(ord) if sort == SortOrder::Desc => ord.reverse(),
            Some(ord) => ord,
        });
    }
}

/// Compare two optional values; `None` when either side is missing.
fn cmp_opt<T>(
    a: Option<T>,
    b: Option<T>,
    f: impl Fn(&T, &T) -> Option<Ordering>,
) -> Option<Ordering> {
    match (a, b) {
        (Some(x), Some(y)) => f(&x, &y),
        _ => None,
    }
}

fn missing_last(a: &AnimeSummary, b: &AnimeSummary, key: &str) -> Ordering {
    let has = |x: &AnimeSummary| match key {
        "score" => x.score.is_some(),
        "episodes" => x.episodes.is_some(),
        "members" => x.members.is_some(),
        "popularity" => x.popularity.is_some(),
        "rank" => x.rank.is_some(),
        "start_date" => x.aired.from.is_some(),
        _ => true,
    };
    has(b).cmp(&has(a))
}
