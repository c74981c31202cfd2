use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::traits::AnimeSeason;

// ── Anime records ────────────────────────────────────────────────

/// Read-only projection of one anime as returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    pub mal_id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub images: AnimeImages,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub source: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    #[serde(default)]
    pub airing: bool,
    #[serde(default)]
    pub aired: Aired,
    pub duration: Option<String>,
    pub rating: Option<String>,
    pub score: Option<f32>,
    pub scored_by: Option<u64>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u64>,
    pub favorites: Option<u64>,
    pub synopsis: Option<String>,
    pub season: Option<String>,
    pub year: Option<u32>,
    #[serde(default)]
    pub genres: Vec<NamedResource>,
}

impl AnimeSummary {
    /// English title when the service has one, otherwise the default title.
    pub fn display_title(&self) -> &str {
        self.title_english.as_deref().unwrap_or(&self.title)
    }

    /// Best available cover image.
    pub fn cover_url(&self) -> Option<&str> {
        self.images.jpg.large_image_url.as_deref().or(self.images.jpg.image_url.as_deref())
    }

    pub fn has_genre(&self, genre_id: u32) -> bool {
        self.genres.iter().any(|g| g.mal_id == genre_id)
    }
}

/// Full detail record (`/anime/{id}/full`): the summary plus extra fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetail {
    #[serde(flatten)]
    pub summary: AnimeSummary,
    pub background: Option<String>,
    #[serde(default)]
    pub title_synonyms: Vec<String>,
    pub trailer: Option<Trailer>,
    pub broadcast: Option<Broadcast>,
    #[serde(default)]
    pub producers: Vec<NamedResource>,
    #[serde(default)]
    pub licensors: Vec<NamedResource>,
    #[serde(default)]
    pub studios: Vec<NamedResource>,
    #[serde(default)]
    pub themes: Vec<NamedResource>,
    #[serde(default)]
    pub demographics: Vec<NamedResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeImages {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: ImageSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aired {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "string")]
    pub label: Option<String>,
}

/// Genre, studio, producer or theme: anything the service names by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub mal_id: u32,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    pub youtube_id: Option<String>,
    pub url: Option<String>,
    pub embed_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub day: Option<String>,
    pub time: Option<String>,
    pub timezone: Option<String>,
    #[serde(rename = "string")]
    pub label: Option<String>,
}

// ── Pages ────────────────────────────────────────────────────────

/// Pagination metadata normalised from the service envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub last_page: u32,
    pub has_next_page: bool,
    pub total_items: u32,
    pub per_page: u32,
}

impl PaginationInfo {
    /// Whether `page` is a valid jump target.
    pub fn contains(&self, page: u32) -> bool {
        (1..=self.last_page).contains(&page)
    }

    /// Page numbers for a pager strip: at most `max_visible` pages centred
    /// on `current`, clamped to `1..=last_page`.
    pub fn visible_pages(&self, current: u32, max_visible: u32) -> Vec<u32> {
        if self.last_page == 0 || max_visible == 0 {
            return Vec::new();
        }
        let current = current.clamp(1, self.last_page);
        let mut start = current.saturating_sub(max_visible / 2).max(1);
        let end = (start + max_visible - 1).min(self.last_page);
        if end - start < max_visible - 1 {
            start = end.saturating_sub(max_visible - 1).max(1);
        }
        (start..=end).collect()
    }
}

/// The outcome of one page fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub data: Vec<AnimeSummary>,
    pub pagination: PaginationInfo,
}

impl ResultPage {
    /// A valid page with no results (what a search 404 resolves to).
    pub fn empty(page: u32) -> Self {
        Self {
            data: Vec::new(),
            pagination: PaginationInfo {
                current_page: page,
                last_page: page.max(1),
                has_next_page: false,
                total_items: 0,
                per_page: 0,
            },
        }
    }
}

// ── Other payloads ───────────────────────────────────────────────

/// One entry of `/anime/{id}/recommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub entry: RecommendedEntry,
    #[serde(default)]
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedEntry {
    pub mal_id: u64,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub images: AnimeImages,
}

/// A year of the seasons archive and the seasons offered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonArchiveEntry {
    pub year: u32,
    pub seasons: Vec<AnimeSeason>,
}

// ── Wire envelopes ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Vec<T>,
    pagination: Option<WirePagination>,
}

#[derive(Debug, Deserialize)]
struct SingleEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct WirePagination {
    current_page: Option<u32>,
    last_visible_page: u32,
    has_next_page: bool,
    items: Option<WirePaginationItems>,
}

#[derive(Debug, Deserialize)]
struct WirePaginationItems {
    #[serde(default)]
    total: u32,
    #[serde(default)]
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct WireArchiveYear {
    year: u32,
    #[serde(default)]
    seasons: Vec<String>,
}

/// Upstream failure body: `{message?, error?}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}

fn invalid(e: serde_json::Error) -> ApiError {
    ApiError::InvalidResponse(e.to_string())
}

/// Decode a paged list response. A missing `pagination` block is treated
/// as a single, final page.
pub fn parse_page(body: &[u8], requested_page: u32) -> Result<ResultPage, ApiError> {
    let envelope: ListEnvelope<AnimeSummary> = serde_json::from_slice(body).map_err(invalid)?;
    let count = envelope.data.len() as u32;

    let pagination = match envelope.pagination {
        Some(p) => {
            let items = p.items.unwrap_or(WirePaginationItems {
                total: count,
                per_page: count,
            });
            PaginationInfo {
                current_page: p.current_page.unwrap_or(requested_page),
                last_page: p.last_visible_page,
                has_next_page: p.has_next_page,
                total_items: items.total,
                per_page: items.per_page,
            }
        }
        None => PaginationInfo {
            current_page: requested_page,
            last_page: requested_page.max(1),
            has_next_page: false,
            total_items: count,
            per_page: count,
        },
    };

    Ok(ResultPage {
        data: envelope.data,
        pagination,
    })
}

/// Decode a `{data: T}` response.
pub fn parse_single<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let envelope: SingleEnvelope<T> = serde_json::from_slice(body).map_err(invalid)?;
    Ok(envelope.data)
}

/// Decode a `{data: [T]}` response, ignoring any pagination block.
pub fn parse_list<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, ApiError> {
    let envelope: SingleEnvelope<Vec<T>> = serde_json::from_slice(body).map_err(invalid)?;
    Ok(envelope.data)
}

/// Decode the seasons archive. Season names the client does not know are
/// dropped rather than failing the whole payload.
pub fn parse_season_archive(body: &[u8]) -> Result<Vec<SeasonArchiveEntry>, ApiError> {
    let years: Vec<WireArchiveYear> = parse_list(body)?;
    Ok(years
        .into_iter()
        .map(|y| {
            let mut seasons: Vec<AnimeSeason> =
                y.seasons.iter().filter_map(|s| AnimeSeason::parse(s)).collect();
            seasons.sort();
            seasons.dedup();
            SeasonArchiveEntry {
                year: y.year,
                seasons,
            }
        })
        .collect())
}

/// Pull the human-readable text out of an error body, if there is one.
pub fn error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    envelope
        .message
        .or(envelope.error)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"{
        "pagination": {
            "last_visible_page": 4,
            "has_next_page": true,
            "current_page": 1,
            "items": { "count": 2, "total": 80, "per_page": 25 }
        },
        "data": [
            {
                "mal_id": 20,
                "url": "https://myanimelist.net/anime/20/Naruto",
                "images": {
                    "jpg": {
                        "image_url": "https://cdn.myanimelist.net/images/anime/13/17405.jpg",
                        "small_image_url": null,
                        "large_image_url": "https://cdn.myanimelist.net/images/anime/13/17405l.jpg"
                    }
                },
                "title": "Naruto",
                "title_english": "Naruto",
                "type": "TV",
                "episodes": 220,
                "status": "Finished Airing",
                "airing": false,
                "aired": { "from": "2002-10-03T00:00:00+00:00", "to": "2007-02-08T00:00:00+00:00", "string": "Oct 3, 2002 to Feb 8, 2007" },
                "rating": "PG-13 - Teens 13 or older",
                "score": 8.0,
                "members": 2900000,
                "season": "fall",
                "year": 2002,
                "genres": [
                    { "mal_id": 1, "type": "anime", "name": "Action", "url": "" },
                    { "mal_id": 2, "type": "anime", "name": "Adventure", "url": "" }
                ]
            },
            { "mal_id": 1735, "title": "Naruto: Shippuuden", "episodes": null, "score": null }
        ]
    }"#;

    #[test]
    fn test_parse_search_page() {
        let page = parse_page(SEARCH_BODY.as_bytes(), 1).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.pagination.last_page, 4);
        assert!(page.pagination.has_next_page);
        assert_eq!(page.pagination.total_items, 80);
        assert_eq!(page.pagination.per_page, 25);

        let naruto = &page.data[0];
        assert_eq!(naruto.mal_id, 20);
        assert_eq!(naruto.kind.as_deref(), Some("TV"));
        assert_eq!(naruto.episodes, Some(220));
        assert!(naruto.has_genre(1));
        assert!(!naruto.has_genre(4));
        assert_eq!(
            naruto.cover_url(),
            Some("https://cdn.myanimelist.net/images/anime/13/17405l.jpg")
        );
        assert_eq!(naruto.aired.label.as_deref(), Some("Oct 3, 2002 to Feb 8, 2007"));

        let shippuuden = &page.data[1];
        assert!(shippuuden.episodes.is_none());
        assert!(shippuuden.score.is_none());
        assert!(shippuuden.genres.is_empty());
        assert!(shippuuden.cover_url().is_none());
    }

    #[test]
    fn test_missing_data_array_is_invalid() {
        let err = parse_page(br#"{"pagination": null}"#, 1).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));

        let err = parse_page(br#"{"data": {"mal_id": 1}}"#, 1).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));

        let err = parse_page(b"<html>oops</html>", 1).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_record_without_id_rejects_whole_payload() {
        let err = parse_page(br#"{"data": [{"title": "No id"}]}"#, 1).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_missing_pagination_is_single_page() {
        let page = parse_page(br#"{"data": [{"mal_id": 5, "title": "A"}]}"#, 3).unwrap();
        assert_eq!(page.pagination.current_page, 3);
        assert_eq!(page.pagination.last_page, 3);
        assert!(!page.pagination.has_next_page);
        assert_eq!(page.pagination.total_items, 1);
    }

    #[test]
    fn test_parse_detail_keeps_summary_fields() {
        let body = r#"{ "data": {
            "mal_id": 52991,
            "title": "Sousou no Frieren",
            "title_english": "Frieren: Beyond Journey's End",
            "type": "TV",
            "score": 9.3,
            "background": "Won several awards.",
            "title_synonyms": ["Frieren at the Funeral"],
            "studios": [{ "mal_id": 11, "type": "anime", "name": "Madhouse", "url": "" }],
            "broadcast": { "day": "Fridays", "time": "23:00", "timezone": "Asia/Tokyo", "string": "Fridays at 23:00 (JST)" }
        } }"#;
        let detail: AnimeDetail = parse_single(body.as_bytes()).unwrap();
        assert_eq!(detail.summary.mal_id, 52991);
        assert_eq!(detail.summary.display_title(), "Frieren: Beyond Journey's End");
        assert_eq!(detail.studios[0].name, "Madhouse");
        assert_eq!(detail.title_synonyms.len(), 1);
        assert!(detail.trailer.is_none());
    }

    #[test]
    fn test_parse_recommendations() {
        let body = r#"{ "data": [
            { "entry": { "mal_id": 33352, "url": "", "images": {}, "title": "Violet Evergarden" }, "url": "", "votes": 42 }
        ] }"#;
        let recs: Vec<Recommendation> = parse_list(body.as_bytes()).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].entry.mal_id, 33352);
        assert_eq!(recs[0].votes, 42);
    }

    #[test]
    fn test_parse_season_archive_skips_unknown_names() {
        let body = r#"{ "pagination": { "last_visible_page": 1, "has_next_page": false },
            "data": [
                { "year": 2025, "seasons": ["fall", "summer", "spring", "winter"] },
                { "year": 1917, "seasons": ["winter", "monsoon"] }
            ] }"#;
        let archive = parse_season_archive(body.as_bytes()).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(
            archive[0].seasons,
            vec![
                AnimeSeason::Winter,
                AnimeSeason::Spring,
                AnimeSeason::Summer,
                AnimeSeason::Fall
            ]
        );
        assert_eq!(archive[1].seasons, vec![AnimeSeason::Winter]);
    }

    #[test]
    fn test_error_message_envelope() {
        assert_eq!(
            error_message(r#"{"status": 400, "message": "Invalid page"}"#).as_deref(),
            Some("Invalid page")
        );
        assert_eq!(
            error_message(r#"{"error": "BadRequestException"}"#).as_deref(),
            Some("BadRequestException")
        );
        assert!(error_message(r#"{"message": "  "}"#).is_none());
        assert!(error_message("Bad Gateway").is_none());
    }

    #[test]
    fn test_visible_pages_window() {
        let info = PaginationInfo {
            current_page: 1,
            last_page: 10,
            has_next_page: true,
            total_items: 250,
            per_page: 25,
        };
        assert_eq!(info.visible_pages(1, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(info.visible_pages(6, 5), vec![4, 5, 6, 7, 8]);
        assert_eq!(info.visible_pages(10, 5), vec![6, 7, 8, 9, 10]);
        assert_eq!(info.visible_pages(40, 5), vec![6, 7, 8, 9, 10]);

        let short = PaginationInfo { last_page: 3, ..info };
        assert_eq!(short.visible_pages(2, 5), vec![1, 2, 3]);
        assert!(short.contains(3));
        assert!(!short.contains(0));
        assert!(!short.contains(4));
    }
}
