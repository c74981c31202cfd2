//! A catalog that answers from a script, for driving the store and the
//! session under a paused clock.

use std::sync::Mutex;
use std::time::Duration;

use kisetsu_api::{
    AnimeCatalog, AnimeDetail, AnimeSeason, AnimeSummary, ApiError, PaginationInfo,
    Recommendation, ResultPage, SearchFilters, SeasonArchiveEntry,
};

/// A request as the catalog received it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search {
        query: String,
        page: u32,
        filters: SearchFilters,
    },
    Season {
        year: u32,
        season: AnimeSeason,
        page: u32,
    },
    Top {
        limit: u32,
        page: u32,
    },
    Detail(u64),
    Recommendations(u64),
    Seasons,
}

#[derive(Debug)]
pub enum Reply {
    Page(ResultPage),
    Detail(AnimeDetail),
    Recommendations(Vec<Recommendation>),
    Seasons(Vec<SeasonArchiveEntry>),
}

type Script = dyn Fn(&Call) -> (Duration, Result<Reply, ApiError>) + Send + Sync;

pub struct ScriptedCatalog {
    script: Box<Script>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedCatalog {
    /// `script` decides, per call, how long the answer takes and what it is.
    pub fn new(
        script: impl Fn(&Call) -> (Duration, Result<Reply, ApiError>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, call: Call) -> Result<Reply, ApiError> {
        self.calls.lock().unwrap().push(call.clone());
        let (delay, reply) = (self.script)(&call);
        tokio::time::sleep(delay).await;
        reply
    }

    async fn page(&self, call: Call) -> Result<ResultPage, ApiError> {
        match self.answer(call).await? {
            Reply::Page(page) => Ok(page),
            other => panic!("scripted {other:?} for a page request"),
        }
    }
}

impl AnimeCatalog for ScriptedCatalog {
    async fn search(
        &self,
        query: &str,
        page: u32,
        filters: &SearchFilters,
    ) -> Result<ResultPage, ApiError> {
        self.page(Call::Search {
            query: query.to_string(),
            page,
            filters: filters.clone(),
        })
        .await
    }

    async fn get_by_id(&self, id: u64) -> Result<AnimeDetail, ApiError> {
        match self.answer(Call::Detail(id)).await? {
            Reply::Detail(detail) => Ok(detail),
            other => panic!("scripted {other:?} for a detail request"),
        }
    }

    async fn get_by_season(
        &self,
        year: u32,
        season: AnimeSeason,
        page: u32,
    ) -> Result<ResultPage, ApiError> {
        self.page(Call::Season { year, season, page }).await
    }

    async fn get_top(&self, limit: u32, page: u32) -> Result<ResultPage, ApiError> {
        self.page(Call::Top { limit, page }).await
    }

    async fn get_recommendations(&self, id: u64) -> Result<Vec<Recommendation>, ApiError> {
        match self.answer(Call::Recommendations(id)).await? {
            Reply::Recommendations(recs) => Ok(recs),
            other => panic!("scripted {other:?} for a recommendations request"),
        }
    }

    async fn list_available_seasons(&self) -> Result<Vec<SeasonArchiveEntry>, ApiError> {
        match self.answer(Call::Seasons).await? {
            Reply::Seasons(seasons) => Ok(seasons),
            other => panic!("scripted {other:?} for a seasons request"),
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn anime(id: u64) -> AnimeSummary {
    anime_with(id, &[], Some(7.0))
}

pub fn anime_with(id: u64, genres: &[u32], score: Option<f32>) -> AnimeSummary {
    let genres: Vec<_> = genres
        .iter()
        .map(|g| serde_json::json!({ "mal_id": g, "name": format!("Genre {g}") }))
        .collect();
    serde_json::from_value(serde_json::json!({
        "mal_id": id,
        "title": format!("Anime {id}"),
        "score": score,
        "genres": genres,
    }))
    .unwrap()
}

pub fn detail(id: u64) -> AnimeDetail {
    serde_json::from_value(serde_json::json!({
        "mal_id": id,
        "title": format!("Anime {id}"),
        "studios": [{ "mal_id": 1, "name": "Studio" }],
    }))
    .unwrap()
}

pub fn recommendation(id: u64) -> Recommendation {
    serde_json::from_value(serde_json::json!({
        "entry": { "mal_id": id, "title": format!("Anime {id}") },
        "votes": 3,
    }))
    .unwrap()
}

/// A page holding `items`, numbered `current` of `last`.
pub fn page_of(items: Vec<AnimeSummary>, current: u32, last: u32) -> ResultPage {
    ResultPage {
        pagination: PaginationInfo {
            current_page: current,
            last_page: last,
            has_next_page: current < last,
            total_items: items.len() as u32 * last,
            per_page: items.len() as u32,
        },
        data: items,
    }
}

/// `count` consecutive ids starting at `first`, as page `current` of `last`.
pub fn page_of_ids(first: u64, count: u64, current: u32, last: u32) -> ResultPage {
    page_of((first..first + count).map(anime).collect(), current, last)
}

pub fn ids(items: &[AnimeSummary]) -> Vec<u64> {
    items.iter().map(|a| a.mal_id).collect()
}
