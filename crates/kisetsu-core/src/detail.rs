//! Single-anime lookups for the detail view. These do not go through the
//! result store; each caller owns its own loading state.

use kisetsu_api::{AnimeCatalog, AnimeDetail, ApiError};

/// Most related entries shown under a detail page.
pub const RELATED_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedEntry {
    pub id: u64,
    pub title: String,
    pub image_url: Option<String>,
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelatedAnime {
    pub entries: Vec<RelatedEntry>,
    /// Entries come from the top ranking, not from recommendations.
    pub is_fallback: bool,
}

/// Fetch the full record. A missing anime is an error here, unlike search.
pub async fn load_detail<C: AnimeCatalog>(catalog: &C, id: u64) -> Result<AnimeDetail, ApiError> {
    catalog.get_by_id(id).await
}

/// Anime to show alongside `id`: its recommendations, or the top ranking
/// when there are none. Never fails; a double failure yields an empty list.
pub async fn related_anime<C: AnimeCatalog>(catalog: &C, id: u64) -> RelatedAnime {
    match catalog.get_recommendations(id).await {
        Ok(recs) if !recs.is_empty() => {
            let entries = recs
                .into_iter()
                .filter(|r| r.entry.mal_id != id)
                .take(RELATED_LIMIT)
                .map(|r| RelatedEntry {
                    id: r.entry.mal_id,
                    image_url: r.entry.images.jpg.image_url,
                    title: r.entry.title,
                    score: None,
                })
                .collect();
            return RelatedAnime {
                entries,
                is_fallback: false,
            };
        }
        Ok(_) => tracing::debug!(id, "no recommendations, using top ranking"),
        Err(e) => tracing::warn!(id, error = %e, "recommendations failed, using top ranking"),
    }

    match catalog.get_top(RELATED_LIMIT as u32, 1).await {
        Ok(page) => RelatedAnime {
            entries: page
                .data
                .into_iter()
                .filter(|a| a.mal_id != id)
                .take(RELATED_LIMIT)
                .map(|a| RelatedEntry {
                    id: a.mal_id,
                    image_url: a.cover_url().map(str::to_string),
                    title: a.display_title().to_string(),
                    score: a.score,
                })
                .collect(),
            is_fallback: true,
        },
        Err(e) => {
            tracing::warn!(id, error = %e, "top ranking fallback failed");
            RelatedAnime {
                entries: Vec::new(),
                is_fallback: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[tokio::test(start_paused = true)]
    async fn test_load_detail_not_found_is_an_error() {
        let catalog = ScriptedCatalog::new(|call| match call {
            Call::Detail(1) => (ms(5), Ok(Reply::Detail(detail(1)))),
            _ => (ms(5), Err(ApiError::NotFound)),
        });
        let found = load_detail(&catalog, 1).await.unwrap();
        assert_eq!(found.summary.mal_id, 1);
        assert_eq!(found.studios.len(), 1);
        assert!(matches!(load_detail(&catalog, 2).await, Err(ApiError::NotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recommendations_exclude_self_and_cap() {
        let catalog = ScriptedCatalog::new(|call| match call {
            Call::Recommendations(_) => {
                let recs = (1..=15).map(recommendation).collect();
                (ms(5), Ok(Reply::Recommendations(recs)))
            }
            other => panic!("unexpected {other:?}"),
        });
        let related = related_anime(&catalog, 3).await;
        assert!(!related.is_fallback);
        assert_eq!(related.entries.len(), RELATED_LIMIT);
        assert!(related.entries.iter().all(|e| e.id != 3));
        assert_eq!(related.entries[2].id, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_recommendations_fall_back_to_top() {
        let catalog = ScriptedCatalog::new(|call| match call {
            Call::Recommendations(_) => (ms(5), Ok(Reply::Recommendations(Vec::new()))),
            Call::Top { .. } => (ms(5), Ok(Reply::Page(page_of_ids(1, 10, 1, 5)))),
            other => panic!("unexpected {other:?}"),
        });
        let related = related_anime(&catalog, 4).await;
        assert!(related.is_fallback);
        assert_eq!(related.entries.len(), 9);
        assert!(related.entries.iter().all(|e| e.id != 4));
        assert_eq!(related.entries[0].score, Some(7.0));
        assert_eq!(
            catalog.calls(),
            vec![Call::Recommendations(4), Call::Top { limit: 10, page: 1 }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_recommendations_fall_back_to_top() {
        let catalog = ScriptedCatalog::new(|call| match call {
            Call::Recommendations(_) => (ms(5), Err(ApiError::ServiceUnavailable { status: 503 })),
            Call::Top { .. } => (ms(5), Ok(Reply::Page(page_of_ids(20, 3, 1, 1)))),
            other => panic!("unexpected {other:?}"),
        });
        let related = related_anime(&catalog, 1).await;
        assert!(related.is_fallback);
        assert_eq!(related.entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![20, 21, 22]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_failure_is_empty() {
        let catalog = ScriptedCatalog::new(|_| (ms(5), Err(ApiError::RateLimited)));
        let related = related_anime(&catalog, 1).await;
        assert!(related.entries.is_empty());
    }
}
