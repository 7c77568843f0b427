//! Nearest-neighbour lookup over the precomputed similarity matrix.
//!
//! Given an exact catalog name, returns the most similar *other* medicines in
//! descending score order. The queried medicine is excluded by index, so a
//! row whose self-score is not the maximum still never recommends itself.

use thiserror::Error;

use crate::catalog::SimilarityStore;

/// Number of alternatives returned per lookup.
pub const RECOMMENDATION_COUNT: usize = 5;

const PURCHASE_SEARCH_URL: &str = "https://pharmeasy.in/search/all?name=";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    #[error("Medicine not found: {0}")]
    NotFound(String),
}

/// One recommended alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// 1-based position in the result list.
    pub rank: usize,
    pub name: String,
    pub score: f64,
    pub purchase_url: String,
}

/// Top alternatives for `name`, by display name only.
pub fn recommend(store: &SimilarityStore, name: &str) -> Result<Vec<String>, RecommendError> {
    Ok(recommend_scored(store, name)?
        .into_iter()
        .map(|r| r.name)
        .collect())
}

/// Top alternatives for `name` with their scores and purchase links.
pub fn recommend_scored(
    store: &SimilarityStore,
    name: &str,
) -> Result<Vec<Recommendation>, RecommendError> {
    let catalog = store.catalog();
    let index = catalog
        .position_of(name)
        .ok_or_else(|| RecommendError::NotFound(name.to_string()))?;
    let row = store
        .matrix()
        .row(index)
        .ok_or_else(|| RecommendError::NotFound(name.to_string()))?;

    // Other entries sharing the queried name count as the same medicine.
    let mut ranked: Vec<(usize, f64)> = row
        .iter()
        .copied()
        .enumerate()
        .filter(|(col, _)| *col != index)
        .filter(|(col, _)| catalog.get(*col).is_some_and(|m| m.name != name))
        .collect();
    // Stable: equal scores keep catalog order. Scores are finite (checked at load).
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let results: Vec<Recommendation> = ranked
        .into_iter()
        .take(RECOMMENDATION_COUNT)
        .filter_map(|(col, score)| catalog.get(col).map(|m| (m.name.clone(), score)))
        .enumerate()
        .map(|(i, (name, score))| Recommendation {
            rank: i + 1,
            purchase_url: purchase_url(&name),
            name,
            score,
        })
        .collect();

    tracing::debug!(medicine = name, results = results.len(), "Recommendation lookup");
    Ok(results)
}

/// PharmEasy search link for a medicine name.
pub fn purchase_url(name: &str) -> String {
    let mut url = String::with_capacity(PURCHASE_SEARCH_URL.len() + name.len());
    url.push_str(PURCHASE_SEARCH_URL);
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                url.push(byte as char)
            }
            b' ' => url.push_str("%20"),
            other => url.push_str(&format!("%{other:02X}")),
        }
    }
    url
}
