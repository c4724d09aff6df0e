use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use super::catalog::Catalog;
use super::similarity::similarity_rows;
use super::vectorizer::DEFAULT_MAX_FEATURES;
use crate::{
    error::{AppError, AppResult},
    models::{ItemId, Recommendation, Strategy},
};

/// Produces the `top_k` best unseen items for a liked set
///
/// Implementations return exactly `min(top_k, candidates)` entries, where
/// candidates are the catalog items whose id is not in `liked`.
pub trait Ranker: Send + Sync {
    fn rank(&self, catalog: &Catalog, liked: &[ItemId], top_k: usize)
        -> AppResult<Vec<Recommendation>>;

    fn name(&self) -> &'static str;
}

/// How a candidate similar to several liked items is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorePolicy {
    /// Best similarity to any liked item
    Max,
    /// Similarities to all liked items added up
    Sum,
}

fn check_request(catalog: &Catalog, top_k: usize) -> AppResult<()> {
    if catalog.is_empty() {
        return Err(AppError::EmptyCatalog);
    }
    if top_k == 0 {
        return Err(AppError::InvalidInput("top_k must be at least 1".to_string()));
    }
    Ok(())
}

/// Uniform random sample of unseen items
#[derive(Debug, Clone, Default)]
pub struct RandomRanker {
    seed: Option<u64>,
}

impl RandomRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repeats the same sample for the same inputs
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl Ranker for RandomRanker {
    fn rank(
        &self,
        catalog: &Catalog,
        liked: &[ItemId],
        top_k: usize,
    ) -> AppResult<Vec<Recommendation>> {
        check_request(catalog, top_k)?;

        let picks = match self.seed {
            Some(seed) => catalog.sample(top_k, liked, &mut StdRng::seed_from_u64(seed)),
            None => catalog.sample(top_k, liked, &mut rand::thread_rng()),
        };

        Ok(picks
            .into_iter()
            .map(|item| Recommendation { item, score: None })
            .collect())
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Ranks unseen items by tag similarity to the liked set
#[derive(Debug, Clone)]
pub struct ContentRanker {
    policy: ScorePolicy,
    max_features: usize,
    fallback: RandomRanker,
}

impl ContentRanker {
    pub fn new(policy: ScorePolicy) -> Self {
        Self {
            policy,
            max_features: DEFAULT_MAX_FEATURES,
            fallback: RandomRanker::new(),
        }
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Ranker used when the liked set is empty
    pub fn with_fallback(mut self, fallback: RandomRanker) -> Self {
        self.fallback = fallback;
        self
    }

    /// Aggregated score per catalog index, `None` for liked items
    fn candidate_scores(
        &self,
        catalog: &Catalog,
        liked: &HashSet<ItemId>,
        liked_rows: &[Vec<f64>],
    ) -> Vec<Option<f64>> {
        let mut scores: Vec<Option<f64>> = catalog
            .items()
            .iter()
            .map(|item| (!liked.contains(&item.id)).then_some(0.0))
            .collect();

        for row in liked_rows {
            for (j, &similarity) in row.iter().enumerate() {
                if let Some(score) = scores[j].as_mut() {
                    *score = match self.policy {
                        ScorePolicy::Max => score.max(similarity),
                        ScorePolicy::Sum => *score + similarity,
                    };
                }
            }
        }
        scores
    }
}

impl Ranker for ContentRanker {
    fn rank(
        &self,
        catalog: &Catalog,
        liked: &[ItemId],
        top_k: usize,
    ) -> AppResult<Vec<Recommendation>> {
        check_request(catalog, top_k)?;

        if liked.is_empty() {
            tracing::debug!("Empty liked set, falling back to random ranking");
            return self.fallback.rank(catalog, liked, top_k);
        }

        let mut liked_indices = Vec::with_capacity(liked.len());
        for id in liked {
            let index = catalog.index_of(*id).ok_or(AppError::UnknownItem(*id))?;
            if !liked_indices.contains(&index) {
                liked_indices.push(index);
            }
        }

        let liked_ids: HashSet<ItemId> = liked.iter().copied().collect();
        let liked_rows = similarity_rows(catalog.items(), &liked_indices, self.max_features)?;

        // Index order is catalog order, so the stable sort breaks ties by first-seen
        let mut ranked: Vec<(usize, f64)> = self
            .candidate_scores(catalog, &liked_ids, &liked_rows)
            .into_iter()
            .enumerate()
            .filter_map(|(j, score)| score.map(|s| (j, s)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);

        if ranked.len() < top_k {
            tracing::debug!(
                requested = top_k,
                available = ranked.len(),
                "Fewer candidates than requested"
            );
        }

        let items = catalog.items();
        Ok(ranked
            .into_iter()
            .map(|(j, score)| Recommendation {
                item: items[j].clone(),
                score: Some(score),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        match self.policy {
            ScorePolicy::Max => "content",
            ScorePolicy::Sum => "content_rank",
        }
    }
}

impl Strategy {
    /// Concrete ranker behind this strategy
    pub fn ranker(self, max_features: usize) -> Box<dyn Ranker> {
        match self {
            Strategy::Random => Box::new(RandomRanker::new()),
            Strategy::Content => {
                Box::new(ContentRanker::new(ScorePolicy::Max).with_max_features(max_features))
            }
            Strategy::ContentRank => {
                Box::new(ContentRanker::new(ScorePolicy::Sum).with_max_features(max_features))
            }
        }
    }
}
