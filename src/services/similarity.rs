use super::vectorizer::{TagVectorizer, TermVector};
use crate::error::AppResult;
use crate::models::Item;

/// Pairwise cosine similarity over every item of a catalog snapshot
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    scores: Vec<Vec<f64>>,
}

/// Cosine of the angle between two count vectors, 0.0 when either is empty
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let denominator = a.norm() * b.norm();
    if denominator == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denominator).clamp(0.0, 1.0)
}

/// Rows of the pairwise matrix for the items at `rows` only.
///
/// Each returned row matches `SimilarityMatrix::row` for the same index.
pub fn similarity_rows(items: &[Item], rows: &[usize], max_features: usize) -> AppResult<Vec<Vec<f64>>> {
    let tags: Vec<&str> = items.iter().map(|item| item.tags.as_str()).collect();
    let vectors = TagVectorizer::new(max_features).fit_transform(&tags)?;

    Ok(rows
        .iter()
        .map(|&i| {
            vectors
                .iter()
                .enumerate()
                .map(|(j, v)| if i == j { 1.0 } else { cosine_similarity(&vectors[i], v) })
                .collect()
        })
        .collect())
}

impl SimilarityMatrix {
    /// Vectorizes the tags of `items` and scores every pair
    pub fn from_items(items: &[Item], max_features: usize) -> AppResult<Self> {
        let tags: Vec<&str> = items.iter().map(|item| item.tags.as_str()).collect();
        let vectors = TagVectorizer::new(max_features).fit_transform(&tags)?;
        Ok(Self::from_vectors(&vectors))
    }

    /// Only the upper triangle is computed; the diagonal is exactly 1.0
    pub fn from_vectors(vectors: &[TermVector]) -> Self {
        let n = vectors.len();
        let mut scores = vec![vec![0.0; n]; n];

        for i in 0..n {
            scores[i][i] = 1.0;
            for j in (i + 1)..n {
                let score = cosine_similarity(&vectors[i], &vectors[j]);
                scores[i][j] = score;
                scores[j][i] = score;
            }
        }

        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.scores[index]
    }

    pub fn score(&self, a: usize, b: usize) -> f64 {
        self.scores[a][b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<Item> {
        vec![
            Item::new(1, "A", 2000, "action hero explosions"),
            Item::new(2, "B", 2000, "romance drama love"),
            Item::new(3, "C", 2000, "action spy explosions"),
            Item::new(4, "D", 2000, "the of and"),
        ]
    }

    #[test]
    fn test_self_similarity_is_one() {
        let matrix = SimilarityMatrix::from_items(&items(), 5000).unwrap();
        for i in 0..matrix.len() {
            assert_eq!(matrix.score(i, i), 1.0);
        }
    }

    #[test]
    fn test_symmetric() {
        let matrix = SimilarityMatrix::from_items(&items(), 5000).unwrap();
        for i in 0..matrix.len() {
            for j in 0..matrix.len() {
                assert_eq!(matrix.score(i, j), matrix.score(j, i));
            }
        }
    }

    #[test]
    fn test_scores_reflect_tag_overlap() {
        let matrix = SimilarityMatrix::from_items(&items(), 5000).unwrap();
        assert!((matrix.score(0, 2) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(matrix.score(0, 1), 0.0);
    }

    #[test]
    fn test_item_without_terms_scores_zero_against_others() {
        let matrix = SimilarityMatrix::from_items(&items(), 5000).unwrap();
        assert_eq!(matrix.row(3), &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rows_match_full_matrix() {
        let matrix = SimilarityMatrix::from_items(&items(), 5000).unwrap();
        let rows = similarity_rows(&items(), &[2, 0], 5000).unwrap();
        assert_eq!(rows[0], matrix.row(2));
        assert_eq!(rows[1], matrix.row(0));
    }

    #[test]
    fn test_scores_within_unit_interval() {
        let matrix = SimilarityMatrix::from_items(&items(), 5000).unwrap();
        for i in 0..matrix.len() {
            assert!(matrix.row(i).iter().all(|s| (0.0..=1.0).contains(s)));
        }
    }
}
