//! Vector similarity and top-k ranking shared by the local vector stores.

use crate::document::{IndexEntry, SearchResult};

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude, the lengths differ, or
/// the result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a * norm_b);
    if score.is_finite() { score } else { 0.0 }
}

/// Score every entry against `query` and keep the `top_k` best.
///
/// The sort is stable, so equal scores keep insertion order. A NaN score
/// sorts after every real score.
pub(crate) fn rank<'a, I>(entries: I, query: &[f32], top_k: usize) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a IndexEntry>,
{
    let mut scored: Vec<(f32, &IndexEntry)> = entries
        .into_iter()
        .map(|e| {
            let score = cosine_similarity(&e.embedding, query);
            (if score.is_nan() { f32::NEG_INFINITY } else { score }, e)
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(top_k);
    scored
        .into_iter()
        .map(|(score, entry)| SearchResult { chunk: entry.chunk.clone(), score })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn zero_magnitude_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn mismatched_lengths_score_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn non_finite_components_score_zero() {
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn best_match_ranks_first_despite_nan_entry() {
        let entry = |text: &str, embedding: Vec<f32>| {
            let chunk = Chunk {
                id: format!("doc.txt#{text}"),
                text: text.to_string(),
                start_index: 0,
                page: 0,
                document: "doc.txt".to_string(),
                metadata: HashMap::new(),
            };
            IndexEntry::new(chunk, embedding)
        };
        let entries = vec![
            entry("low", vec![0.1, 1.0]),
            entry("nan", vec![f32::NAN, 1.0]),
            entry("high", vec![1.0, 0.0]),
        ];

        let results = rank(&entries, &[1.0, 0.0], 3);
        let order: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(order, vec!["high", "low", "nan"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
