//! Brute-force nearest-neighbour search over a [`VectorArena`].
//!
//! # Ranking
//!
//! 1. Score every arena entry with cosine similarity against the query.
//! 2. Sort by score (desc), then by [`DocId`] (asc, i.e. load order).
//! 3. Truncate to `min(k, len)`.

use std::cmp::Ordering;

use crate::embedding::cosine_similarity;
use crate::models::Document;
use crate::store::{DocId, VectorArena};

/// A document returned from a similarity query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredDocument<'a> {
    pub id: DocId,
    pub document: &'a Document,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f32,
}

/// Return the `k` entries most similar to `query`, best first.
///
/// `k` is clamped to the arena size. NaN scores compare as equal, so the
/// load-order tie-break still applies.
pub fn top_k<'a>(arena: &'a VectorArena, query: &[f32], k: usize) -> Vec<ScoredDocument<'a>> {
    let k = k.min(arena.len());
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredDocument<'a>> = arena
        .iter()
        .map(|(id, document, vector)| ScoredDocument {
            id,
            document,
            score: cosine_similarity(query, vector),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(vectors: &[(&str, Vec<f32>)]) -> VectorArena {
        let mut arena = VectorArena::with_capacity(2, vectors.len());
        for (path, v) in vectors {
            arena.push(Document::new(*path, ""), v.clone()).unwrap();
        }
        arena
    }

    #[test]
    fn test_sorted_by_descending_score() {
        let arena = arena(&[
            ("far", vec![0.0, 1.0]),
            ("near", vec![1.0, 0.1]),
            ("mid", vec![1.0, 1.0]),
        ]);
        let hits = top_k(&arena, &[1.0, 0.0], 3);
        let paths: Vec<&str> = hits.iter().map(|h| h.document.path()).collect();
        assert_eq!(paths, vec!["near", "mid", "far"]);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_k_clamped_to_len() {
        let arena = arena(&[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]);
        assert_eq!(top_k(&arena, &[1.0, 0.0], 10).len(), 2);
        assert_eq!(top_k(&arena, &[1.0, 0.0], 1).len(), 1);
        assert!(top_k(&arena, &[1.0, 0.0], 0).is_empty());
    }

    #[test]
    fn test_ties_broken_by_load_order() {
        let arena = arena(&[
            ("first", vec![1.0, 0.0]),
            ("second", vec![2.0, 0.0]),
            ("third", vec![3.0, 0.0]),
        ]);
        let hits = top_k(&arena, &[1.0, 0.0], 3);
        let paths: Vec<&str> = hits.iter().map(|h| h.document.path()).collect();
        assert_eq!(paths, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_zero_query_keeps_load_order() {
        let arena = arena(&[("x", vec![0.0, 1.0]), ("y", vec![1.0, 0.0])]);
        let hits = top_k(&arena, &[0.0, 0.0], 2);
        assert_eq!(hits[0].document.path(), "x");
        assert_eq!(hits[0].score, 0.0);
    }
}
