//! Weighted merge of documentation and code hits.
use std::collections::HashMap;

use ragdb_core::types::{Chunk, Origin, SearchHit};

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedHit {
    pub chunk: Chunk,
    /// Similarity reported by the collection, higher is better.
    pub similarity: f32,
    pub weighted: f32,
    pub origin: Origin,
}

/// Scale docs by `doc_weight` and code by `1 - doc_weight`, then sort by
/// weighted score descending. Ties keep docs-before-code order.
///
/// Similarities below zero are clamped to zero before weighting, so an
/// anti-correlated hit never outranks a positive one on the lighter side.
/// `similarity` keeps the raw value.
///
/// A side whose weight is zero contributes nothing. With `dedupe`, a chunk id
/// present in both the docs and the code list keeps only its higher weighted
/// entry. Entries within one list are never dropped.
pub fn merge_weighted(docs: Vec<SearchHit>, code: Vec<SearchHit>, doc_weight: f32, dedupe: bool) -> Vec<WeightedHit> {
    let code_weight = 1.0 - doc_weight;
    let weigh = |hits: Vec<SearchHit>, weight: f32, origin: Origin| -> Vec<WeightedHit> {
        if weight <= 0.0 {
            return Vec::new();
        }
        hits.into_iter()
            .map(|SearchHit { chunk, score }| WeightedHit { weighted: score.max(0.0) * weight, similarity: score, chunk, origin })
            .collect()
    };

    let mut merged = weigh(docs, doc_weight, Origin::Docs);
    let code = weigh(code, code_weight, Origin::Code);
    if dedupe {
        let mut doc_index: HashMap<String, usize> = HashMap::new();
        for (idx, hit) in merged.iter().enumerate() {
            doc_index.entry(hit.chunk.id.clone()).or_insert(idx);
        }
        for hit in code {
            // Each docs entry pairs with at most one code entry.
            match doc_index.remove(&hit.chunk.id) {
                Some(idx) if hit.weighted > merged[idx].weighted => merged[idx] = hit,
                Some(_) => {}
                None => merged.push(hit),
            }
        }
    } else {
        merged.extend(code);
    }
    merged.sort_by(|a, b| b.weighted.total_cmp(&a.weighted));
    merged
}
