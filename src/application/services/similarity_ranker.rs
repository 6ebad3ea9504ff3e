use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::StoredFragment;
use crate::domain::value_objects::EmbeddingVector;

#[derive(Debug, Clone)]
pub struct RankingOptions {
    pub threshold: f32,
    pub top_k: usize,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            top_k: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankingError {
    #[error("Fragment {fragment_id} has a {found}-dimensional embedding, query has {expected}")]
    DimensionMismatch {
        fragment_id: Uuid,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievedFragment {
    pub fragment: StoredFragment,
    /// Absent when the fragment was returned without ranking.
    pub similarity: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct RankedFragments {
    pub fragments: Vec<RetrievedFragment>,
    /// Every document with at least one fragment at or above the threshold,
    /// including fragments cut by `top_k`.
    pub referenced_document_ids: Vec<Uuid>,
}

impl RankedFragments {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

pub struct SimilarityRanker {
    options: RankingOptions,
}

impl SimilarityRanker {
    pub fn new(options: RankingOptions) -> Self {
        Self { options }
    }

    pub fn rank(
        &self,
        query: &EmbeddingVector,
        candidates: Vec<StoredFragment>,
    ) -> Result<RankedFragments, RankingError> {
        let embedded: Vec<StoredFragment> = candidates
            .into_iter()
            .filter(|candidate| candidate.embedding().is_some())
            .collect();

        if embedded.is_empty() {
            tracing::debug!("no embedded fragments to rank");
            return Ok(RankedFragments::default());
        }

        let mut rows = Vec::with_capacity(embedded.len());
        for candidate in &embedded {
            if let Some(vector) = candidate.embedding() {
                if vector.dimension() != query.dimension() {
                    return Err(RankingError::DimensionMismatch {
                        fragment_id: candidate.id(),
                        expected: query.dimension(),
                        found: vector.dimension(),
                    });
                }
                rows.push(vector.as_slice());
            }
        }

        let scores = cosine_similarities(query.as_slice(), &rows);

        let mut retained: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score >= self.options.threshold)
            .collect();

        // Stable: equal scores keep input order.
        retained.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut seen = HashSet::new();
        let referenced_document_ids: Vec<Uuid> = retained
            .iter()
            .map(|(index, _)| embedded[*index].document_id())
            .filter(|id| seen.insert(*id))
            .collect();

        let mut slots: Vec<Option<StoredFragment>> = embedded.into_iter().map(Some).collect();
        let fragments: Vec<RetrievedFragment> = retained
            .into_iter()
            .take(self.options.top_k)
            .filter_map(|(index, score)| {
                slots[index].take().map(|fragment| RetrievedFragment {
                    fragment,
                    similarity: Some(score),
                })
            })
            .collect();

        tracing::debug!(
            kept = fragments.len(),
            documents = referenced_document_ids.len(),
            threshold = self.options.threshold,
            "ranked fragments"
        );

        Ok(RankedFragments {
            fragments,
            referenced_document_ids,
        })
    }

    /// Degraded path when the question has no embedding: the first `top_k`
    /// candidates in storage order, no scores, no referenced documents.
    pub fn unranked(&self, candidates: Vec<StoredFragment>) -> RankedFragments {
        let fragments = candidates
            .into_iter()
            .take(self.options.top_k)
            .map(|fragment| RetrievedFragment {
                fragment,
                similarity: None,
            })
            .collect();

        RankedFragments {
            fragments,
            referenced_document_ids: Vec::new(),
        }
    }
}

/// Cosine similarity of `query` against every row. Rows are scored in
/// parallel; a zero-magnitude row or query scores 0.
pub fn cosine_similarities(query: &[f32], rows: &[&[f32]]) -> Vec<f32> {
    let query_norm = norm(query);
    if query_norm == 0.0 {
        return vec![0.0; rows.len()];
    }

    rows.par_iter()
        .map(|row| {
            let row_norm = norm(row);
            if row_norm == 0.0 {
                return 0.0;
            }
            let dot: f32 = query.iter().zip(row.iter()).map(|(a, b)| a * b).sum();
            (dot / (query_norm * row_norm)).clamp(-1.0, 1.0)
        })
        .collect()
}

fn norm(values: &[f32]) -> f32 {
    values.iter().map(|x| x * x).sum::<f32>().sqrt()
}
