//! Threshold filter, stable descending sort and top-k cut over a corpus snapshot
//!
//! Brute force: every query scores every record, O(n·d).

use std::cmp::Ordering;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vecsearch_common::{MismatchPolicy, Result, VecSearchError};

use crate::similarity::QueryScorer;
use crate::types::{DocumentRecord, EmbeddingVector, RankedResult, ScoredDocument};

/// Ranking engine
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine {
    mismatch_policy: MismatchPolicy,
}

impl RankingEngine {
    pub fn new(mismatch_policy: MismatchPolicy) -> Self {
        Self { mismatch_policy }
    }

    /// Rank `corpus` against `query`
    pub fn rank(
        &self,
        query: &EmbeddingVector,
        corpus: &[DocumentRecord],
        threshold: f32,
        top_k: usize,
    ) -> Result<RankedResult> {
        self.rank_with_cancel(query, corpus, threshold, top_k, &CancellationToken::new())
    }

    /// Rank `corpus` against `query`, checking `cancel` before each record
    ///
    /// A cancelled scan returns `Cancelled` and no partial hits.
    pub fn rank_with_cancel(
        &self,
        query: &EmbeddingVector,
        corpus: &[DocumentRecord],
        threshold: f32,
        top_k: usize,
        cancel: &CancellationToken,
    ) -> Result<RankedResult> {
        if threshold.is_nan() {
            return Err(VecSearchError::invalid_input("Similarity threshold is NaN"));
        }

        let scorer = QueryScorer::new(query);
        let mut seen: HashSet<&str> = HashSet::with_capacity(corpus.len());
        let mut skipped = Vec::new();
        let mut hits: Vec<(&DocumentRecord, f32)> = Vec::new();

        for (scanned, record) in corpus.iter().enumerate() {
            if cancel.is_cancelled() {
                debug!("Ranking cancelled after {} of {} records", scanned, corpus.len());
                return Err(VecSearchError::Cancelled);
            }

            // First occurrence of an id wins
            if !seen.insert(record.id()) {
                continue;
            }

            let score = match scorer.score(record.embedding()) {
                Ok(score) => score,
                Err(VecSearchError::DimensionMismatch { expected, actual })
                    if self.mismatch_policy == MismatchPolicy::Skip =>
                {
                    warn!(
                        "Skipping document {}: embedding dimension {} does not match query dimension {}",
                        record.id(),
                        actual,
                        expected
                    );
                    skipped.push(record.id().to_string());
                    continue;
                }
                Err(e) => return Err(e),
            };

            if score >= threshold {
                hits.push((record, score));
            }
        }

        let candidates = hits.len();

        // Stable: equal scores keep corpus order
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);

        debug!(
            "Ranked {} records - {} above threshold {}, {} returned, {} skipped",
            corpus.len(),
            candidates,
            threshold,
            hits.len(),
            skipped.len()
        );

        Ok(RankedResult {
            hits: hits
                .into_iter()
                .map(|(record, score)| ScoredDocument::from_record(record, score))
                .collect(),
            skipped,
        })
    }
}
