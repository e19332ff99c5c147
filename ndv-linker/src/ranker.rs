//! Ranker
//!
//! Scores every active milestone for one label, drops candidates under the
//! threshold, orders by score (descending) then milestone id (ascending), and
//! keeps the first `top_k`. An empty result is a valid outcome.

use crate::models::MilestoneRecord;
use crate::scorer::{CandidateScorer, LabelQuery, Signal};
use ndv_common::config::MatchingConfig;
use std::cmp::Reverse;
use std::fmt;

/// Threshold and cut-off for ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankerConfig {
    pub min_score: u32,
    pub top_k: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            min_score: 3,
            top_k: 3,
        }
    }
}

impl From<&MatchingConfig> for RankerConfig {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            min_score: config.min_score,
            top_k: config.top_k,
        }
    }
}

/// Ranked candidate for one label (never persisted)
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub milestone_id: i64,
    pub score: u32,
    pub matched_signals: Vec<Signal>,
}

impl fmt::Display for MatchCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (score {}", self.milestone_id, self.score)?;
        for (idx, signal) in self.matched_signals.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { ", " };
            write!(f, "{}{}", sep, signal)?;
        }
        write!(f, ")")
    }
}

/// Ranks catalog entries for labels
#[derive(Debug, Clone)]
pub struct Ranker {
    scorer: CandidateScorer,
    config: RankerConfig,
}

impl Ranker {
    pub fn new(scorer: CandidateScorer, config: RankerConfig) -> Self {
        Self { scorer, config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Rank with the configured threshold and cut-off
    pub fn rank(&self, query: &LabelQuery, catalog: &[MilestoneRecord]) -> Vec<MatchCandidate> {
        self.rank_with(query, catalog, self.config.min_score, self.config.top_k)
    }

    /// Rank with an explicit threshold and cut-off
    pub fn rank_with(
        &self,
        query: &LabelQuery,
        catalog: &[MilestoneRecord],
        min_score: u32,
        top_k: usize,
    ) -> Vec<MatchCandidate> {
        let mut candidates: Vec<MatchCandidate> = catalog
            .iter()
            .filter(|milestone| !milestone.is_quarantined())
            .filter_map(|milestone| {
                let breakdown = self.scorer.score(query, milestone);
                (breakdown.score >= min_score).then(|| MatchCandidate {
                    milestone_id: milestone.id,
                    score: breakdown.score,
                    matched_signals: breakdown.signals,
                })
            })
            .collect();

        candidates.sort_by_key(|c| (Reverse(c.score), c.milestone_id));
        candidates.truncate(top_k);
        candidates
    }
}
