//! Candidate Scorer
//!
//! Scores one label against one milestone from four independent, additive
//! signals:
//!
//! 1. Direct token overlap: label token found in milestone name/description
//! 2. Lexicon expansion: key found in the label, surface form in the milestone
//! 3. Age proximity: label age within the tolerance of the milestone's age
//! 4. Source tag: both records come from the same normative source
//!
//! Signals are recorded in evaluation order for auditing.

use crate::lexicon::Lexicon;
use crate::models::{MilestoneRecord, VideoLabel};
use crate::normalizer::{fold, normalize, NormalizedLabel};
use ndv_common::config::MatchingConfig;
use std::collections::HashSet;
use std::fmt;

/// Point values and windows for each signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub token_points: u32,
    pub lexicon_points: u32,
    pub age_points: u32,
    pub source_points: u32,

    /// Inclusive age window in months
    pub age_tolerance_months: u32,

    /// Tokens with fewer characters never count as overlap
    pub min_token_chars: usize,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            token_points: 2,
            lexicon_points: 3,
            age_points: 3,
            source_points: 1,
            age_tolerance_months: 2,
            min_token_chars: 3,
        }
    }
}

impl ScoringRules {
    /// Default points with the windows taken from configuration
    pub fn from_matching(config: &MatchingConfig) -> Self {
        Self {
            age_tolerance_months: config.age_tolerance_months,
            min_token_chars: config.min_token_chars,
            ..Self::default()
        }
    }
}

/// One piece of matching evidence
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    TokenOverlap {
        token: String,
    },
    LexiconExpansion {
        key: String,
        surface_form: String,
    },
    AgeProximity {
        label_months: u32,
        milestone_months: f64,
    },
    SourceTag {
        tag: String,
    },
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::TokenOverlap { token } => write!(f, "{}", token),
            Signal::LexiconExpansion { key, surface_form } => {
                write!(f, "{} -> {}", key, surface_form)
            }
            Signal::AgeProximity {
                label_months,
                milestone_months,
            } => write!(f, "age {}m ~ {}m", label_months, milestone_months),
            Signal::SourceTag { tag } => write!(f, "source {}", tag),
        }
    }
}

/// Score with the signals that produced it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub score: u32,
    pub signals: Vec<Signal>,
}

impl ScoreBreakdown {
    fn add(&mut self, points: u32, signal: Signal) {
        self.score += points;
        self.signals.push(signal);
    }

    /// Audit strings in evaluation order
    pub fn signal_strings(&self) -> Vec<String> {
        self.signals.iter().map(ToString::to_string).collect()
    }
}

/// Label prepared for scoring against a whole catalog
#[derive(Debug, Clone, PartialEq)]
pub struct LabelQuery {
    pub normalized: NormalizedLabel,
    pub source_tag: Option<String>,
}

impl LabelQuery {
    pub fn new(label: &str, source_tag: Option<&str>) -> Self {
        Self {
            normalized: normalize(label),
            source_tag: source_tag
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        }
    }

    pub fn from_video(video: &VideoLabel) -> Self {
        Self::new(&video.label_text(), video.source_tag.as_deref())
    }
}

/// Scores labels against catalog entries
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    lexicon: Lexicon,
    rules: ScoringRules,
}

impl CandidateScorer {
    pub fn new(lexicon: Lexicon, rules: ScoringRules) -> Self {
        Self { lexicon, rules }
    }

    /// Score one milestone; zero means no evidence
    pub fn score(&self, query: &LabelQuery, milestone: &MilestoneRecord) -> ScoreBreakdown {
        let name = fold(&milestone.name);
        let description = milestone.description.as_deref().map(fold).unwrap_or_default();
        let in_milestone = |needle: &str| name.contains(needle) || description.contains(needle);

        let mut breakdown = ScoreBreakdown::default();

        // 1. Direct token overlap, once per distinct token
        let mut seen = HashSet::new();
        for token in &query.normalized.tokens {
            if token.chars().count() < self.rules.min_token_chars || !seen.insert(token.as_str()) {
                continue;
            }
            if in_milestone(token) {
                breakdown.add(
                    self.rules.token_points,
                    Signal::TokenOverlap {
                        token: token.clone(),
                    },
                );
            }
        }

        // 2. Lexicon expansion
        for entry in self.lexicon.entries() {
            if !query.normalized.text.contains(&entry.canonical_key) {
                continue;
            }
            for form in &entry.surface_forms {
                if in_milestone(form) {
                    breakdown.add(
                        self.rules.lexicon_points,
                        Signal::LexiconExpansion {
                            key: entry.canonical_key.clone(),
                            surface_form: form.clone(),
                        },
                    );
                }
            }
        }

        // 3. Age proximity
        if let (Some(label_months), Some(milestone_months)) =
            (query.normalized.age_months, milestone.typical_age_months)
        {
            let distance = (f64::from(label_months) - milestone_months).abs();
            if distance <= f64::from(self.rules.age_tolerance_months) {
                breakdown.add(
                    self.rules.age_points,
                    Signal::AgeProximity {
                        label_months,
                        milestone_months,
                    },
                );
            }
        }

        // 4. Source tag
        if let (Some(label_tag), Some(milestone_tag)) =
            (query.source_tag.as_deref(), milestone.source_tag.as_deref())
        {
            if milestone_tag
                .to_lowercase()
                .contains(&label_tag.to_lowercase())
            {
                breakdown.add(
                    self.rules.source_points,
                    Signal::SourceTag {
                        tag: label_tag.to_string(),
                    },
                );
            }
        }

        breakdown
    }
}
