//! Association planning
//!
//! Turns a video batch and a catalog snapshot into an [`AssociationPlan`]:
//! records are validated (malformed ones are skipped and reported), overridden
//! videos take their manual milestone list, every other video is ranked.
//! Planning is pure; nothing here touches the association store.

use crate::error::{ConfigError, InputError, RecordKind};
use crate::lexicon::Lexicon;
use crate::models::{MilestoneRecord, VideoLabel};
use crate::overrides::OverrideTable;
use crate::ranker::{MatchCandidate, Ranker, RankerConfig};
use crate::scorer::{CandidateScorer, LabelQuery, ScoringRules};
use ndv_common::config::TomlConfig;
use ndv_common::db::{MilestoneRow, VideoRow};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Why a video received its milestone set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOrigin {
    /// Manual override table
    Override,
    /// Automatic ranking
    Ranked,
}

/// Chosen milestones for one video
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAssociation {
    pub video_id: i64,
    pub milestone_ids: Vec<i64>,
    pub origin: PlanOrigin,

    /// Ranked candidates behind `milestone_ids` (empty for overrides)
    pub candidates: Vec<MatchCandidate>,
}

/// Result of planning one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationPlan {
    /// Videos with at least one milestone, ordered by video id
    pub entries: BTreeMap<i64, PlannedAssociation>,

    /// Videos with no candidate above the threshold; left untouched on apply
    pub unmatched: Vec<i64>,

    /// Records skipped during validation
    pub rejected: Vec<InputError>,
}

impl AssociationPlan {
    /// `video_id -> milestone ids`, the apply set and review file content
    pub fn mapping(&self) -> BTreeMap<i64, Vec<i64>> {
        self.entries
            .iter()
            .map(|(video_id, planned)| (*video_id, planned.milestone_ids.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn overridden(&self) -> usize {
        self.entries
            .values()
            .filter(|p| p.origin == PlanOrigin::Override)
            .count()
    }
}

/// Matching engine for one run
#[derive(Debug, Clone)]
pub struct AssociationEngine {
    ranker: Ranker,
    overrides: OverrideTable,
}

impl AssociationEngine {
    pub fn new(ranker: Ranker, overrides: OverrideTable) -> Self {
        Self { ranker, overrides }
    }

    /// Build the engine from bootstrap configuration
    ///
    /// Loads the lexicon (external file or built-in) and the override table,
    /// and validates thresholds. Every failure here is fatal for the run.
    pub fn from_config(config: &TomlConfig) -> Result<Self, ConfigError> {
        config.matching.validate().map_err(|err| match err {
            ndv_common::Error::Config(msg) => ConfigError::Thresholds(msg),
            other => ConfigError::Thresholds(other.to_string()),
        })?;

        let lexicon = match &config.lexicon_path {
            Some(path) => Lexicon::load(path)?,
            None => Lexicon::builtin()?,
        };

        let overrides = match &config.overrides_path {
            Some(path) => OverrideTable::load(path)?,
            None => OverrideTable::empty(),
        };

        debug!(
            lexicon_entries = lexicon.len(),
            overrides = overrides.len(),
            min_score = config.matching.min_score,
            top_k = config.matching.top_k,
            "Association engine configured"
        );

        let scorer = CandidateScorer::new(lexicon, ScoringRules::from_matching(&config.matching));
        let ranker = Ranker::new(scorer, RankerConfig::from(&config.matching));
        Ok(Self::new(ranker, overrides))
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// Validate raw rows, then plan
    pub fn plan_from_rows(
        &self,
        video_rows: Vec<VideoRow>,
        milestone_rows: Vec<MilestoneRow>,
    ) -> AssociationPlan {
        let (videos, mut rejected) = validate_rows::<_, VideoLabel>(video_rows);
        let (catalog, rejected_milestones) = validate_rows::<_, MilestoneRecord>(milestone_rows);
        rejected.extend(rejected_milestones);

        let mut plan = self.plan(&videos, &catalog);
        rejected.append(&mut plan.rejected);
        plan.rejected = rejected;
        plan
    }

    /// Plan associations for `videos` against `catalog`
    ///
    /// Duplicate ids are rejected after their first occurrence.
    pub fn plan(&self, videos: &[VideoLabel], catalog: &[MilestoneRecord]) -> AssociationPlan {
        let mut plan = AssociationPlan::default();

        let mut catalog_ids = HashMap::new();
        let mut active = Vec::with_capacity(catalog.len());
        for milestone in catalog {
            if catalog_ids.contains_key(&milestone.id) {
                reject(
                    &mut plan,
                    InputError::Duplicate {
                        record: RecordKind::Milestone,
                        id: milestone.id,
                    },
                );
                continue;
            }
            catalog_ids.insert(milestone.id, milestone.is_quarantined());
            active.push(milestone.clone());
        }

        let mut seen_videos = HashSet::new();
        for video in videos {
            if !seen_videos.insert(video.id) {
                reject(
                    &mut plan,
                    InputError::Duplicate {
                        record: RecordKind::Video,
                        id: video.id,
                    },
                );
                continue;
            }

            if let Some(manual) = self.overrides.get(video.id) {
                for milestone_id in &manual.milestone_ids {
                    match catalog_ids.get(milestone_id) {
                        Some(true) => warn!(
                            video_id = video.id,
                            milestone_id, "Override names a quarantined milestone"
                        ),
                        None => warn!(
                            video_id = video.id,
                            milestone_id, "Override names a milestone missing from the catalog"
                        ),
                        Some(false) => {}
                    }
                }

                debug!(
                    video_id = video.id,
                    milestones = ?manual.milestone_ids,
                    reason = manual.reason.as_deref().unwrap_or(""),
                    "Using manual override"
                );

                plan.entries.insert(
                    video.id,
                    PlannedAssociation {
                        video_id: video.id,
                        milestone_ids: manual.milestone_ids.clone(),
                        origin: PlanOrigin::Override,
                        candidates: Vec::new(),
                    },
                );
                continue;
            }

            let query = LabelQuery::from_video(video);
            let candidates = self.ranker.rank(&query, &active);

            if candidates.is_empty() {
                debug!(video_id = video.id, title = %video.title, "No candidates above threshold");
                plan.unmatched.push(video.id);
                continue;
            }

            debug!(
                video_id = video.id,
                title = %video.title,
                candidates = %candidates
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
                "Ranked candidates"
            );

            plan.entries.insert(
                video.id,
                PlannedAssociation {
                    video_id: video.id,
                    milestone_ids: candidates.iter().map(|c| c.milestone_id).collect(),
                    origin: PlanOrigin::Ranked,
                    candidates,
                },
            );
        }

        plan
    }
}

fn reject(plan: &mut AssociationPlan, err: InputError) {
    warn!(error = %err, "Skipping input record");
    plan.rejected.push(err);
}

fn validate_rows<R, T>(rows: Vec<R>) -> (Vec<T>, Vec<InputError>)
where
    T: TryFrom<R, Error = InputError>,
{
    let mut valid = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for row in rows {
        match T::try_from(row) {
            Ok(record) => valid.push(record),
            Err(err) => {
                warn!(error = %err, "Skipping input record");
                rejected.push(err);
            }
        }
    }

    (valid, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideEntry;

    fn engine(overrides: OverrideTable) -> AssociationEngine {
        let lexicon = Lexicon::from_entries([
            ("sonrie", vec!["sonríe", "sonrisa"]),
            ("camina", vec!["camina", "marcha"]),
        ])
        .unwrap();
        let ranker = Ranker::new(
            CandidateScorer::new(lexicon, ScoringRules::default()),
            RankerConfig::default(),
        );
        AssociationEngine::new(ranker, overrides)
    }

    fn catalog() -> Vec<MilestoneRecord> {
        vec![
            MilestoneRecord::new(7404, "Sonrisa social").with_source_tag("CDC"),
            MilestoneRecord::new(7409, "Sonríe espontáneamente").with_source_tag("CDC"),
            MilestoneRecord::new(7808, "Camina solo").with_age_months(12.0),
            MilestoneRecord::new(9999, "[CUARENTENA] Sonríe al nacer"),
        ]
    }

    #[test]
    fn test_ranked_plan() {
        let videos = vec![
            VideoLabel::new(185, "Video CDC 7 sonrie").with_source_tag("CDC"),
            VideoLabel::new(186, "Video sin palabras clave"),
        ];

        let plan = engine(OverrideTable::empty()).plan(&videos, &catalog());

        let smile = &plan.entries[&185];
        assert_eq!(smile.origin, PlanOrigin::Ranked);
        assert_eq!(smile.milestone_ids, vec![7409, 7404]);
        assert_eq!(smile.candidates.len(), 2);
        assert_eq!(plan.unmatched, vec![186]);
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn test_override_bypasses_ranking() {
        let mut overrides = OverrideTable::empty();
        overrides
            .insert(OverrideEntry {
                video_id: 185,
                milestone_ids: vec![7404, 9999],
                reason: Some("Sonrisa espontánea".to_string()),
            })
            .unwrap();

        let videos = vec![VideoLabel::new(185, "Video CDC 7 sonrie")];
        let plan = engine(overrides).plan(&videos, &catalog());

        let entry = &plan.entries[&185];
        assert_eq!(entry.origin, PlanOrigin::Override);
        assert_eq!(entry.milestone_ids, vec![7404, 9999]);
        assert!(entry.candidates.is_empty());
        assert_eq!(plan.overridden(), 1);
    }

    #[test]
    fn test_duplicates_rejected_after_first() {
        let videos = vec![
            VideoLabel::new(212, "camina a los 12 meses"),
            VideoLabel::new(212, "Video CDC 7 sonrie"),
        ];
        let mut catalog = catalog();
        catalog.push(MilestoneRecord::new(7404, "Otro nombre"));

        let plan = engine(OverrideTable::empty()).plan(&videos, &catalog);

        assert_eq!(plan.entries[&212].milestone_ids, vec![7808]);
        assert_eq!(
            plan.rejected,
            vec![
                InputError::Duplicate {
                    record: RecordKind::Milestone,
                    id: 7404,
                },
                InputError::Duplicate {
                    record: RecordKind::Video,
                    id: 212,
                },
            ]
        );
    }

    #[test]
    fn test_plan_from_rows_skips_malformed() {
        let video_rows = vec![
            VideoRow {
                id: 185,
                title: Some("Video CDC 7 sonrie".to_string()),
                description: None,
                source_tag: Some("CDC".to_string()),
            },
            VideoRow {
                id: 190,
                title: None,
                description: Some("sin título".to_string()),
                source_tag: None,
            },
        ];
        let milestone_rows = vec![MilestoneRow {
            id: 7409,
            name: Some("Sonríe espontáneamente".to_string()),
            description: None,
            domain: Some("Social".to_string()),
            source_tag: Some("CDC".to_string()),
            typical_age_months: Some(2.0),
        }];

        let plan = engine(OverrideTable::empty()).plan_from_rows(video_rows, milestone_rows);

        assert_eq!(plan.mapping(), BTreeMap::from([(185, vec![7409])]));
        assert_eq!(plan.rejected.len(), 1);
        assert!(matches!(
            plan.rejected[0],
            InputError::MissingField { id: 190, .. }
        ));
    }

    #[test]
    fn test_from_config_rejects_bad_thresholds() {
        let mut config = TomlConfig::default();
        config.matching.top_k = 0;

        let err = AssociationEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Thresholds(_)));
    }

    #[test]
    fn test_from_config_missing_lexicon_is_fatal() {
        let config = TomlConfig {
            lexicon_path: Some("/nonexistent/lexicon.toml".into()),
            ..TomlConfig::default()
        };

        let err = AssociationEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_from_config_defaults_use_builtin_lexicon() {
        let engine = AssociationEngine::from_config(&TomlConfig::default()).unwrap();
        assert!(engine.overrides().is_empty());
        assert_eq!(engine.ranker().config().top_k, 3);
    }
}
