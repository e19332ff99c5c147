//! # NDV Linker
//!
//! Milestone association engine: matches free-text video labels to entries of a
//! normative developmental milestone catalog and persists the chosen links.
//!
//! Pipeline:
//! - [`normalizer`]: label -> tokens + optional age in months
//! - [`scorer`]: additive evidence signals for one label/milestone pair
//! - [`ranker`]: threshold, order, `top_k`
//! - [`engine`]: validation, manual overrides, per-video plan
//! - [`store`] / [`batch`]: per-video replace-all transactions
//! - [`commands`]: `suggest`, `apply` and `run` over a configured database

pub mod batch;
pub mod commands;
pub mod engine;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod normalizer;
pub mod overrides;
pub mod ranker;
pub mod review;
pub mod scorer;
pub mod store;

pub use batch::{apply_plan, FailedVideo, RunReport};
pub use engine::{AssociationEngine, AssociationPlan, PlanOrigin, PlannedAssociation};
pub use error::{ConfigError, InputError, LinkerError, LinkerResult, StorageError};
pub use lexicon::{Lexicon, SynonymEntry};
pub use models::{MilestoneRecord, VideoLabel, QUARANTINE_PREFIX};
pub use overrides::{OverrideEntry, OverrideTable};
pub use ranker::{MatchCandidate, Ranker, RankerConfig};
pub use review::ReviewFile;
pub use scorer::{CandidateScorer, LabelQuery, ScoreBreakdown, ScoringRules, Signal};
pub use store::{ApplyOutcome, AssociationStore, StoreConfig};
