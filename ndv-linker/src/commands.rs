//! Batch commands behind the `ndv-linker` binary
//!
//! Configuration is validated before any database is touched. `suggest` only
//! reads: it opens an existing database read-only and never creates tables.

use crate::batch::{apply_plan, RunReport};
use crate::engine::{AssociationEngine, AssociationPlan, PlanOrigin};
use crate::error::LinkerResult;
use crate::review::ReviewFile;
use crate::store::{AssociationStore, StoreConfig};
use ndv_common::config::TomlConfig;
use ndv_common::db::{connect_readonly, load_milestones, load_videos};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Rank every video and write the review file to `output`
pub async fn suggest(config: &TomlConfig, output: &Path) -> LinkerResult<AssociationPlan> {
    let engine = AssociationEngine::from_config(config)?;
    let pool = connect_readonly(&config.database_path).await?;

    let plan = plan_batch(&engine, &pool, config).await?;
    pool.close().await;

    ReviewFile::from_plan(&plan).write(output)?;
    Ok(plan)
}

/// Rank every video and apply the result
pub async fn run(config: &TomlConfig, run_id: Uuid) -> LinkerResult<RunReport> {
    let engine = AssociationEngine::from_config(config)?;
    let store = AssociationStore::open(&StoreConfig::new(config.database_path.clone())).await?;

    let plan = plan_batch(&engine, store.pool(), config).await?;
    let mut report = apply_plan(&store, &plan.mapping(), run_id).await;
    report.rejected_inputs = plan.rejected.len();
    Ok(report)
}

/// Apply a (reviewed) association file
pub async fn apply_review(config: &TomlConfig, input: &Path, run_id: Uuid) -> LinkerResult<RunReport> {
    let review = ReviewFile::read(input)?;
    let store = AssociationStore::open(&StoreConfig::new(config.database_path.clone())).await?;
    Ok(apply_plan(&store, &review.associations, run_id).await)
}

async fn plan_batch(
    engine: &AssociationEngine,
    pool: &SqlitePool,
    config: &TomlConfig,
) -> LinkerResult<AssociationPlan> {
    let videos = load_videos(pool, config.video_source_tag.as_deref()).await?;
    let milestones = load_milestones(pool).await?;

    info!(
        videos = videos.len(),
        milestones = milestones.len(),
        source_tag = config.video_source_tag.as_deref().unwrap_or("*"),
        "Loaded records"
    );

    let plan = engine.plan_from_rows(videos, milestones);
    log_plan(&plan);
    Ok(plan)
}

fn log_plan(plan: &AssociationPlan) {
    for planned in plan.entries.values() {
        match planned.origin {
            PlanOrigin::Override => info!(
                video_id = planned.video_id,
                milestones = ?planned.milestone_ids,
                "Manual override"
            ),
            PlanOrigin::Ranked => info!(
                video_id = planned.video_id,
                candidates = %planned
                    .candidates
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
                "Suggested"
            ),
        }
    }

    info!(
        planned = plan.len(),
        overridden = plan.overridden(),
        unmatched = plan.unmatched.len(),
        rejected = plan.rejected.len(),
        "Plan ready"
    );
    if !plan.unmatched.is_empty() {
        warn!(videos = ?plan.unmatched, "Videos without candidates keep their current associations");
    }
}
