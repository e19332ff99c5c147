//! Association Store
//!
//! Persists video -> milestone links in `videos_hitos`. Every apply replaces a
//! video's whole association set inside one transaction:
//!
//! 1. Begin transaction
//! 2. Delete every `(video_id, *)` row
//! 3. Insert each milestone id, ignoring pairs that already exist
//! 4. Commit
//!
//! Any failing step drops the transaction uncommitted, which rolls the video
//! back to its previous association set.

use crate::error::{LinkerError, StorageError};
use ndv_common::db::init_database;
use sqlx::{Pool, Sqlite};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Where the association sink lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_path: PathBuf,
}

impl StoreConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
        }
    }
}

/// Row counts of one apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// New pairs written
    pub inserted: u64,
    /// Pairs ignored because they already existed
    pub skipped_duplicates: u64,
    /// Previous pairs deleted before inserting
    pub removed: u64,
}

/// Transactional sink for associations
#[derive(Debug, Clone)]
pub struct AssociationStore {
    db: Pool<Sqlite>,
}

impl AssociationStore {
    /// Open the database named by `config` and make sure the association table exists
    pub async fn open(config: &StoreConfig) -> Result<Self, LinkerError> {
        let db = init_database(&config.database_path).await?;
        let store = Self::new(db);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an already open pool
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }

    /// Create `videos_hitos` if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS videos_hitos (
                video_id INTEGER NOT NULL,
                hito_id INTEGER NOT NULL,
                PRIMARY KEY (video_id, hito_id)
            )
            "#,
        )
        .execute(&self.db)
        .await
        .map_err(StorageError::Schema)?;

        Ok(())
    }

    /// Replace the association set of `video_id` with `milestone_ids`
    ///
    /// Idempotent: applying the same set twice leaves the same rows. Repeated
    /// ids in `milestone_ids` are counted as skipped duplicates.
    pub async fn apply(
        &self,
        video_id: i64,
        milestone_ids: &[i64],
    ) -> Result<ApplyOutcome, StorageError> {
        let apply_err = move |source: sqlx::Error| StorageError::Apply { video_id, source };

        let mut tx = self.db.begin().await.map_err(apply_err)?;
        let removed = sqlx::query("DELETE FROM videos_hitos WHERE video_id = ?")
            .bind(video_id)
            .execute(&mut *tx)
            .await
            .map_err(apply_err)?
            .rows_affected();

        let mut outcome = ApplyOutcome {
            removed,
            ..ApplyOutcome::default()
        };
        for milestone_id in milestone_ids {
            let written = sqlx::query(
                "INSERT OR IGNORE INTO videos_hitos (video_id, hito_id) VALUES (?, ?)",
            )
            .bind(video_id)
            .bind(*milestone_id)
            .execute(&mut *tx)
            .await
            .map_err(apply_err)?
            .rows_affected();

            if written == 0 {
                outcome.skipped_duplicates += 1;
            } else {
                outcome.inserted += written;
            }
        }

        tx.commit().await.map_err(apply_err)?;

        tracing::debug!(
            video_id,
            inserted = outcome.inserted,
            skipped = outcome.skipped_duplicates,
            removed = outcome.removed,
            "Replaced video associations"
        );

        Ok(outcome)
    }

    /// Current association set of one video
    pub async fn associations_for(&self, video_id: i64) -> Result<BTreeSet<i64>, StorageError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT hito_id FROM videos_hitos WHERE video_id = ? ORDER BY hito_id")
                .bind(video_id)
                .fetch_all(&self.db)
                .await
                .map_err(|source| StorageError::Read { video_id, source })?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
