//! Raw row models and read queries for the record sources
//!
//! Rows mirror what the database holds: every descriptive column is optional.
//! Validation into engine records happens in the linker, where a malformed row is
//! skipped and reported rather than failing the whole read.

use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

/// One row of the `videos` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoRow {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub source_tag: Option<String>,
}

/// One row of `hitos_normativos`, joined with its domain and normative source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MilestoneRow {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub source_tag: Option<String>,
    pub typical_age_months: Option<f64>,
}

/// Load videos, optionally restricted to one provenance tag
pub async fn load_videos(pool: &SqlitePool, source_tag: Option<&str>) -> Result<Vec<VideoRow>> {
    let rows = match source_tag {
        Some(tag) => {
            sqlx::query_as::<_, VideoRow>(
                r#"
                SELECT id, titulo AS title, descripcion AS description, fuente AS source_tag
                FROM videos
                WHERE fuente = ?
                ORDER BY id
                "#,
            )
            .bind(tag)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, VideoRow>(
                r#"
                SELECT id, titulo AS title, descripcion AS description, fuente AS source_tag
                FROM videos
                ORDER BY id
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    debug!(count = rows.len(), source_tag = ?source_tag, "Loaded video rows");
    Ok(rows)
}

/// Load the full milestone catalog
///
/// Quarantined entries are returned as well; excluding them is the ranker's job.
pub async fn load_milestones(pool: &SqlitePool) -> Result<Vec<MilestoneRow>> {
    let rows = sqlx::query_as::<_, MilestoneRow>(
        r#"
        SELECT hn.id AS id,
               hn.nombre AS name,
               hn.descripcion AS description,
               d.nombre AS domain,
               fn.nombre AS source_tag,
               CAST(hn.edad_media_meses AS REAL) AS typical_age_months
        FROM hitos_normativos hn
        LEFT JOIN dominios d ON hn.dominio_id = d.id
        LEFT JOIN fuentes_normativas fn ON hn.fuente_normativa_id = fn.id
        ORDER BY hn.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    debug!(count = rows.len(), "Loaded milestone rows");
    Ok(rows)
}
