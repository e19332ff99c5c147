//! Batch commands: configuration is checked before the database is touched

use ndv_common::config::TomlConfig;
use ndv_common::db::init_database;
use ndv_linker::{commands, ConfigError, LinkerError, ReviewFile};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// Record sources only; no association table
async fn seed_sources(db_path: &Path) {
    let pool = init_database(db_path).await.unwrap();
    for statement in [
        r#"CREATE TABLE hitos_normativos (
            id INTEGER PRIMARY KEY,
            nombre TEXT,
            descripcion TEXT,
            dominio_id INTEGER,
            fuente_normativa_id INTEGER,
            edad_media_meses REAL
        )"#,
        "CREATE TABLE dominios (id INTEGER PRIMARY KEY, nombre TEXT NOT NULL)",
        "CREATE TABLE fuentes_normativas (id INTEGER PRIMARY KEY, nombre TEXT NOT NULL)",
        "CREATE TABLE videos (id INTEGER PRIMARY KEY, titulo TEXT, descripcion TEXT, fuente TEXT)",
        "INSERT INTO hitos_normativos (id, nombre) VALUES (7409, 'Sonríe espontáneamente')",
        "INSERT INTO videos (id, titulo, fuente) VALUES (185, 'Video CDC 7 sonrie', 'CDC')",
    ] {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;
}

async fn has_association_table(db_path: &Path) -> bool {
    let pool = init_database(db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'videos_hitos'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    pool.close().await;
    count == 1
}

fn config_for(db_path: PathBuf) -> TomlConfig {
    TomlConfig {
        database_path: db_path,
        video_source_tag: Some("CDC".to_string()),
        ..TomlConfig::default()
    }
}

#[tokio::test]
async fn test_bad_lexicon_fails_before_database_is_created() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("mistyped.db");
    let config = TomlConfig {
        lexicon_path: Some(temp_dir.path().join("missing-lexicon.toml")),
        ..config_for(db_path.clone())
    };

    let err = commands::run(&config, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, LinkerError::Config(ConfigError::Io { .. })));

    let err = commands::suggest(&config, &temp_dir.path().join("out.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkerError::Config(_)));

    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_suggest_requires_existing_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("absent.db");

    let err = commands::suggest(&config_for(db_path.clone()), &temp_dir.path().join("out.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkerError::Common(ndv_common::Error::NotFound(_))));
    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_suggest_leaves_schema_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("hitos.db");
    seed_sources(&db_path).await;
    let output = temp_dir.path().join("asociaciones_sugeridas.json");

    let plan = commands::suggest(&config_for(db_path.clone()), &output)
        .await
        .unwrap();

    assert_eq!(plan.mapping(), BTreeMap::from([(185, vec![7409])]));
    assert_eq!(ReviewFile::read(&output).unwrap().associations, plan.mapping());
    assert!(!has_association_table(&db_path).await);
}

#[tokio::test]
async fn test_run_creates_table_and_applies() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("hitos.db");
    seed_sources(&db_path).await;

    let report = commands::run(&config_for(db_path.clone()), Uuid::new_v4())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.applied_videos, 1);
    assert!(has_association_table(&db_path).await);
}
