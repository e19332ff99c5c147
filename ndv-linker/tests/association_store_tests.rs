//! Association store transaction behavior

use ndv_linker::{apply_plan, AssociationStore, StorageError, StoreConfig};
use std::collections::{BTreeMap, BTreeSet};
use tempfile::TempDir;
use uuid::Uuid;

async fn open_store(temp_dir: &TempDir) -> AssociationStore {
    AssociationStore::open(&StoreConfig::new(temp_dir.path().join("hitos.db")))
        .await
        .unwrap()
}

/// Makes any insert of milestone 999 fail mid-transaction
async fn poison_milestone_999(store: &AssociationStore) {
    sqlx::query(
        r#"
        CREATE TRIGGER poison_999 BEFORE INSERT ON videos_hitos
        WHEN NEW.hito_id = 999
        BEGIN
            SELECT RAISE(ABORT, 'poisoned milestone');
        END
        "#,
    )
    .execute(store.pool())
    .await
    .unwrap();
}

fn set(ids: &[i64]) -> BTreeSet<i64> {
    ids.iter().copied().collect()
}

#[tokio::test]
async fn test_apply_replaces_previous_set() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;

    store.apply(185, &[7404, 7409]).await.unwrap();
    let outcome = store.apply(185, &[7409, 7442]).await.unwrap();

    assert_eq!(outcome.removed, 2);
    assert_eq!(outcome.inserted, 2);
    assert_eq!(store.associations_for(185).await.unwrap(), set(&[7409, 7442]));
}

#[tokio::test]
async fn test_apply_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;

    let first = store.apply(179, &[7404, 7442]).await.unwrap();
    let second = store.apply(179, &[7404, 7442]).await.unwrap();

    assert_eq!(first.inserted, 2);
    assert_eq!(second.inserted, 2);
    assert_eq!(second.removed, 2);
    assert_eq!(store.associations_for(179).await.unwrap(), set(&[7404, 7442]));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos_hitos WHERE video_id = 179")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(rows, 2);
}

#[tokio::test]
async fn test_repeated_ids_are_skipped_not_errors() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;

    let outcome = store.apply(188, &[7505, 7840, 7505]).await.unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.skipped_duplicates, 1);
    assert_eq!(store.associations_for(188).await.unwrap(), set(&[7505, 7840]));
}

#[tokio::test]
async fn test_empty_set_clears_video() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;

    store.apply(183, &[7439]).await.unwrap();
    store.apply(183, &[]).await.unwrap();

    assert!(store.associations_for(183).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_videos_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;

    store.apply(180, &[7505, 7840]).await.unwrap();
    store.apply(181, &[7417]).await.unwrap();
    store.apply(180, &[9500]).await.unwrap();

    assert_eq!(store.associations_for(181).await.unwrap(), set(&[7417]));
}

#[tokio::test]
async fn test_failed_insert_rolls_back_video() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;

    store.apply(191, &[7526, 7440]).await.unwrap();
    poison_milestone_999(&store).await;

    let err = store.apply(191, &[7526, 999]).await.unwrap_err();
    assert!(matches!(err, StorageError::Apply { video_id: 191, .. }));
    assert_eq!(err.video_id(), Some(191));

    // Neither the delete nor the first insert survived
    assert_eq!(store.associations_for(191).await.unwrap(), set(&[7526, 7440]));
}

#[tokio::test]
async fn test_batch_isolates_failed_video() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).await;

    store.apply(201, &[7415]).await.unwrap();
    poison_milestone_999(&store).await;

    let mapping = BTreeMap::from([
        (200, vec![8858]),
        (201, vec![7471, 999]),
        (205, vec![7424, 7452]),
    ]);
    let run_id = Uuid::new_v4();
    let report = apply_plan(&store, &mapping, run_id).await;

    assert_eq!(report.run_id, run_id);
    assert!(!report.is_success());
    assert_eq!(report.applied_videos, 2);
    assert_eq!(report.failed_video_ids(), vec![201]);
    assert_eq!(report.inserted, 3);

    assert_eq!(store.associations_for(200).await.unwrap(), set(&[8858]));
    assert_eq!(store.associations_for(201).await.unwrap(), set(&[7415]));
    assert_eq!(store.associations_for(205).await.unwrap(), set(&[7424, 7452]));
}

#[tokio::test]
async fn test_open_twice_keeps_rows() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = open_store(&temp_dir).await;
        store.apply(195, &[7416]).await.unwrap();
        store.pool().close().await;
    }

    let reopened = open_store(&temp_dir).await;
    assert_eq!(reopened.associations_for(195).await.unwrap(), set(&[7416]));
}
