use appdeck_core::EntityKind;
use appdeck_db_memory::{InMemoryStorage, Snapshot};
use appdeck_storage::{Criteria, EntityRef, EntityStorage, StorageError, Transaction};
use serde_json::json;

#[tokio::test]
async fn uncommitted_writes_are_isolated() {
    let storage = InMemoryStorage::new();
    let mut tx = storage.begin_transaction().await.unwrap();

    tx.create(EntityKind::App, &json!({"id": "a", "name": "A"}))
        .await
        .unwrap();

    // Visible inside the transaction, invisible outside
    assert!(tx.read(EntityKind::App, "a").await.unwrap().is_some());
    assert!(storage.read(EntityKind::App, "a").await.unwrap().is_none());

    tx.commit().await.unwrap();
    assert!(storage.read(EntityKind::App, "a").await.unwrap().is_some());
}

#[tokio::test]
async fn rollback_discards_everything() {
    let storage = InMemoryStorage::new();
    storage
        .create(EntityKind::App, &json!({"id": "a", "name": "A"}))
        .await
        .unwrap();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.create(EntityKind::Webhook, &json!({"appId": "a"}))
        .await
        .unwrap();
    tx.update(EntityKind::App, &json!({"id": "a", "name": "B"}))
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(storage.count(EntityKind::Webhook).await, 0);
    let app = storage.read(EntityKind::App, "a").await.unwrap().unwrap();
    assert_eq!(app.data["name"], "A");
}

#[tokio::test]
async fn search_inside_transaction_sees_own_writes() {
    let storage = InMemoryStorage::new();
    storage
        .create(EntityKind::Webhook, &json!({"id": "w1", "appId": "a"}))
        .await
        .unwrap();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.create(EntityKind::Webhook, &json!({"id": "w2", "appId": "a"}))
        .await
        .unwrap();
    tx.delete(EntityKind::Webhook, "w1").await.unwrap();

    let result = tx
        .search(EntityKind::Webhook, &Criteria::new().with_equals("appId", "a"))
        .await
        .unwrap();
    assert_eq!(result.ids(), vec!["w2"]);
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn concurrent_duplicate_name_fails_on_second_commit() {
    let storage = InMemoryStorage::new();

    let mut first = storage.begin_transaction().await.unwrap();
    let mut second = storage.begin_transaction().await.unwrap();
    first
        .create(EntityKind::App, &json!({"name": "SwagApp"}))
        .await
        .unwrap();
    second
        .create(EntityKind::App, &json!({"name": "SwagApp"}))
        .await
        .unwrap();

    first.commit().await.unwrap();
    let err = second.commit().await.unwrap_err();

    assert!(matches!(err, StorageError::UniqueViolation { .. }));
    assert_eq!(storage.count(EntityKind::App).await, 1);
}

#[tokio::test]
async fn failed_commit_applies_nothing() {
    let storage = InMemoryStorage::new();
    storage
        .create(EntityKind::App, &json!({"id": "a", "name": "A"}))
        .await
        .unwrap();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.create(EntityKind::Webhook, &json!({"appId": "a"}))
        .await
        .unwrap();
    tx.update(EntityKind::App, &json!({"id": "a", "name": "A2"}))
        .await
        .unwrap();

    // A concurrent writer moves the version of the app row
    storage
        .update(EntityKind::App, &json!({"id": "a", "name": "A3"}), None)
        .await
        .unwrap();

    let err = tx.commit().await.unwrap_err();
    assert!(err.is_version_conflict());
    assert_eq!(storage.count(EntityKind::Webhook).await, 0);
}

#[tokio::test]
async fn delete_conflicts_with_concurrently_added_dependent() {
    let storage = InMemoryStorage::new();
    storage
        .create(EntityKind::App, &json!({"id": "a", "name": "A"}))
        .await
        .unwrap();

    let mut tx = storage.begin_transaction().await.unwrap();
    let removed = tx.delete(EntityKind::App, "a").await.unwrap();
    assert_eq!(removed, vec![EntityRef::new(EntityKind::App, "a")]);

    storage
        .create(EntityKind::Webhook, &json!({"id": "w", "appId": "a"}))
        .await
        .unwrap();

    assert!(tx.commit().await.is_err());
    assert_eq!(storage.count(EntityKind::Webhook).await, 1);
}

#[tokio::test]
async fn snapshot_restores_rows_in_order() {
    let storage = InMemoryStorage::new();
    storage
        .create(EntityKind::App, &json!({"id": "a", "name": "A"}))
        .await
        .unwrap();
    for id in ["w2", "w1"] {
        storage
            .create(EntityKind::Webhook, &json!({"id": id, "appId": "a"}))
            .await
            .unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    storage.snapshot().await.save(&path).unwrap();

    let restored = InMemoryStorage::from_snapshot(Snapshot::load(&path).unwrap()).unwrap();
    let hooks = restored
        .search(EntityKind::Webhook, &Criteria::new())
        .await
        .unwrap();
    assert_eq!(hooks.ids(), vec!["w2", "w1"]);

    // Fresh writes do not reuse version ids
    let next = restored
        .create(EntityKind::Webhook, &json!({"appId": "a"}))
        .await
        .unwrap();
    assert!(hooks.entries.iter().all(|e| e.version_id != next.version_id));
}

#[tokio::test]
async fn missing_snapshot_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = Snapshot::load(&dir.path().join("absent.json")).unwrap();
    assert!(snapshot.entities.is_empty());
}
