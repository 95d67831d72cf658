mod helpers;

use std::fs::OpenOptions;
use std::sync::Arc;

use helpers::{FakeEmbedder, DIM};
use recollect::db;
use recollect::embedding::cache::EmbeddingCache;
use recollect::error::MemoryError;
use recollect::index::snapshot::{self, SnapshotPaths};
use recollect::index::VectorIndex;
use recollect::memory::records::RecordStore;
use recollect::memory::store::MemoryStore;
use recollect::memory::types::QueryOutcome;
use tempfile::TempDir;

async fn populate(dir: &std::path::Path) -> Vec<String> {
    let store = helpers::disk_store(dir, Arc::new(helpers::scenario_embedder()));
    let mut ids = Vec::new();
    for text in ["a", "b", "c"] {
        ids.push(store.save(text).await.unwrap().id);
    }
    ids
}

fn rebuilt_ids(dir: &std::path::Path) -> Vec<String> {
    let records = helpers::open_records(dir, DIM);
    let index = VectorIndex::new(DIM);
    index.rebuild(&records).unwrap();
    index.ids()
}

#[tokio::test]
async fn restart_restores_index_from_snapshot() {
    let tmp = TempDir::new().unwrap();
    let saved = populate(tmp.path()).await;
    assert!(helpers::snapshot_paths(tmp.path()).exists());

    let store = helpers::disk_store(tmp.path(), Arc::new(helpers::scenario_embedder()));
    assert_eq!(store.index().ids(), saved);

    match store.query("a", 1).await.unwrap() {
        QueryOutcome::Matches(results) => assert_eq!(results[0].id, saved[0]),
        QueryOutcome::Empty => panic!("store should not be empty after restart"),
    }
}

#[tokio::test]
async fn truncated_snapshot_is_replaced_by_rebuild() {
    let tmp = TempDir::new().unwrap();
    let saved = populate(tmp.path()).await;
    let paths = helpers::snapshot_paths(tmp.path());

    let len = std::fs::metadata(&paths.vectors).unwrap().len();
    OpenOptions::new()
        .write(true)
        .open(&paths.vectors)
        .unwrap()
        .set_len(len / 2)
        .unwrap();
    assert!(matches!(
        snapshot::read(&paths, DIM),
        Err(snapshot::SnapshotError::Corrupt(_))
    ));

    let records = helpers::open_records(tmp.path(), DIM);
    let index = VectorIndex::load_or_rebuild(DIM, &paths, &records).unwrap();
    assert_eq!(index.ids(), saved);
    assert_eq!(index.ids(), rebuilt_ids(tmp.path()));

    // the rebuild rewrote a valid snapshot
    let (_, ids) = snapshot::read(&paths, DIM).unwrap();
    assert_eq!(ids, saved);
}

#[tokio::test]
async fn garbage_id_list_triggers_rebuild() {
    let tmp = TempDir::new().unwrap();
    let saved = populate(tmp.path()).await;
    let paths = helpers::snapshot_paths(tmp.path());
    std::fs::write(&paths.ids, b"not json").unwrap();

    let records = helpers::open_records(tmp.path(), DIM);
    let index = VectorIndex::load_or_rebuild(DIM, &paths, &records).unwrap();
    assert_eq!(index.ids(), saved);
}

#[tokio::test]
async fn missing_snapshot_is_rebuilt() {
    let tmp = TempDir::new().unwrap();
    let saved = populate(tmp.path()).await;
    let paths = helpers::snapshot_paths(tmp.path());
    std::fs::remove_file(&paths.vectors).unwrap();

    let records = helpers::open_records(tmp.path(), DIM);
    let index = VectorIndex::load_or_rebuild(DIM, &paths, &records).unwrap();
    assert_eq!(index.ids(), saved);
    assert!(paths.exists());
}

#[tokio::test]
async fn stale_snapshot_picks_up_unindexed_records() {
    let tmp = TempDir::new().unwrap();
    let mut saved = populate(tmp.path()).await;

    // a record written after the last snapshot, as if the process died
    // between the record commit and the index update
    {
        let records = helpers::open_records(tmp.path(), DIM);
        saved.push(
            records
                .append("d", &helpers::test_embedding(3, DIM), None)
                .unwrap(),
        );
    }

    let store = helpers::disk_store(tmp.path(), Arc::new(helpers::scenario_embedder()));
    assert_eq!(store.index().ids(), saved);
    assert_eq!(store.records().count().unwrap(), 4);
}

#[tokio::test]
async fn databases_sharing_a_directory_keep_separate_snapshots() {
    let tmp = TempDir::new().unwrap();
    let first_db = tmp.path().join("a.db");
    let second_db = tmp.path().join("b.db");

    let first_id = {
        let store = helpers::disk_store_at(&first_db, Arc::new(helpers::scenario_embedder()));
        store.save("a").await.unwrap().id
    };
    {
        let store = helpers::disk_store_at(&second_db, Arc::new(helpers::scenario_embedder()));
        store.save("c").await.unwrap();
    }

    assert!(tmp.path().join("a.index.bin").exists());
    assert!(tmp.path().join("b.index.bin").exists());

    let store = helpers::disk_store_at(&first_db, Arc::new(helpers::scenario_embedder()));
    assert_eq!(store.index().ids(), vec![first_id.clone()]);
    match store.query("a", 1).await.unwrap() {
        QueryOutcome::Matches(results) => {
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].id, first_id);
            assert_eq!(results[0].content, "a");
        }
        QueryOutcome::Empty => panic!("reopened store should not be empty"),
    }
}

#[tokio::test]
async fn snapshot_from_another_store_is_not_trusted() {
    let tmp = TempDir::new().unwrap();
    let saved = populate(tmp.path()).await;
    let paths = helpers::snapshot_paths(tmp.path());

    // same row count, different ids
    let foreign = VectorIndex::new(DIM);
    for (i, _) in saved.iter().enumerate() {
        foreign
            .add(&helpers::test_embedding(i, DIM), format!("mem_foreign_{i}"))
            .unwrap();
    }
    foreign.snapshot(&paths).unwrap();

    let records = helpers::open_records(tmp.path(), DIM);
    let index = VectorIndex::load_or_rebuild(DIM, &paths, &records).unwrap();
    assert_eq!(index.ids(), saved);
}

#[tokio::test]
async fn snapshot_failure_does_not_fail_save() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let records = helpers::open_records(tmp.path(), DIM);
    let store = MemoryStore::new(
        records,
        Arc::new(VectorIndex::new(DIM)),
        Arc::new(helpers::scenario_embedder()),
        EmbeddingCache::new(16),
    )
    .unwrap()
    .with_snapshots(SnapshotPaths::new(blocker.join("snapshots"), "memory"), true);

    store.save("a").await.unwrap();
    assert_eq!(store.index().len(), 1);
    assert_eq!(store.records().count().unwrap(), 1);
}

#[tokio::test]
async fn reindex_rebuilds_and_snapshots() {
    let tmp = TempDir::new().unwrap();
    let saved = populate(tmp.path()).await;
    let paths = helpers::snapshot_paths(tmp.path());
    std::fs::remove_file(&paths.ids).unwrap();

    let records = helpers::open_records(tmp.path(), DIM);
    let store = MemoryStore::new(
        records,
        Arc::new(VectorIndex::new(DIM)),
        Arc::new(FakeEmbedder::new(DIM)),
        EmbeddingCache::new(16),
    )
    .unwrap()
    .with_snapshots(paths.clone(), false);
    assert!(store.index().is_empty());

    assert_eq!(store.reindex().await.unwrap(), 3);
    assert_eq!(store.index().ids(), saved);
    let (_, ids) = snapshot::read(&paths, DIM).unwrap();
    assert_eq!(ids, saved);
}

#[test]
fn reopening_with_another_dimension_is_rejected() {
    let tmp = TempDir::new().unwrap();
    drop(helpers::open_records(tmp.path(), DIM));

    let conn = db::open_database(tmp.path().join("memory.db")).unwrap();
    let result = RecordStore::new(conn, 8);
    assert!(matches!(
        result,
        Err(MemoryError::DimensionMismatch { expected: 4, actual: 8 })
    ));
}

#[tokio::test]
async fn reindex_reports_snapshot_failure() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path()).await;
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let store = MemoryStore::new(
        helpers::open_records(tmp.path(), DIM),
        Arc::new(VectorIndex::new(DIM)),
        Arc::new(FakeEmbedder::new(DIM)),
        EmbeddingCache::new(16),
    )
    .unwrap()
    .with_snapshots(SnapshotPaths::new(&blocker, "memory"), false);

    let err = store.reindex().await.unwrap_err();
    assert!(matches!(err, MemoryError::Snapshot(_)));
    // the in-memory index was still rebuilt
    assert_eq!(store.index().len(), 3);
}
