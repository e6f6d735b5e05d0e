//! Local asset preparation and availability checks.

use std::sync::Arc;

use lectern_core::fakes::{
    MemoryContentEngine, MemoryEngineConnector, MemoryKeyValueStore, StaticAssetSource,
    StaticReachability,
};
use lectern_core::{
    AssetFingerprint, Database, DatabaseConfig, KeyValueStore, SyncError, SyncRecord,
    APP_STATE_KEYS, KEY_SYNC_RECORD,
};

const BUNDLE_V1: &[u8] = b"bundled database v1";
const BUNDLE_V2: &[u8] = b"bundled database v2";

struct Harness {
    db: Database,
    config: DatabaseConfig,
    assets: Arc<StaticAssetSource>,
    connector: Arc<MemoryEngineConnector>,
    store: Arc<MemoryKeyValueStore>,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = Arc::new(MemoryContentEngine::new());
    let remote = Arc::new(MemoryContentEngine::new());
    let connector = Arc::new(MemoryEngineConnector::new(local));
    let assets = Arc::new(StaticAssetSource::new(BUNDLE_V1.to_vec()));
    let store = Arc::new(MemoryKeyValueStore::new());
    let config = DatabaseConfig::new("https://engine.example.com", dir.path());

    let db = Database::with_engines(
        config.clone(),
        remote,
        Arc::clone(&connector) as Arc<dyn lectern_core::EngineConnector>,
        Arc::clone(&assets) as Arc<dyn lectern_core::AssetSource>,
        Arc::clone(&store) as Arc<dyn KeyValueStore>,
        Arc::new(StaticReachability::new(Some(true))),
    );
    Harness {
        db,
        config,
        assets,
        connector,
        store,
        _dir: dir,
    }
}

// ---------------------------------------------------------------------------
// prepare_local_database
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preparation_downloads_persists_and_connects() {
    let h = harness();

    h.db.prepare_local_database().await.expect("prepare");

    let written = std::fs::read(h.config.db_path()).expect("local database file");
    assert_eq!(written, BUNDLE_V1);

    let raw = h
        .store
        .get(KEY_SYNC_RECORD)
        .await
        .unwrap()
        .expect("sync record persisted");
    let record: SyncRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.fingerprint, h.assets.fingerprint());

    assert_eq!(h.connector.connect_count(), 1);
    assert!(h.db.has_local_engine().await);
    assert!(!h.db.session().force_remote());
    assert!(h.db.session().local_ready());
}

#[tokio::test]
async fn preparation_clears_app_state_keys() {
    let h = harness();
    for key in APP_STATE_KEYS {
        h.store.put(key, "stale").await.unwrap();
    }

    h.db.prepare_local_database().await.expect("prepare");

    for key in APP_STATE_KEYS {
        assert_eq!(h.store.get(key).await.unwrap(), None, "{key} not cleared");
    }
}

#[tokio::test]
async fn preparation_replaces_a_previous_database_file() {
    let h = harness();
    std::fs::create_dir_all(h.config.sqlite_dir()).unwrap();
    std::fs::write(h.config.db_path(), b"old garbage").unwrap();

    h.db.prepare_local_database().await.expect("prepare");

    let written = std::fs::read(h.config.db_path()).unwrap();
    assert_eq!(written, BUNDLE_V1);
}

#[tokio::test]
async fn fetch_failure_forces_remote_mode() {
    let h = harness();
    h.assets.fail_fetch(true);

    let err = h.db.prepare_local_database().await.unwrap_err();

    assert!(matches!(err, SyncError::Download(_)));
    assert!(h.db.session().force_remote());
    assert!(!h.db.has_local_engine().await);
    // Preparation is over; the flag no longer says "still preparing".
    assert!(h.db.session().local_ready());
    assert!(!h.config.db_path().exists());
}

#[tokio::test]
async fn corrupted_download_is_rejected_before_it_is_written() {
    let h = harness();
    h.assets
        .advertise_fingerprint(AssetFingerprint::from_bytes(b"something else"));

    let err = h.db.prepare_local_database().await.unwrap_err();

    assert!(matches!(err, SyncError::FingerprintMismatch { .. }));
    assert!(h.db.session().force_remote());
    assert!(!h.config.db_path().exists());
}

#[tokio::test]
async fn connect_failure_forces_remote_mode() {
    let h = harness();
    h.connector.fail_connects(true);

    let err = h.db.prepare_local_database().await.unwrap_err();

    assert!(matches!(err, SyncError::Engine(_)));
    assert!(h.db.session().force_remote());
    // The database file itself was written before connecting failed.
    assert!(h.config.db_path().exists());
}

// ---------------------------------------------------------------------------
// database_is_available
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_session_without_sync_record_is_unavailable() {
    let h = harness();

    assert!(!h.db.database_is_available().await);
    assert!(h.db.session().force_remote());
    assert!(!h.db.session().local_ready());
}

#[tokio::test]
async fn synchronized_database_is_available() {
    let h = harness();
    h.db.prepare_local_database().await.expect("prepare");

    assert!(h.db.database_is_available().await);
    assert!(!h.db.session().force_remote());
    assert!(h.db.session().local_ready());
}

#[tokio::test]
async fn bundle_update_makes_local_database_stale() {
    let h = harness();
    h.db.prepare_local_database().await.expect("prepare");

    h.assets.replace_bundle(BUNDLE_V2.to_vec());

    assert!(!h.db.database_is_available().await);
    assert!(h.db.session().force_remote());
}

#[tokio::test]
async fn missing_database_file_is_unavailable() {
    let h = harness();
    h.db.prepare_local_database().await.expect("prepare");

    std::fs::remove_file(h.config.db_path()).unwrap();

    assert!(!h.db.database_is_available().await);
    assert!(h.db.session().force_remote());
}

#[tokio::test]
async fn resolve_failure_during_check_is_unavailable() {
    let h = harness();
    h.db.prepare_local_database().await.expect("prepare");

    h.assets.fail_resolve(true);

    assert!(!h.db.database_is_available().await);
    assert!(h.db.session().force_remote());
}

#[tokio::test]
async fn resynchronizing_a_stale_bundle_recovers_local_mode() {
    let h = harness();
    h.db.prepare_local_database().await.expect("prepare");

    h.assets.replace_bundle(BUNDLE_V2.to_vec());
    assert!(!h.db.database_is_available().await);
    assert!(h.db.session().force_remote());

    h.db.prepare_local_database().await.expect("re-prepare");

    assert!(h.db.database_is_available().await);
    assert!(!h.db.session().force_remote());
    assert_eq!(std::fs::read(h.config.db_path()).unwrap(), BUNDLE_V2);
}
