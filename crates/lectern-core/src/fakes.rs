//! In-memory fakes for the trait seams (testing only)
//!
//! Provides `MemoryContentEngine`, `MemoryKeyValueStore`,
//! `StaticAssetSource`, `MemoryEngineConnector`, and `StaticReachability`
//! that satisfy the trait contracts without touching the network or disk.
//! Failure injection flags let tests drive the fallback paths.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::asset::{AssetFingerprint, AssetSource, BundledAsset, SyncResult};
use crate::engine::{
    Book, ContentEngine, DictionaryEntry, EngineConnector, EngineResult, Phrase, RangeData,
    RangeQuery, ReferenceRange, VersionInfo,
};
use crate::error::EngineError;
use crate::kv::KeyValueStore;
use crate::network::Reachability;
use crate::v11n::V11nRule;

// ---------------------------------------------------------------------------
// MemoryContentEngine
// ---------------------------------------------------------------------------

fn range_key(range: &ReferenceRange) -> String {
    format!(
        "{}.{}:{}",
        range.book_osis_id, range.version_chapter_num, range.version_verse_num
    )
}

/// Configurable in-memory content engine.
///
/// Seed it with answers per operation; flip `fail_requests(true)` to make
/// every call fail with a query error.
#[derive(Default)]
pub struct MemoryContentEngine {
    fail: AtomicBool,
    calls: AtomicUsize,
    range_data: Mutex<Option<RangeData>>,
    books: Mutex<Vec<Book>>,
    versions: Mutex<Vec<VersionInfo>>,
    phrases: Mutex<HashMap<String, Vec<Phrase>>>,
    dictionary: Mutex<HashMap<String, Vec<DictionaryEntry>>>,
    v11n_batches: Mutex<Vec<Vec<V11nRule>>>,
}

impl MemoryContentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// Total engine calls observed, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn set_range_data(&self, data: RangeData) {
        *self.range_data.lock().unwrap() = Some(data);
    }

    pub fn set_books(&self, books: Vec<Book>) {
        *self.books.lock().unwrap() = books;
    }

    pub fn set_versions(&self, versions: Vec<VersionInfo>) {
        *self.versions.lock().unwrap() = versions;
    }

    pub fn set_phrases(&self, range: &ReferenceRange, phrases: Vec<Phrase>) {
        self.phrases
            .lock()
            .unwrap()
            .insert(range_key(range), phrases);
    }

    pub fn set_dictionary(&self, strong: &str, dictionary: &str, entries: Vec<DictionaryEntry>) {
        self.dictionary
            .lock()
            .unwrap()
            .insert(format!("{strong}/{dictionary}"), entries);
    }

    /// Batches submitted through `add_v11n_rules`, oldest first.
    pub fn v11n_batches(&self) -> Vec<Vec<V11nRule>> {
        self.v11n_batches.lock().unwrap().clone()
    }

    fn check(&self) -> EngineResult<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail.load(Ordering::Relaxed) {
            return Err(EngineError::Query("injected engine failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentEngine for MemoryContentEngine {
    async fn full_data_for_reference_range(&self, _range: &RangeQuery) -> EngineResult<RangeData> {
        self.check()?;
        self.range_data
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| EngineError::Query("no range data seeded".to_string()))
    }

    async fn books_for_version(&self, _version_index: u32) -> EngineResult<Vec<Book>> {
        self.check()?;
        Ok(self.books.lock().unwrap().clone())
    }

    async fn versions(&self) -> EngineResult<Vec<VersionInfo>> {
        self.check()?;
        Ok(self.versions.lock().unwrap().clone())
    }

    async fn phrases(&self, range: &ReferenceRange) -> EngineResult<Vec<Phrase>> {
        self.check()?;
        Ok(self
            .phrases
            .lock()
            .unwrap()
            .get(&range_key(range))
            .cloned()
            .unwrap_or_default())
    }

    async fn dictionary_entries(
        &self,
        strong: &str,
        dictionary: &str,
    ) -> EngineResult<Vec<DictionaryEntry>> {
        self.check()?;
        Ok(self
            .dictionary
            .lock()
            .unwrap()
            .get(&format!("{strong}/{dictionary}"))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_v11n_rules(&self, rules: Vec<V11nRule>) -> EngineResult<()> {
        self.check()?;
        self.v11n_batches.lock().unwrap().push(rules);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryKeyValueStore
// ---------------------------------------------------------------------------

/// In-memory key-value store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> SyncResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> SyncResult<()> {
        let mut entries = self.entries.lock().unwrap();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StaticAssetSource
// ---------------------------------------------------------------------------

/// Asset source serving a fixed in-memory bundle.
pub struct StaticAssetSource {
    asset: Mutex<BundledAsset>,
    bytes: Mutex<Vec<u8>>,
    fail_resolve: AtomicBool,
    fail_fetch: AtomicBool,
}

impl StaticAssetSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let asset = BundledAsset {
            uri: "asset://bundled.db".to_string(),
            fingerprint: AssetFingerprint::from_bytes(&bytes),
        };
        StaticAssetSource {
            asset: Mutex::new(asset),
            bytes: Mutex::new(bytes),
            fail_resolve: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
        }
    }

    /// Swap the bundle contents, recomputing the advertised fingerprint —
    /// simulates an app update shipping a new database.
    pub fn replace_bundle(&self, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        self.asset.lock().unwrap().fingerprint = AssetFingerprint::from_bytes(&bytes);
        *self.bytes.lock().unwrap() = bytes;
    }

    /// Advertise a fingerprint that does not match the served bytes —
    /// simulates a corrupted download.
    pub fn advertise_fingerprint(&self, fingerprint: AssetFingerprint) {
        self.asset.lock().unwrap().fingerprint = fingerprint;
    }

    pub fn fingerprint(&self) -> AssetFingerprint {
        self.asset.lock().unwrap().fingerprint.clone()
    }

    pub fn fail_resolve(&self, fail: bool) {
        self.fail_resolve.store(fail, Ordering::Relaxed);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl AssetSource for StaticAssetSource {
    async fn resolve(&self) -> SyncResult<BundledAsset> {
        if self.fail_resolve.load(Ordering::Relaxed) {
            return Err(crate::error::SyncError::Download(
                "injected resolve failure".to_string(),
            ));
        }
        Ok(self.asset.lock().unwrap().clone())
    }

    async fn fetch(&self, _asset: &BundledAsset) -> SyncResult<Vec<u8>> {
        if self.fail_fetch.load(Ordering::Relaxed) {
            return Err(crate::error::SyncError::Download(
                "injected fetch failure".to_string(),
            ));
        }
        Ok(self.bytes.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryEngineConnector
// ---------------------------------------------------------------------------

/// Connector handing out a shared in-memory engine as the "local" handle.
pub struct MemoryEngineConnector {
    engine: Arc<MemoryContentEngine>,
    fail: AtomicBool,
    connects: AtomicUsize,
}

impl MemoryEngineConnector {
    pub fn new(engine: Arc<MemoryContentEngine>) -> Self {
        MemoryEngineConnector {
            engine,
            fail: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn fail_connects(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::Relaxed)
    }

    pub fn engine(&self) -> Arc<MemoryContentEngine> {
        Arc::clone(&self.engine)
    }
}

#[async_trait]
impl EngineConnector for MemoryEngineConnector {
    async fn connect_local(&self, _db_path: &Path) -> EngineResult<Arc<dyn ContentEngine>> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(EngineError::Connection(
                "injected connect failure".to_string(),
            ));
        }
        self.connects.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::clone(&self.engine) as Arc<dyn ContentEngine>)
    }
}

// ---------------------------------------------------------------------------
// StaticReachability
// ---------------------------------------------------------------------------

/// Reachability fake with a fixed (but settable) answer.
pub struct StaticReachability {
    answer: Mutex<Option<bool>>,
}

impl StaticReachability {
    pub fn new(answer: Option<bool>) -> Self {
        StaticReachability {
            answer: Mutex::new(answer),
        }
    }

    pub fn set(&self, answer: Option<bool>) {
        *self.answer.lock().unwrap() = answer;
    }
}

#[async_trait]
impl Reachability for StaticReachability {
    async fn internet_is_available(&self) -> Option<bool> {
        *self.answer.lock().unwrap()
    }
}
