//! Local/remote database façade
//!
//! `Database` owns the two engine handles and the session state that
//! selects between them. Queries prefer the local engine; a local failure
//! demotes the whole session to remote mode for the rest of the process
//! and retries the request once against the remote handle. Local asset
//! preparation and the availability check live here too, since both feed
//! the same session flags.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::asset::{AssetFingerprint, AssetSource, BundledAsset, SyncRecord};
use crate::engine::{
    BookSummary, ChapterPointer, ContentEngine, ContentNode, DictionaryEntry, EngineConnector,
    EngineResult, RangeQuery, ReferenceRange, VersionInfo,
};
use crate::error::SyncError;
use crate::kv::{self, KeyValueStore};
use crate::network::{HttpReachability, Reachability};
use crate::remote::{HttpContentEngine, RemoteEngineConfig};
use crate::session::{EngineMode, SessionState};

/// Directory under the storage root holding SQLite databases.
const SQLITE_DIR_NAME: &str = "SQLite";

/// File name of the synchronized local database.
pub const DB_FILE_NAME: &str = "bibles.db";

/// Version index the book list is served for.
const BOOK_LIST_VERSION_INDEX: u32 = 1;

/// Hebrew lexicon consulted for `H…` Strong's codes.
pub const HEBREW_LEXICON: &str = "@BdbMedDef";

/// Greek lexicon consulted for `G…` Strong's codes.
pub const GREEK_LEXICON: &str = "@MounceMedDef";

/// Database façade configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Remote engine endpoint
    pub remote_url: String,
    /// Root directory for local storage
    pub storage_dir: PathBuf,
}

impl DatabaseConfig {
    pub fn new(remote_url: impl Into<String>, storage_dir: impl Into<PathBuf>) -> Self {
        DatabaseConfig {
            remote_url: remote_url.into(),
            storage_dir: storage_dir.into(),
        }
    }

    /// Directory the local database lives in.
    pub fn sqlite_dir(&self) -> PathBuf {
        self.storage_dir.join(SQLITE_DIR_NAME)
    }

    /// Fixed path of the local database file.
    pub fn db_path(&self) -> PathBuf {
        self.sqlite_dir().join(DB_FILE_NAME)
    }
}

/// A chapter as handed to the reading UI.
///
/// `contents` is guaranteed to be a list of sections: phrase-level engine
/// answers are wrapped in one synthetic untitled section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterResult {
    pub next_chapter: Option<ChapterPointer>,
    pub contents: Vec<ContentNode>,
}

/// Local/remote content façade.
pub struct Database {
    config: DatabaseConfig,
    state: SessionState,
    remote: Arc<dyn ContentEngine>,
    local: RwLock<Option<Arc<dyn ContentEngine>>>,
    connector: Arc<dyn EngineConnector>,
    assets: Arc<dyn AssetSource>,
    store: Arc<dyn KeyValueStore>,
    network: Arc<dyn Reachability>,
}

impl Database {
    /// Build a façade talking to the configured remote endpoint, with
    /// reachability probed against the same host.
    pub fn new(
        config: DatabaseConfig,
        connector: Arc<dyn EngineConnector>,
        assets: Arc<dyn AssetSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let remote: Arc<dyn ContentEngine> = Arc::new(HttpContentEngine::new(
            RemoteEngineConfig::new(config.remote_url.as_str()),
        ));
        let network: Arc<dyn Reachability> =
            Arc::new(HttpReachability::new(config.remote_url.as_str()));
        Self::with_engines(config, remote, connector, assets, store, network)
    }

    /// Build a façade from explicit engine and reachability handles.
    pub fn with_engines(
        config: DatabaseConfig,
        remote: Arc<dyn ContentEngine>,
        connector: Arc<dyn EngineConnector>,
        assets: Arc<dyn AssetSource>,
        store: Arc<dyn KeyValueStore>,
        network: Arc<dyn Reachability>,
    ) -> Self {
        Database {
            config,
            state: SessionState::new(),
            remote,
            local: RwLock::new(None),
            connector,
            assets,
            store,
            network,
        }
    }

    /// Session flags, shared by every operation on this façade.
    pub fn session(&self) -> &SessionState {
        &self.state
    }

    /// Whether a local engine handle is currently connected.
    pub async fn has_local_engine(&self) -> bool {
        self.local.read().await.is_some()
    }

    // -----------------------------------------------------------------
    // Engine selection & fallback
    // -----------------------------------------------------------------

    async fn selected_engine(&self) -> (Arc<dyn ContentEngine>, EngineMode) {
        if !self.state.force_remote() {
            if let Some(local) = self.local.read().await.as_ref() {
                return (Arc::clone(local), EngineMode::Local);
            }
        }
        (Arc::clone(&self.remote), EngineMode::Remote)
    }

    /// Two-attempt loop shared by the query operations: try the selected
    /// engine; when a local attempt fails, demote the session and replay
    /// the identical request against the remote handle once.
    async fn run_with_fallback<T, F, Fut>(&self, operation: &str, attempt: F) -> EngineResult<T>
    where
        F: Fn(Arc<dyn ContentEngine>) -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        let (engine, mode) = self.selected_engine().await;
        match attempt(engine).await {
            Ok(value) => Ok(value),
            Err(err) if mode == EngineMode::Local => {
                warn!(%err, operation, "local engine failed; demoting session to remote");
                self.state.trip_remote();
                attempt(Arc::clone(&self.remote)).await
            }
            Err(err) => Err(err),
        }
    }

    async fn should_fall_back_to_network(&self) -> bool {
        !self.state.force_remote()
            && matches!(self.network.internet_is_available().await, Some(true))
    }

    // -----------------------------------------------------------------
    // Local asset preparation
    // -----------------------------------------------------------------

    /// Download the bundled database to its fixed local path and connect
    /// the local engine over it.
    ///
    /// `local_ready` is false for the whole preparation and flips back
    /// once the attempt is over, successful or not. A failure at any step
    /// forces the session to remote mode and is returned; it is not
    /// retried.
    pub async fn prepare_local_database(&self) -> Result<(), SyncError> {
        self.state.set_local_ready(false);
        let result = self.sync_local_asset().await;
        if let Err(err) = &result {
            warn!(%err, "local database preparation failed; forcing remote mode");
            self.state.trip_remote();
        }
        self.state.set_local_ready(true);
        result
    }

    async fn sync_local_asset(&self) -> Result<(), SyncError> {
        let sqlite_dir = self.config.sqlite_dir();
        tokio::fs::create_dir_all(&sqlite_dir).await?;

        self.store.remove_many(kv::APP_STATE_KEYS).await?;

        let db_path = self.config.db_path();
        match tokio::fs::remove_file(&db_path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let asset = self.assets.resolve().await?;
        let bytes = self.assets.fetch(&asset).await?;
        let actual = AssetFingerprint::from_bytes(&bytes);
        if actual != asset.fingerprint {
            return Err(SyncError::FingerprintMismatch {
                expected: asset.fingerprint.to_string(),
                actual: actual.to_string(),
            });
        }
        tokio::fs::write(&db_path, &bytes).await?;
        info!(path = %db_path.display(), fingerprint = asset.fingerprint.short(), "local database downloaded");

        let record = SyncRecord {
            fingerprint: asset.fingerprint,
            synced_at: Utc::now(),
        };
        self.store
            .put(kv::KEY_SYNC_RECORD, &serde_json::to_string(&record)?)
            .await?;

        self.set_local_engine(&db_path).await?;
        Ok(())
    }

    /// Connect (or reconnect) the local engine over `db_path`. This is the
    /// explicit local re-initialization that clears `force_remote`.
    pub async fn set_local_engine(&self, db_path: &Path) -> EngineResult<()> {
        debug!(path = %db_path.display(), "connecting local engine");
        self.state.clear_force_remote();
        let engine = self.connector.connect_local(db_path).await?;
        *self.local.write().await = Some(engine);
        Ok(())
    }

    /// Advisory check: is the synchronized local database still the one
    /// the bundle advertises?
    ///
    /// True iff the local file exists and the persisted fingerprint equals
    /// the bundle's current fingerprint. Any negative answer (including
    /// check failures) forces the session to remote mode.
    pub async fn database_is_available(&self) -> bool {
        let available = match self.check_local_asset().await {
            Ok(available) => available,
            Err(err) => {
                warn!(%err, "local availability check failed");
                false
            }
        };
        if !available {
            self.state.trip_remote();
        }
        self.state.set_local_ready(available);
        available
    }

    async fn check_local_asset(&self) -> Result<bool, SyncError> {
        let asset = self.assets.resolve().await?;
        let record = match self.store.get(kv::KEY_SYNC_RECORD).await? {
            Some(raw) => serde_json::from_str::<SyncRecord>(&raw)
                .map_err(|e| SyncError::Storage(format!("corrupt sync record: {e}")))?,
            None => return Ok(false),
        };
        let exists = tokio::fs::try_exists(&self.config.db_path()).await?;
        Ok(exists && record.fingerprint == asset.fingerprint)
    }

    /// The bundled asset as the platform currently resolves it.
    pub async fn bundled_asset(&self) -> Result<BundledAsset, SyncError> {
        self.assets.resolve().await
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Fetch one chapter's content with its next-chapter pointer.
    ///
    /// Degrades to `None` when both engines fail; the reading UI shows a
    /// placeholder rather than an error.
    pub async fn get_chapter(
        &self,
        version_uid: &str,
        book_osis_id: &str,
        chapter_num: u32,
    ) -> Option<ChapterResult> {
        let query = RangeQuery {
            version_uid: version_uid.to_string(),
            book_osis_id: book_osis_id.to_string(),
            chapter_num,
        };
        let outcome = self
            .run_with_fallback("get_chapter", |engine| {
                let query = query.clone();
                async move { engine.full_data_for_reference_range(&query).await }
            })
            .await;

        match outcome {
            Ok(data) => {
                let next_chapter = data.context.next_chapter;
                // Phrase-level answers get one synthetic wrapping section so
                // callers always receive a list of sections.
                let phrase_level = matches!(data.contents.first(), Some(ContentNode::Phrase(_)));
                let contents = if phrase_level {
                    vec![ContentNode::synthetic_section(data.contents)]
                } else {
                    data.contents
                };
                Some(ChapterResult {
                    next_chapter,
                    contents,
                })
            }
            Err(err) => {
                warn!(%err, book = book_osis_id, chapter = chapter_num, "chapter unavailable");
                None
            }
        }
    }

    /// List the books of the served version.
    ///
    /// A local failure retries remotely only when the session is not
    /// already demoted and the network is reachable; otherwise the result
    /// degrades to an explicit empty list.
    pub async fn get_books(&self) -> Vec<BookSummary> {
        let (engine, _mode) = self.selected_engine().await;
        match engine.books_for_version(BOOK_LIST_VERSION_INDEX).await {
            Ok(books) => books.into_iter().map(BookSummary::from).collect(),
            Err(err) => {
                if self.should_fall_back_to_network().await {
                    info!("failed to query local database, falling back to network");
                    self.state.trip_remote();
                    match self.remote.books_for_version(BOOK_LIST_VERSION_INDEX).await {
                        Ok(books) => books.into_iter().map(BookSummary::from).collect(),
                        Err(err) => {
                            warn!(%err, "remote book list failed; returning empty list");
                            Vec::new()
                        }
                    }
                } else {
                    warn!(%err, "book list unavailable; returning empty list");
                    Vec::new()
                }
            }
        }
    }

    /// List installed versions. Failures degrade to an empty list with no
    /// retry and no mode change.
    pub async fn get_versions(&self) -> Vec<VersionInfo> {
        let (engine, _mode) = self.selected_engine().await;
        match engine.versions().await {
            Ok(versions) => versions,
            Err(err) => {
                warn!(%err, "version list query failed");
                Vec::new()
            }
        }
    }

    /// Fetch the text of each referenced verse, phrase contents joined by
    /// single spaces, in reference order.
    ///
    /// Per-verse phrase lookup is a local-only operation: in remote mode
    /// (or with no local engine connected) this returns one empty string
    /// per reference instead of querying the remote engine.
    pub async fn get_verse_contents(&self, refs: &[ReferenceRange]) -> EngineResult<Vec<String>> {
        let local = if self.state.force_remote() {
            None
        } else {
            self.local.read().await.as_ref().map(Arc::clone)
        };
        let Some(engine) = local else {
            return Ok(refs.iter().map(|_| String::new()).collect());
        };

        let fetches = refs.iter().map(|range| {
            let engine = Arc::clone(&engine);
            let range = range.clone();
            async move { engine.phrases(&range).await }
        });
        let phrase_lists = futures::future::try_join_all(fetches).await?;

        Ok(phrase_lists
            .into_iter()
            .map(|phrases| {
                phrases
                    .iter()
                    .map(|phrase| phrase.content.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect())
    }

    /// Look up lexicon definitions for a list of Strong's codes.
    ///
    /// `H…` codes consult the Hebrew lexicon, `G…` codes the Greek one;
    /// other codes yield nothing. Only the first definition per code is
    /// kept and codes without definitions are dropped. Failure handling
    /// matches [`get_books`](Database::get_books).
    pub async fn get_dictionary_entries(&self, strongs: &[String]) -> Vec<DictionaryEntry> {
        let (engine, _mode) = self.selected_engine().await;
        match Self::lookup_definitions(&engine, strongs).await {
            Ok(definitions) => definitions,
            Err(err) => {
                if self.should_fall_back_to_network().await {
                    info!("failed to query local lexicons, falling back to network");
                    self.state.trip_remote();
                    match Self::lookup_definitions(&self.remote, strongs).await {
                        Ok(definitions) => definitions,
                        Err(err) => {
                            warn!(%err, "remote lexicon lookup failed; returning no definitions");
                            Vec::new()
                        }
                    }
                } else {
                    warn!(%err, "lexicon lookup unavailable; returning no definitions");
                    Vec::new()
                }
            }
        }
    }

    async fn lookup_definitions(
        engine: &Arc<dyn ContentEngine>,
        strongs: &[String],
    ) -> EngineResult<Vec<DictionaryEntry>> {
        let mut definitions = Vec::new();
        for strong in strongs {
            let dictionary = match strong.chars().next() {
                Some('H') => HEBREW_LEXICON,
                Some('G') => GREEK_LEXICON,
                _ => continue,
            };
            let mut entries = engine.dictionary_entries(strong, dictionary).await?;
            if !entries.is_empty() {
                definitions.push(entries.remove(0));
            }
        }
        Ok(definitions)
    }
}
