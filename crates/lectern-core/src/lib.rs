//! Lectern Core Library
//!
//! Data-access layer for the Lectern Bible reader. The content engine that
//! stores and serves Bible text is an external component; this crate owns
//! everything around it:
//!
//! - `Database`: local/remote fallback façade over two engine handles
//! - local asset synchronization with fingerprint-checked downloads
//! - persisted key-value state for the sync record and reading position
//! - the versification (v11n) rule model, parser, and batch importer

pub mod asset;
pub mod books;
pub mod database;
pub mod engine;
pub mod error;
pub mod fakes;
pub mod kv;
pub mod network;
pub mod remote;
pub mod session;
pub mod telemetry;
pub mod v11n;

pub use asset::{
    AssetFingerprint, AssetSource, BundledAsset, HttpAssetSource, SyncRecord, SyncResult,
};
pub use books::{osis_id_from_book_token, source_type_id};
pub use database::{
    ChapterResult, Database, DatabaseConfig, DB_FILE_NAME, GREEK_LEXICON, HEBREW_LEXICON,
};
pub use engine::{
    Book, BookSummary, ChapterPointer, ContentEngine, ContentNode, DictionaryEntry,
    EngineConnector, EngineResult, Phrase, RangeContext, RangeData, RangeQuery, ReferenceRange,
    VersionInfo,
};
pub use error::{EngineError, ImportError, SyncError};
pub use kv::{FsKeyValueStore, KeyValueStore, APP_STATE_KEYS, KEY_SYNC_RECORD};
pub use network::{HttpReachability, Reachability};
pub use remote::{HttpContentEngine, RemoteEngineConfig, REMOTE_URL_ENV};
pub use session::{EngineMode, SessionState};
pub use telemetry::init_tracing;
pub use v11n::{
    parse_rules, run_import, ImportSummary, ParsedRules, SourceReference, StandardReference,
    V11nAction, V11nRule,
};
