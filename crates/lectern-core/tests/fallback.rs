//! Engine selection and fallback behavior of the `Database` façade.

use std::path::Path;
use std::sync::Arc;

use lectern_core::fakes::{
    MemoryContentEngine, MemoryEngineConnector, MemoryKeyValueStore, StaticAssetSource,
    StaticReachability,
};
use lectern_core::{
    Book, ChapterPointer, ContentNode, Database, DatabaseConfig, DictionaryEntry, Phrase,
    RangeContext, RangeData, ReferenceRange, VersionInfo, GREEK_LEXICON, HEBREW_LEXICON,
};

struct Harness {
    db: Database,
    local: Arc<MemoryContentEngine>,
    remote: Arc<MemoryContentEngine>,
    network: Arc<StaticReachability>,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = Arc::new(MemoryContentEngine::new());
    let remote = Arc::new(MemoryContentEngine::new());
    let connector = Arc::new(MemoryEngineConnector::new(Arc::clone(&local)));
    let assets = Arc::new(StaticAssetSource::new(b"bundle".to_vec()));
    let network = Arc::new(StaticReachability::new(Some(true)));

    let db = Database::with_engines(
        DatabaseConfig::new("https://engine.example.com", dir.path()),
        Arc::clone(&remote) as Arc<dyn lectern_core::ContentEngine>,
        connector,
        assets,
        Arc::new(MemoryKeyValueStore::new()),
        Arc::clone(&network) as Arc<dyn lectern_core::Reachability>,
    );
    Harness {
        db,
        local,
        remote,
        network,
        _dir: dir,
    }
}

async fn connect_local(h: &Harness) {
    h.db.set_local_engine(Path::new("/tmp/bibles.db"))
        .await
        .expect("connect local engine");
}

fn phrase(content: &str) -> ContentNode {
    ContentNode::Phrase(Phrase {
        content: content.to_string(),
        strongs: Vec::new(),
    })
}

fn chapter_data(contents: Vec<ContentNode>, next: Option<ChapterPointer>) -> RangeData {
    RangeData {
        contents,
        context: RangeContext { next_chapter: next },
    }
}

fn book(osis_id: &str, title: &str, chapters: usize) -> Book {
    Book {
        osis_id: osis_id.to_string(),
        title: title.to_string(),
        chapters_count: vec![10; chapters],
    }
}

// ---------------------------------------------------------------------------
// Circuit breaker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn local_failure_demotes_session_and_retries_remotely() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.remote
        .set_range_data(chapter_data(vec![phrase("In the beginning")], None));

    let result = h.db.get_chapter("ESV", "Gen", 1).await;

    assert!(result.is_some(), "remote retry should answer");
    assert!(h.db.session().force_remote());
    assert_eq!(h.local.call_count(), 1);
    assert_eq!(h.remote.call_count(), 1);
}

#[tokio::test]
async fn demotion_is_sticky_across_operations() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.remote.set_range_data(chapter_data(vec![phrase("text")], None));
    h.db.get_chapter("ESV", "Gen", 1).await;

    // Local recovers, but the session stays demoted.
    h.local.fail_requests(false);
    h.local.set_versions(vec![VersionInfo {
        uid: "LOCAL".to_string(),
        title: "Local Version".to_string(),
        language: "en".to_string(),
    }]);
    h.remote.set_versions(vec![VersionInfo {
        uid: "REMOTE".to_string(),
        title: "Remote Version".to_string(),
        language: "en".to_string(),
    }]);

    let versions = h.db.get_versions().await;
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].uid, "REMOTE");
}

#[tokio::test]
async fn reconnecting_local_engine_clears_demotion() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.remote.set_range_data(chapter_data(vec![phrase("text")], None));
    h.db.get_chapter("ESV", "Gen", 1).await;
    assert!(h.db.session().force_remote());

    h.local.fail_requests(false);
    connect_local(&h).await;
    assert!(!h.db.session().force_remote());

    h.local.set_versions(vec![VersionInfo {
        uid: "LOCAL".to_string(),
        title: "Local Version".to_string(),
        language: "en".to_string(),
    }]);
    let versions = h.db.get_versions().await;
    assert_eq!(versions[0].uid, "LOCAL");
}

#[tokio::test]
async fn without_local_engine_queries_go_remote_without_demotion() {
    let h = harness();
    h.remote
        .set_range_data(chapter_data(vec![phrase("text")], None));

    let result = h.db.get_chapter("ESV", "Gen", 1).await;

    assert!(result.is_some());
    assert_eq!(h.local.call_count(), 0);
    assert!(!h.db.session().force_remote());
}

// ---------------------------------------------------------------------------
// get_chapter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn phrase_level_chapters_are_wrapped_in_one_synthetic_section() {
    let h = harness();
    connect_local(&h).await;
    h.local.set_range_data(chapter_data(
        vec![phrase("In the beginning"), phrase("God created")],
        None,
    ));

    let result = h.db.get_chapter("ESV", "Gen", 1).await.expect("chapter");

    assert_eq!(result.contents.len(), 1);
    match &result.contents[0] {
        ContentNode::Section { title, contents } => {
            assert_eq!(title, "");
            assert_eq!(contents.len(), 2);
        }
        ContentNode::Phrase(_) => panic!("first node must be a section"),
    }
}

#[tokio::test]
async fn section_level_chapters_pass_through_unwrapped() {
    let h = harness();
    connect_local(&h).await;
    let section = ContentNode::Section {
        title: "The Creation".to_string(),
        contents: vec![phrase("In the beginning")],
    };
    h.local
        .set_range_data(chapter_data(vec![section.clone()], None));

    let result = h.db.get_chapter("ESV", "Gen", 1).await.expect("chapter");

    assert_eq!(result.contents, vec![section]);
}

#[tokio::test]
async fn next_chapter_pointer_is_passed_through_when_present() {
    let h = harness();
    connect_local(&h).await;
    let next = ChapterPointer {
        book_osis_id: "Gen".to_string(),
        chapter_num: 2,
    };
    h.local
        .set_range_data(chapter_data(vec![phrase("text")], Some(next.clone())));

    let result = h.db.get_chapter("ESV", "Gen", 1).await.expect("chapter");
    assert_eq!(result.next_chapter, Some(next));
}

#[tokio::test]
async fn missing_next_chapter_is_not_an_error() {
    let h = harness();
    connect_local(&h).await;
    h.local
        .set_range_data(chapter_data(vec![phrase("last words")], None));

    let result = h.db.get_chapter("ESV", "Rev", 22).await.expect("chapter");
    assert_eq!(result.next_chapter, None);
}

#[tokio::test]
async fn chapter_degrades_to_none_when_both_engines_fail() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.remote.fail_requests(true);

    let result = h.db.get_chapter("ESV", "Gen", 1).await;

    assert!(result.is_none());
    assert!(h.db.session().force_remote());
}

// ---------------------------------------------------------------------------
// get_books
// ---------------------------------------------------------------------------

#[tokio::test]
async fn books_are_flattened_to_summaries() {
    let h = harness();
    connect_local(&h).await;
    h.local.set_books(vec![
        book("Gen", "Genesis", 50),
        book("Exod", "Exodus", 40),
    ]);

    let books = h.db.get_books().await;

    assert_eq!(books.len(), 2);
    assert_eq!(books[0].osis_id, "Gen");
    assert_eq!(books[0].num_chapters, 50);
    assert_eq!(books[1].num_chapters, 40);
}

#[tokio::test]
async fn book_failure_falls_back_when_network_is_reachable() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.remote.set_books(vec![book("Gen", "Genesis", 50)]);

    let books = h.db.get_books().await;

    assert_eq!(books.len(), 1);
    assert!(h.db.session().force_remote());
}

#[tokio::test]
async fn book_failure_with_unknown_reachability_returns_empty() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.network.set(None);
    h.remote.set_books(vec![book("Gen", "Genesis", 50)]);

    let books = h.db.get_books().await;

    assert!(books.is_empty());
    assert!(!h.db.session().force_remote());
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn book_failure_when_already_remote_returns_empty() {
    let h = harness();
    connect_local(&h).await;
    h.db.session().trip_remote();
    h.remote.fail_requests(true);

    let books = h.db.get_books().await;
    assert!(books.is_empty());
}

// ---------------------------------------------------------------------------
// get_versions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn version_failure_degrades_to_empty_without_retry() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.remote.set_versions(vec![VersionInfo {
        uid: "REMOTE".to_string(),
        title: "Remote Version".to_string(),
        language: "en".to_string(),
    }]);

    let versions = h.db.get_versions().await;

    assert!(versions.is_empty());
    assert!(!h.db.session().force_remote());
    assert_eq!(h.remote.call_count(), 0);
}

// ---------------------------------------------------------------------------
// get_verse_contents
// ---------------------------------------------------------------------------

fn verse_ref(book: &str, chapter: u32, verse: u32) -> ReferenceRange {
    ReferenceRange {
        book_osis_id: book.to_string(),
        version_chapter_num: chapter,
        version_verse_num: verse,
        version_chapter_end_num: None,
        version_verse_end_num: None,
    }
}

#[tokio::test]
async fn verse_contents_join_phrases_in_reference_order() {
    let h = harness();
    connect_local(&h).await;
    let gen = verse_ref("Gen", 1, 1);
    let john = verse_ref("John", 3, 16);
    h.local.set_phrases(
        &gen,
        vec![
            Phrase {
                content: "In the beginning".to_string(),
                strongs: vec!["H7225".to_string()],
            },
            Phrase {
                content: "God created".to_string(),
                strongs: Vec::new(),
            },
        ],
    );
    h.local.set_phrases(
        &john,
        vec![Phrase {
            content: "For God so loved".to_string(),
            strongs: Vec::new(),
        }],
    );

    let contents = h
        .db
        .get_verse_contents(&[gen, john])
        .await
        .expect("verse contents");

    assert_eq!(contents, vec!["In the beginning God created", "For God so loved"]);
}

#[tokio::test]
async fn verse_contents_in_remote_mode_are_empty_placeholders() {
    let h = harness();
    connect_local(&h).await;
    h.db.session().trip_remote();

    let refs = [verse_ref("Gen", 1, 1), verse_ref("Gen", 1, 2), verse_ref("Gen", 1, 3)];
    let contents = h.db.get_verse_contents(&refs).await.expect("verse contents");

    assert_eq!(contents, vec!["", "", ""]);
    assert_eq!(h.local.call_count(), 0);
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn verse_contents_without_local_engine_are_empty_placeholders() {
    let h = harness();

    let refs = [verse_ref("Ps", 23, 1)];
    let contents = h.db.get_verse_contents(&refs).await.expect("verse contents");

    assert_eq!(contents, vec![""]);
}

// ---------------------------------------------------------------------------
// get_dictionary_entries
// ---------------------------------------------------------------------------

fn entry(strong: &str, dictionary: &str, lemma: &str) -> DictionaryEntry {
    DictionaryEntry {
        strong: strong.to_string(),
        dictionary: dictionary.to_string(),
        lemma: lemma.to_string(),
        gloss: String::new(),
        content: format!("definition of {lemma}"),
    }
}

#[tokio::test]
async fn strongs_codes_dispatch_to_their_lexicon() {
    let h = harness();
    connect_local(&h).await;
    h.local.set_dictionary(
        "H430",
        HEBREW_LEXICON,
        vec![entry("H430", HEBREW_LEXICON, "elohim"), entry("H430", HEBREW_LEXICON, "dup")],
    );
    h.local.set_dictionary(
        "G2316",
        GREEK_LEXICON,
        vec![entry("G2316", GREEK_LEXICON, "theos")],
    );

    let strongs = vec![
        "H430".to_string(),
        "G2316".to_string(),
        "X999".to_string(),
        "H9999".to_string(),
    ];
    let definitions = h.db.get_dictionary_entries(&strongs).await;

    // First definition per code; unknown prefixes and empty lookups drop out.
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[0].lemma, "elohim");
    assert_eq!(definitions[1].lemma, "theos");
}

#[tokio::test]
async fn dictionary_failure_falls_back_when_network_is_reachable() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.remote.set_dictionary(
        "H430",
        HEBREW_LEXICON,
        vec![entry("H430", HEBREW_LEXICON, "elohim")],
    );

    let definitions = h.db.get_dictionary_entries(&["H430".to_string()]).await;

    assert_eq!(definitions.len(), 1);
    assert!(h.db.session().force_remote());
}

#[tokio::test]
async fn dictionary_failure_without_reachability_returns_empty() {
    let h = harness();
    connect_local(&h).await;
    h.local.fail_requests(true);
    h.network.set(Some(false));

    let definitions = h.db.get_dictionary_entries(&["H430".to_string()]).await;

    assert!(definitions.is_empty());
    assert!(!h.db.session().force_remote());
}
