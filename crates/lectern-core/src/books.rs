//! Book-token and source-type lookup tables
//!
//! The v11n rules file names books by OSIS id or by a handful of alternate
//! spellings, and names the versification tradition each rule derives from.
//! Both lookups are fixed tables: an unknown token is a hard importer error.

/// OSIS ids of the Protestant canon plus accepted alternate tokens.
const BOOKS: &[(&str, &[&str])] = &[
    ("Gen", &["Genesis"]),
    ("Exod", &["Exodus", "Ex"]),
    ("Lev", &["Leviticus"]),
    ("Num", &["Numbers"]),
    ("Deut", &["Deuteronomy", "Deu"]),
    ("Josh", &["Joshua", "Jos"]),
    ("Judg", &["Judges", "Jdg"]),
    ("Ruth", &["Rut"]),
    ("1Sam", &["1Samuel", "1Sa"]),
    ("2Sam", &["2Samuel", "2Sa"]),
    ("1Kgs", &["1Kings", "1Ki"]),
    ("2Kgs", &["2Kings", "2Ki"]),
    ("1Chr", &["1Chronicles", "1Ch"]),
    ("2Chr", &["2Chronicles", "2Ch"]),
    ("Ezra", &["Ezr"]),
    ("Neh", &["Nehemiah"]),
    ("Esth", &["Esther", "Est"]),
    ("Job", &[]),
    ("Ps", &["Psalms", "Psalm", "Psa"]),
    ("Prov", &["Proverbs", "Pro"]),
    ("Eccl", &["Ecclesiastes", "Ecc", "Qoh"]),
    ("Song", &["SongofSongs", "Sng", "Cant"]),
    ("Isa", &["Isaiah"]),
    ("Jer", &["Jeremiah"]),
    ("Lam", &["Lamentations"]),
    ("Ezek", &["Ezekiel", "Ezk"]),
    ("Dan", &["Daniel"]),
    ("Hos", &["Hosea"]),
    ("Joel", &["Jol"]),
    ("Amos", &["Amo"]),
    ("Obad", &["Obadiah", "Oba"]),
    ("Jonah", &["Jon"]),
    ("Mic", &["Micah"]),
    ("Nah", &["Nahum", "Nam"]),
    ("Hab", &["Habakkuk"]),
    ("Zeph", &["Zephaniah", "Zep"]),
    ("Hag", &["Haggai"]),
    ("Zech", &["Zechariah", "Zec"]),
    ("Mal", &["Malachi"]),
    ("Matt", &["Matthew", "Mat"]),
    ("Mark", &["Mrk"]),
    ("Luke", &["Luk"]),
    ("John", &["Jhn"]),
    ("Acts", &["Act"]),
    ("Rom", &["Romans"]),
    ("1Cor", &["1Corinthians", "1Co"]),
    ("2Cor", &["2Corinthians", "2Co"]),
    ("Gal", &["Galatians"]),
    ("Eph", &["Ephesians"]),
    ("Phil", &["Philippians", "Php"]),
    ("Col", &["Colossians"]),
    ("1Thess", &["1Thessalonians", "1Th"]),
    ("2Thess", &["2Thessalonians", "2Th"]),
    ("1Tim", &["1Timothy", "1Ti"]),
    ("2Tim", &["2Timothy", "2Ti"]),
    ("Titus", &["Tit"]),
    ("Phlm", &["Philemon", "Phm"]),
    ("Heb", &["Hebrews"]),
    ("Jas", &["James", "Jam"]),
    ("1Pet", &["1Peter", "1Pe"]),
    ("2Pet", &["2Peter", "2Pe"]),
    ("1John", &["1Jn"]),
    ("2John", &["2Jn"]),
    ("3John", &["3Jn"]),
    ("Jude", &["Jud"]),
    ("Rev", &["Revelation"]),
];

/// Versification traditions a rule may derive from, in id order.
const SOURCE_TYPES: &[&str] = &[
    "Hebrew",
    "Greek",
    "Greek2",
    "GreekUndivided",
    "Latin",
    "Latin2",
    "English",
    "Spanish",
];

/// Resolve a book token to its canonical OSIS id. Case-insensitive.
pub fn osis_id_from_book_token(token: &str) -> Option<&'static str> {
    let needle = token.trim();
    if needle.is_empty() {
        return None;
    }
    BOOKS
        .iter()
        .find(|(osis, alternates)| {
            osis.eq_ignore_ascii_case(needle)
                || alternates.iter().any(|alt| alt.eq_ignore_ascii_case(needle))
        })
        .map(|(osis, _)| *osis)
}

/// Resolve a source-type name to its stable numeric id (1-based).
pub fn source_type_id(name: &str) -> Option<u8> {
    SOURCE_TYPES
        .iter()
        .position(|t| *t == name.trim())
        .map(|idx| (idx + 1) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_osis_ids_resolve_to_themselves() {
        assert_eq!(osis_id_from_book_token("Gen"), Some("Gen"));
        assert_eq!(osis_id_from_book_token("2Kgs"), Some("2Kgs"));
        assert_eq!(osis_id_from_book_token("Rev"), Some("Rev"));
    }

    #[test]
    fn alternates_and_case_fold_to_canonical() {
        assert_eq!(osis_id_from_book_token("genesis"), Some("Gen"));
        assert_eq!(osis_id_from_book_token("PSALM"), Some("Ps"));
        assert_eq!(osis_id_from_book_token(" 1Co "), Some("1Cor"));
    }

    #[test]
    fn unknown_tokens_resolve_to_nothing() {
        assert_eq!(osis_id_from_book_token("Enoch"), None);
        assert_eq!(osis_id_from_book_token(""), None);
    }

    #[test]
    fn source_types_have_stable_ids() {
        assert_eq!(source_type_id("Hebrew"), Some(1));
        assert_eq!(source_type_id("Latin"), Some(5));
        assert_eq!(source_type_id("Klingon"), None);
    }
}
