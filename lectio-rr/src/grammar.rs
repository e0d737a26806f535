//! Reference Grammar
//!
//! Recognizes scripture citations inside arbitrary text and classifies a
//! citation by its leading book token.
//!
//! A citation is `[ordinal] Book chapter[:verse-list]` where the verse list
//! holds comma-separated verses and ranges (hyphen, en-dash or em-dash), verse
//! numbers may carry `a`-`e` part letters, and further `chapter:verses` groups
//! may follow after `and` or `;`.

use crate::types::CitationClass;
use once_cell::sync::Lazy;
use regex::Regex;

/// One biblical book with every spelling the providers are known to use
pub struct BookEntry {
    /// Canonical English name (without ordinal)
    pub canonical: &'static str,
    /// Display spellings, capitalized as they appear on provider pages
    pub spellings: &'static [&'static str],
}

/// Book table shared by the grammar, the classifier and the canonicalizer
///
/// Includes Douay-Rheims names (Josue, Isaias, ...) and lectionary
/// abbreviations (Is, Ps, Mt, ...).
pub static BOOKS: &[BookEntry] = &[
    BookEntry { canonical: "Genesis", spellings: &["Genesis", "Gen", "Gn"] },
    BookEntry { canonical: "Exodus", spellings: &["Exodus", "Exod", "Ex"] },
    BookEntry { canonical: "Leviticus", spellings: &["Leviticus", "Lev", "Lv"] },
    BookEntry { canonical: "Numbers", spellings: &["Numbers", "Num", "Nm"] },
    BookEntry { canonical: "Deuteronomy", spellings: &["Deuteronomy", "Deut", "Dt"] },
    BookEntry { canonical: "Joshua", spellings: &["Joshua", "Josue", "Josh", "Jos"] },
    BookEntry { canonical: "Judges", spellings: &["Judges", "Judg", "Jgs"] },
    BookEntry { canonical: "Ruth", spellings: &["Ruth", "Ru"] },
    BookEntry { canonical: "Samuel", spellings: &["Samuel", "Sam", "Sm"] },
    BookEntry { canonical: "Kings", spellings: &["Kings", "Kgs"] },
    BookEntry { canonical: "Chronicles", spellings: &["Chronicles", "Paralipomenon", "Chr"] },
    BookEntry { canonical: "Ezra", spellings: &["Ezra", "Ezr"] },
    BookEntry { canonical: "Nehemiah", spellings: &["Nehemiah", "Neh"] },
    BookEntry { canonical: "Tobit", spellings: &["Tobit", "Tobias", "Tob", "Tb"] },
    BookEntry { canonical: "Judith", spellings: &["Judith", "Jdt"] },
    BookEntry { canonical: "Esther", spellings: &["Esther", "Est"] },
    BookEntry { canonical: "Maccabees", spellings: &["Maccabees", "Machabees", "Macc", "Mc"] },
    BookEntry { canonical: "Job", spellings: &["Job", "Jb"] },
    BookEntry { canonical: "Psalm", spellings: &["Psalms", "Psalm", "Pss", "Ps"] },
    BookEntry { canonical: "Proverbs", spellings: &["Proverbs", "Prov", "Prv"] },
    BookEntry { canonical: "Ecclesiastes", spellings: &["Ecclesiastes", "Qoheleth", "Eccl"] },
    BookEntry {
        canonical: "Song of Songs",
        spellings: &["Song of Songs", "Song of Solomon", "Canticle of Canticles", "Sg"],
    },
    BookEntry { canonical: "Wisdom", spellings: &["Wisdom", "Wis"] },
    BookEntry { canonical: "Sirach", spellings: &["Sirach", "Ecclesiasticus", "Sir"] },
    BookEntry { canonical: "Isaiah", spellings: &["Isaiah", "Isaias", "Isa", "Is"] },
    BookEntry { canonical: "Jeremiah", spellings: &["Jeremiah", "Jeremias", "Jer"] },
    BookEntry { canonical: "Lamentations", spellings: &["Lamentations", "Lam"] },
    BookEntry { canonical: "Baruch", spellings: &["Baruch", "Bar"] },
    BookEntry { canonical: "Ezekiel", spellings: &["Ezekiel", "Ezechiel", "Ezek", "Ez"] },
    BookEntry { canonical: "Daniel", spellings: &["Daniel", "Dan", "Dn"] },
    BookEntry { canonical: "Hosea", spellings: &["Hosea", "Osee", "Hos"] },
    BookEntry { canonical: "Joel", spellings: &["Joel", "Jl"] },
    BookEntry { canonical: "Amos", spellings: &["Amos", "Am"] },
    BookEntry { canonical: "Obadiah", spellings: &["Obadiah", "Abdias", "Ob"] },
    BookEntry { canonical: "Jonah", spellings: &["Jonah", "Jonas", "Jon"] },
    BookEntry { canonical: "Micah", spellings: &["Micah", "Micheas", "Mic", "Mi"] },
    BookEntry { canonical: "Nahum", spellings: &["Nahum", "Nah", "Na"] },
    BookEntry { canonical: "Habakkuk", spellings: &["Habakkuk", "Habacuc", "Hab", "Hb"] },
    BookEntry { canonical: "Zephaniah", spellings: &["Zephaniah", "Sophonias", "Zeph", "Zep"] },
    BookEntry { canonical: "Haggai", spellings: &["Haggai", "Aggeus", "Hag", "Hg"] },
    BookEntry { canonical: "Zechariah", spellings: &["Zechariah", "Zacharias", "Zech", "Zec"] },
    BookEntry { canonical: "Malachi", spellings: &["Malachi", "Malachias", "Mal"] },
    BookEntry { canonical: "Matthew", spellings: &["Matthew", "Matt", "Mt"] },
    BookEntry { canonical: "Mark", spellings: &["Mark", "Mk"] },
    BookEntry { canonical: "Luke", spellings: &["Luke", "Lk"] },
    BookEntry { canonical: "John", spellings: &["John", "Jn"] },
    BookEntry { canonical: "Acts", spellings: &["Acts"] },
    BookEntry { canonical: "Romans", spellings: &["Romans", "Rom"] },
    BookEntry { canonical: "Corinthians", spellings: &["Corinthians", "Cor"] },
    BookEntry { canonical: "Galatians", spellings: &["Galatians", "Gal"] },
    BookEntry { canonical: "Ephesians", spellings: &["Ephesians", "Eph"] },
    BookEntry { canonical: "Philippians", spellings: &["Philippians", "Phil"] },
    BookEntry { canonical: "Colossians", spellings: &["Colossians", "Col"] },
    BookEntry { canonical: "Thessalonians", spellings: &["Thessalonians", "Thess", "Thes"] },
    BookEntry { canonical: "Timothy", spellings: &["Timothy", "Tim", "Tm"] },
    BookEntry { canonical: "Titus", spellings: &["Titus", "Ti"] },
    BookEntry { canonical: "Philemon", spellings: &["Philemon", "Phlm"] },
    BookEntry { canonical: "Hebrews", spellings: &["Hebrews", "Heb"] },
    BookEntry { canonical: "James", spellings: &["James", "Jas"] },
    BookEntry { canonical: "Peter", spellings: &["Peter", "Pet", "Pt"] },
    BookEntry { canonical: "Jude", spellings: &["Jude"] },
    BookEntry { canonical: "Revelation", spellings: &["Revelation", "Apocalypse", "Rev", "Rv"] },
];

const GOSPEL_BOOKS: [&str; 4] = ["Matthew", "Mark", "Luke", "John"];

const PSALM_BOOK: &str = "Psalm";

/// Books that take a leading ordinal ("1 Samuel", "2 Cor", "3 Jn")
const NUMBERED_BOOKS: [&str; 9] = [
    "Samuel",
    "Kings",
    "Chronicles",
    "Maccabees",
    "Corinthians",
    "Thessalonians",
    "Timothy",
    "Peter",
    "John",
];

/// Regex alternation over `spellings`, longest first
///
/// Each spelling also matches in all caps ("LUKE", "PS").
fn alternation<'a>(spellings: impl Iterator<Item = &'a str>) -> String {
    let mut forms: Vec<String> = spellings
        .flat_map(|s| [s.to_string(), s.to_uppercase()])
        .collect();
    forms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    forms.dedup();
    forms
        .iter()
        .map(|s| regex::escape(s).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Every spelling of every book
static BOOK_ALTERNATION: Lazy<String> = Lazy::new(|| {
    alternation(BOOKS.iter().flat_map(|book| book.spellings.iter().copied()))
});

/// Spellings of the books in [`NUMBERED_BOOKS`]
static NUMBERED_ALTERNATION: Lazy<String> = Lazy::new(|| {
    alternation(
        BOOKS
            .iter()
            .filter(|book| NUMBERED_BOOKS.contains(&book.canonical))
            .flat_map(|book| book.spellings.iter().copied()),
    )
});

const VERSE: &str = r"\d{1,3}[a-e]{0,2}";

/// Citation finder
///
/// Book names must be capitalized or all caps, which keeps prose like
/// "is 5" from matching. An ordinal is only taken before a numbered book and
/// on the same line, so a heading number ("Reading 1") never joins the
/// citation below it.
static CITATION_RE: Lazy<Regex> = Lazy::new(|| {
    let item = format!(r"{VERSE}(?:\s*[-–—]\s*(?:\d{{1,3}}:)?{VERSE})?");
    let verses = format!(r"{item}(?:\s*,\s*{item})*");
    // single-chapter books are cited by verse alone ("Phlm 9-10, 12-17")
    let chapterless = format!(r"[a-e]{{0,2}}\s*[-–—]\s*{VERSE}(?:\s*,\s*{item})*");
    let pattern = format!(
        r"\b(?:[1-3][ \t]*(?:{numbered})|(?:{books}))\.?\s+\d{{1,3}}(?::{verses}|{chapterless})?(?:\s*(?:and|;)\s*\d{{1,3}}:{verses})*",
        numbered = NUMBERED_ALTERNATION.as_str(),
        books = BOOK_ALTERNATION.as_str(),
    );
    Regex::new(&pattern).expect("citation pattern is a valid regex")
});

/// Leading `[ordinal] Book` of a citation, case-insensitive
static KNOWN_BOOK_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)^\s*(?:([1-3])\s*)?({books})\.?(?:\s+|$)",
        books = BOOK_ALTERNATION.as_str(),
    );
    Regex::new(&pattern).expect("book prefix pattern is a valid regex")
});

/// Fallback for books missing from the table
static ANY_BOOK_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:([1-3])\s*)?([A-Za-z]+)\.?(?:\s+|$)")
        .expect("generic book prefix pattern is a valid regex")
});

/// Leading book token of a citation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookToken<'a> {
    /// Leading ordinal ("1 Corinthians" -> 1)
    pub ordinal: Option<u8>,
    /// Canonical book name when known, otherwise the raw token
    pub name: String,
    /// Whether the book appears in [`BOOKS`]
    pub known: bool,
    /// Text after the book token (chapter and verses)
    pub rest: &'a str,
}

/// Canonical name for a spelling, compared case-insensitively and ignoring
/// internal whitespace differences
pub fn canonical_book(spelling: &str) -> Option<&'static str> {
    let wanted = collapse_whitespace(spelling).to_lowercase();
    BOOKS.iter().find_map(|book| {
        book.spellings
            .iter()
            .any(|s| s.to_lowercase() == wanted)
            .then_some(book.canonical)
    })
}

/// Split a citation into its leading book token and the remainder
pub fn split_book(citation: &str) -> Option<BookToken<'_>> {
    if let Some(caps) = KNOWN_BOOK_PREFIX_RE.captures(citation) {
        let spelling = caps.get(2)?.as_str();
        let name = canonical_book(spelling)?;
        return Some(BookToken {
            ordinal: caps.get(1).and_then(|m| m.as_str().parse().ok()),
            name: name.to_string(),
            known: true,
            rest: citation[caps.get(0)?.end()..].trim(),
        });
    }

    let caps = ANY_BOOK_PREFIX_RE.captures(citation)?;
    Some(BookToken {
        ordinal: caps.get(1).and_then(|m| m.as_str().parse().ok()),
        name: caps.get(2)?.as_str().to_string(),
        known: false,
        rest: citation[caps.get(0)?.end()..].trim(),
    })
}

/// Find every citation in `text`, left to right, without de-duplication
pub fn find_citations(text: &str) -> Vec<String> {
    CITATION_RE
        .find_iter(text)
        .map(|m| collapse_whitespace(m.as_str()))
        .collect()
}

/// First citation in `text`, if any
pub fn first_citation(text: &str) -> Option<String> {
    CITATION_RE
        .find(text)
        .map(|m| collapse_whitespace(m.as_str()))
}

/// Classify a citation by its leading book token
///
/// Only the book token is inspected. An ordinal-prefixed book is never a
/// Gospel ("1 John" is an epistle). Missing or unknown books are `Other`.
pub fn classify(citation: &str) -> CitationClass {
    let Some(token) = split_book(citation) else {
        return CitationClass::Other;
    };
    if !token.known {
        return CitationClass::Other;
    }
    if token.name == PSALM_BOOK {
        return CitationClass::Psalm;
    }
    if token.ordinal.is_none() && GOSPEL_BOOKS.contains(&token.name.as_str()) {
        return CitationClass::Gospel;
    }
    CitationClass::Other
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
