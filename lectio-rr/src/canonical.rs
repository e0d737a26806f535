//! Citation canonicalization
//!
//! Two citations agree when they name the same book, chapter and first verse
//! after normalization. Display strings are never rewritten; the canonical key
//! only drives grouping and duplicate detection.

use crate::grammar::{self, collapse_whitespace};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Books cited by verse alone ("Phlm 9-10" is Philemon 1:9-10)
const SINGLE_CHAPTER_BOOKS: [&str; 5] = ["obadiah", "philemon", "jude", "2 john", "3 john"];

static LEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)").expect("leading number pattern is a valid regex"));

/// Normalized identity of a citation: book, chapter, first verse
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    /// Lowercase canonical book, ordinal kept ("1 corinthians")
    pub book: String,
    pub chapter: Option<u32>,
    pub verse: Option<u32>,
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.book)?;
        if let Some(chapter) = self.chapter {
            write!(f, " {}", chapter)?;
        }
        if let Some(verse) = self.verse {
            write!(f, ":{}", verse)?;
        }
        Ok(())
    }
}

/// Lowercase, unify dashes and whitespace
pub fn normalize(citation: &str) -> String {
    let unified: String = citation
        .chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '\u{00a0}' => ' ',
            other => other,
        })
        .collect();
    collapse_whitespace(&unified).to_lowercase()
}

/// Canonical key for a citation
///
/// Book aliases collapse to one name ("Ps", "Psalms" -> "psalm";
/// "Josue" -> "joshua"). Unknown books keep their lowercase token so that
/// identical spellings still agree.
pub fn canonicalize(citation: &str) -> CanonicalKey {
    let normalized = normalize(citation);
    let Some(token) = grammar::split_book(&normalized) else {
        return CanonicalKey {
            book: normalized,
            chapter: None,
            verse: None,
        };
    };

    let name = token.name.to_lowercase();
    let book = match token.ordinal {
        Some(n) => format!("{} {}", n, name),
        None => name,
    };

    let (chapter_part, verse_part) = match token.rest.split_once(':') {
        Some((c, v)) => (c, Some(v)),
        None => (token.rest, None),
    };

    let chapter = leading_number(chapter_part);
    let verse = verse_part.and_then(leading_number);
    if verse_part.is_none() && SINGLE_CHAPTER_BOOKS.contains(&book.as_str()) {
        return CanonicalKey {
            book,
            chapter: Some(1),
            verse: chapter,
        };
    }

    CanonicalKey {
        book,
        chapter,
        verse,
    }
}

/// Whether two citations refer to the same book, chapter and first verse
pub fn equivalent(a: &str, b: &str) -> bool {
    !a.trim().is_empty() && !b.trim().is_empty() && canonicalize(a) == canonicalize(b)
}

fn leading_number(s: &str) -> Option<u32> {
    LEADING_NUMBER_RE
        .captures(s.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psalm_aliases_agree() {
        assert_eq!(canonicalize("Ps 23:1-3"), canonicalize("Psalm 23:1-6"));
        assert_eq!(canonicalize("Psalms 23:1"), canonicalize("psalm 23:1-3"));
        assert_eq!(canonicalize("Ps 23:1-3").to_string(), "psalm 23:1");
    }

    #[test]
    fn test_douay_names_agree() {
        assert!(equivalent("Josue 3:7-10", "Joshua 3:7-17"));
        assert!(equivalent("Isaias 7:14", "Is 7:10-14"));
        assert!(equivalent("Ezechiel 37:12", "Ez 37:12-14"));
        assert!(equivalent("Canticle of Canticles 2:8", "Song of Songs 2:8-14"));
    }

    #[test]
    fn test_ordinal_is_kept() {
        let key = canonicalize("1 Cor 13:4-13");
        assert_eq!(key.book, "1 corinthians");
        assert!(!equivalent("1 Cor 13:4", "2 Cor 13:4"));
    }

    #[test]
    fn test_dash_and_whitespace_normalized() {
        assert!(equivalent("Lk  14:25\u{2013}33", "Lk 14:25-33"));
    }

    #[test]
    fn test_different_first_verse_disagrees() {
        assert!(!equivalent("Lk 14:25-33", "Lk 14:1-6"));
        assert!(!equivalent("Lk 14:25-33", "Lk 15:25-33"));
    }

    #[test]
    fn test_single_chapter_book_without_chapter() {
        let key = canonicalize("Phlm 9-10, 12-17");
        assert_eq!(key.book, "philemon");
        assert_eq!(key.chapter, Some(1));
        assert_eq!(key.verse, Some(9));
        assert!(equivalent("Phlm 9-10, 12-17", "Philemon 1:9-10, 12-17"));
    }

    #[test]
    fn test_chapter_only_citation() {
        let key = canonicalize("Psalm 23");
        assert_eq!(key.chapter, Some(23));
        assert_eq!(key.verse, None);
    }

    #[test]
    fn test_empty_never_equivalent() {
        assert!(!equivalent("", ""));
        assert!(!equivalent("Lk 1:1", " "));
    }
}
