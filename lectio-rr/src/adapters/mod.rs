//! Source Adapters
//!
//! One adapter per external provider. Every adapter implements
//! [`SourceAdapter`] and extracts candidates in two tiers:
//! 1. **Heading-anchored:** a slot label is located and the first citation in
//!    a bounded window after it is assigned to that slot
//! 2. **Positional fallback:** when fewer than three required headings were
//!    found, citations in document order fill the remaining slots by class
//!
//! Fetch failures, bad statuses and pages with no citations all end in an
//! empty candidate list and a warning. Nothing is raised past the adapter.

pub mod catholic_org;
pub mod http;
pub mod markup;
pub mod universalis;
pub mod usccb;

use crate::config::{AppConfig, ProviderConfig, ProviderKind};
use crate::error::{ResolveError, Result};
use crate::grammar;
use crate::types::{Candidate, CitationClass, Slot};
use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use self::http::{FetchError, HttpFetcher, PageFetcher};

/// Provider-specific candidate source for one date
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identifier reported in candidates and diagnostics
    fn source_id(&self) -> &str;

    /// Candidates for `date`; empty on any failure
    async fn fetch_candidates(&self, date: NaiveDate) -> Vec<Candidate>;
}

/// Build adapters for every enabled provider, in priority order
pub fn build_adapters(config: &AppConfig) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    for provider in config.enabled_providers() {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.http).map_err(
            |e| ResolveError::Config(format!("provider '{}': {}", provider.id, e)),
        )?);
        adapters.push(adapter_for(provider, fetcher));
        info!(
            provider = %provider.id,
            kind = %provider.kind,
            "Registered source adapter"
        );
    }

    if adapters.is_empty() {
        warn!("No providers enabled; every slot will resolve empty unless overridden");
    }
    Ok(adapters)
}

/// Adapter for one provider entry using the given fetcher
pub fn adapter_for(provider: &ProviderConfig, fetcher: Arc<dyn PageFetcher>) -> Arc<dyn SourceAdapter> {
    match provider.kind {
        ProviderKind::Usccb => Arc::new(usccb::UsccbAdapter::new(provider, fetcher)),
        ProviderKind::Universalis => {
            Arc::new(universalis::UniversalisAdapter::new(provider, fetcher))
        }
        ProviderKind::CatholicOrg => {
            Arc::new(catholic_org::CatholicOrgAdapter::new(provider, fetcher))
        }
    }
}

/// Substitute date placeholders in a provider URL template
///
/// Supported: `{MMDDYY}`, `{YYYYMMDD}`, `{ISO}`, `{YYYY}`, `{MM}`, `{DD}`.
pub fn expand_url_template(template: &str, date: NaiveDate) -> String {
    template
        .replace("{MMDDYY}", &date.format("%m%d%y").to_string())
        .replace("{YYYYMMDD}", &date.format("%Y%m%d").to_string())
        .replace("{ISO}", &date.format("%Y-%m-%d").to_string())
        .replace("{YYYY}", &date.format("%Y").to_string())
        .replace("{MM}", &date.format("%m").to_string())
        .replace("{DD}", &date.format("%d").to_string())
}

/// Turn an adapter's internal outcome into its public contract
pub(crate) fn absorb(
    source_id: &str,
    date: NaiveDate,
    outcome: std::result::Result<Vec<Candidate>, FetchError>,
) -> Vec<Candidate> {
    match outcome {
        Ok(candidates) if candidates.is_empty() => {
            warn!(source = %source_id, date = %date, "No citations found");
            candidates
        }
        Ok(candidates) => {
            debug!(
                source = %source_id,
                date = %date,
                count = candidates.len(),
                "Candidates extracted"
            );
            candidates
        }
        Err(e) => {
            warn!(source = %source_id, date = %date, error = %e, "Source fetch failed");
            Vec::new()
        }
    }
}

// ============================================================================
// Slot labels
// ============================================================================

/// Heading texts that announce a slot
#[derive(Debug, Clone, Copy)]
pub struct SlotLabel {
    pub slot: Slot,
    pub labels: &'static [&'static str],
}

/// Labels used by lectionary pages in flattened text
pub const LECTIONARY_LABELS: [SlotLabel; 4] = [
    SlotLabel {
        slot: Slot::First,
        labels: &["Reading I", "Reading 1", "First Reading"],
    },
    SlotLabel {
        slot: Slot::Second,
        labels: &["Reading II", "Reading 2", "Second Reading"],
    },
    SlotLabel {
        slot: Slot::Psalm,
        labels: &["Responsorial Psalm"],
    },
    SlotLabel {
        slot: Slot::Gospel,
        labels: &["Gospel"],
    },
];

/// Compiled heading patterns for one slot
pub struct LabelSet {
    pub slot: Slot,
    pub patterns: Vec<Regex>,
}

/// Compile labels into case-insensitive whole-word patterns
///
/// `prefix` goes in front of every pattern (`^` pins a label to the start of
/// its block). Only called from `Lazy` initializers.
pub(crate) fn compile_labels(labels: &[SlotLabel], prefix: &str) -> Vec<LabelSet> {
    labels
        .iter()
        .map(|label| LabelSet {
            slot: label.slot,
            patterns: label
                .labels
                .iter()
                .map(|l| {
                    let pattern =
                        format!(r"(?i){}\b{}\b", prefix, regex::escape(l).replace(' ', r"\s+"));
                    Regex::new(&pattern).expect("escaped label is a valid regex")
                })
                .collect(),
        })
        .collect()
}

/// [`LECTIONARY_LABELS`] matched anywhere in flattened text
pub static LECTIONARY_HEADINGS: Lazy<Vec<LabelSet>> =
    Lazy::new(|| compile_labels(&LECTIONARY_LABELS, ""));

static ACCLAMATION_AFTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*acclamation\b").expect("acclamation suffix pattern is a valid regex")
});

static ACCLAMATION_BEFORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbefore\s+the\s*$").expect("acclamation prefix pattern is a valid regex")
});

/// A "Gospel" label inside "Gospel Acclamation" or "Verse Before the Gospel"
/// heads the acclamation verse, not the gospel itself
pub(crate) fn is_acclamation_heading(before_label: &str, after_label: &str) -> bool {
    ACCLAMATION_AFTER_RE.is_match(take_chars(after_label, 32))
        || ACCLAMATION_BEFORE_RE.is_match(last_chars(before_label, 32))
}

// ============================================================================
// Extraction tiers
// ============================================================================

/// One slot assignment made by an extraction tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFind {
    pub citation: String,
    pub snippet: String,
}

/// Slot assignments collected while parsing one page
pub type SlotFinds = BTreeMap<Slot, SlotFind>;

/// Heading-anchored tier over flattened text
///
/// Every occurrence of every label is tried in document order; the first
/// whose window holds a citation wins the slot.
pub fn heading_anchored(text: &str, labels: &[LabelSet], window_chars: usize) -> SlotFinds {
    let mut finds = SlotFinds::new();

    for label in labels {
        let mut hits: Vec<(usize, usize)> = label
            .patterns
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| (m.start(), m.end())))
            .collect();
        hits.sort_unstable();

        for (start, end) in hits {
            let after = &text[end..];
            if label.slot == Slot::Gospel && is_acclamation_heading(&text[..start], after) {
                continue;
            }
            let window = take_chars(after, window_chars);
            if let Some(citation) = grammar::first_citation(window) {
                finds.insert(
                    label.slot,
                    SlotFind {
                        citation,
                        snippet: snippet_of(window),
                    },
                );
                break;
            }
        }
    }

    finds
}

/// Positional tier: assign citations in document order by class
///
/// Citations are de-duplicated case-insensitively and citations already
/// claimed by a heading are skipped. Of the first four remaining, the first
/// gospel-class fills `gospel`, the first psalm-class fills `psalm`, and
/// other-class citations fill `first` then `second`. Only empty slots are
/// filled.
pub fn positional_assign(citations: &[String], finds: &mut SlotFinds) {
    let mut seen: HashSet<String> = finds
        .values()
        .map(|f| f.citation.to_lowercase())
        .collect();

    let remaining: Vec<&String> = citations
        .iter()
        .filter(|c| seen.insert(c.to_lowercase()))
        .take(4)
        .collect();

    let mut others = vec![Slot::First, Slot::Second].into_iter();
    for citation in remaining {
        let target = match grammar::classify(citation) {
            CitationClass::Gospel => Some(Slot::Gospel),
            CitationClass::Psalm => Some(Slot::Psalm),
            CitationClass::Other => others.by_ref().find(|slot| !finds.contains_key(slot)),
        };
        let Some(slot) = target else {
            continue;
        };
        if finds.contains_key(&slot) {
            continue;
        }
        debug!(slot = %slot, citation = %citation, "Positional assignment");
        finds.insert(
            slot,
            SlotFind {
                citation: citation.clone(),
                snippet: citation.clone(),
            },
        );
    }
}

/// Whether the heading tier found enough to skip the positional tier
pub fn headings_sufficient(finds: &SlotFinds) -> bool {
    Slot::REQUIRED.iter().filter(|s| finds.contains_key(s)).count() >= Slot::REQUIRED.len()
}

/// Run both tiers: headings first, positional fallback when headings are
/// insufficient
pub fn two_tier<F>(anchored: SlotFinds, fallback_citations: F) -> SlotFinds
where
    F: FnOnce() -> Vec<String>,
{
    let mut finds = anchored;
    if !headings_sufficient(&finds) {
        let citations = fallback_citations();
        debug!(
            headings = finds.len(),
            citations = citations.len(),
            "Headings insufficient, using positional fallback"
        );
        positional_assign(&citations, &mut finds);
    }
    finds
}

/// Convert slot finds to candidates, in slot order
pub fn into_candidates(source_id: &str, finds: SlotFinds) -> Vec<Candidate> {
    finds
        .into_iter()
        .map(|(slot, find)| Candidate::new(source_id, slot, find.citation, find.snippet))
        .collect()
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn last_chars(s: &str, n: usize) -> &str {
    match n.checked_sub(1).and_then(|k| s.char_indices().rev().nth(k)) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn snippet_of(window: &str) -> String {
    grammar::collapse_whitespace(take_chars(window, 120))
}
