//! Universalis mass feed adapter
//!
//! The feed is JSONP: `universalisCallback({...});`. Each reading is an
//! object keyed by its position (`Mass_R1`, `Mass_Ps`, `Mass_R2`, `Mass_G`)
//! whose `source` field holds the citation. The gospel acclamation
//! (`Mass_GA`) is not a slot.
//!
//! Psalms are cited with Greek numbering and the Hebrew number in
//! parentheses (`Psalm 89(90):3-6`). The Hebrew number is kept so the
//! citation agrees with the other providers.

use super::http::{FetchError, PageFetcher};
use super::markup::html_to_text;
use super::{
    absorb, expand_url_template, into_candidates, two_tier, SlotFind, SlotFinds, SourceAdapter,
};
use crate::config::ProviderConfig;
use crate::grammar;
use crate::types::{Candidate, Slot};
use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Feed keys that map to a slot
const SLOT_KEYS: [(&str, Slot); 4] = [
    ("Mass_R1", Slot::First),
    ("Mass_Ps", Slot::Psalm),
    ("Mass_R2", Slot::Second),
    ("Mass_G", Slot::Gospel),
];

const ACCLAMATION_KEY: &str = "Mass_GA";

static DUAL_PSALM_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3})\s*\((\d{1,3})\)").expect("dual psalm number pattern is a valid regex")
});

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    source: String,
}

pub struct UniversalisAdapter {
    id: String,
    url_template: String,
    fetcher: Arc<dyn PageFetcher>,
}

impl UniversalisAdapter {
    pub fn new(provider: &ProviderConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            id: provider.id.clone(),
            url_template: provider.url_template.clone(),
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for UniversalisAdapter {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn fetch_candidates(&self, date: NaiveDate) -> Vec<Candidate> {
        let url = expand_url_template(&self.url_template, date);
        let outcome = match self.fetcher.fetch(&url).await {
            Ok(body) => parse_feed(&self.id, &body).map_err(|message| FetchError::Parse {
                url: url.clone(),
                message,
            }),
            Err(e) => Err(e),
        };
        absorb(&self.id, date, outcome)
    }
}

/// Extract candidates from a Universalis JSONP (or plain JSON) mass feed
pub fn parse_feed(source_id: &str, body: &str) -> Result<Vec<Candidate>, String> {
    let json = strip_jsonp(body).ok_or_else(|| "no JSON object in feed".to_string())?;
    let entries: BTreeMap<String, Value> =
        serde_json::from_str(json).map_err(|e| format!("invalid feed JSON: {}", e))?;

    let mut anchored = SlotFinds::new();
    for (key, slot) in SLOT_KEYS {
        let Some(source) = entry_source(&entries, key) else {
            continue;
        };
        if let Some(citation) = grammar::first_citation(&source) {
            anchored.insert(
                slot,
                SlotFind {
                    citation,
                    snippet: format!("{}: {}", key, source),
                },
            );
        }
    }

    let finds = two_tier(anchored, || {
        let labelled = SLOT_KEYS.iter().map(|(key, _)| *key);
        let others = entries
            .keys()
            .map(String::as_str)
            .filter(|key| key.starts_with("Mass_") && *key != ACCLAMATION_KEY)
            .filter(|key| !SLOT_KEYS.iter().any(|(k, _)| k == key));
        labelled
            .chain(others)
            .filter_map(|key| entry_source(&entries, key))
            .flat_map(|source| grammar::find_citations(&source))
            .collect()
    });

    Ok(into_candidates(source_id, finds))
}

/// Inner JSON of a JSONP body; plain JSON passes through
fn strip_jsonp(body: &str) -> Option<&str> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        return Some(trimmed);
    }
    let open = trimmed.find('(')?;
    let close = trimmed.rfind(')')?;
    (open < close).then(|| trimmed[open + 1..close].trim())
}

/// Plain-text `source` of a feed entry, with single psalm numbering
fn entry_source(entries: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    let entry: FeedEntry = serde_json::from_value(entries.get(key)?.clone()).ok()?;
    let text = html_to_text(&entry.source).replace('\n', " ");
    let text = DUAL_PSALM_NUMBER_RE.replace_all(&text, "$2").into_owned();
    (!text.trim().is_empty()).then_some(text)
}
