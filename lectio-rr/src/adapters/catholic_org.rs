//! Catholic.org daily reading adapter
//!
//! The page lists each reading under a heading such as
//! "Reading 1, Wisdom 9:13-18". The page is read as a sequence of text
//! blocks; a block that starts with a slot label anchors that slot and the
//! citation is looked up in that block or the two blocks after it.

use super::http::{FetchError, PageFetcher};
use super::markup::text_blocks;
use super::{
    absorb, compile_labels, expand_url_template, into_candidates, is_acclamation_heading,
    two_tier, LabelSet, SlotFind, SlotFinds, SlotLabel, SourceAdapter,
};
use crate::config::ProviderConfig;
use crate::grammar;
use crate::types::{Candidate, Slot};
use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Blocks after the anchoring block that may hold its citation
pub const LOOKAHEAD_BLOCKS: usize = 2;

/// Labels as they open a block on catholic.org
pub const BLOCK_LABELS: [SlotLabel; 4] = [
    SlotLabel {
        slot: Slot::First,
        labels: &["Reading 1", "First Reading"],
    },
    SlotLabel {
        slot: Slot::Second,
        labels: &["Reading 2", "Second Reading"],
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

/// [`BLOCK_LABELS`] pinned to the start of a block
static BLOCK_OPENERS: Lazy<Vec<LabelSet>> = Lazy::new(|| compile_labels(&BLOCK_LABELS, "^"));

pub struct CatholicOrgAdapter {
    id: String,
    url_template: String,
    fetcher: Arc<dyn PageFetcher>,
}

impl CatholicOrgAdapter {
    pub fn new(provider: &ProviderConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            id: provider.id.clone(),
            url_template: provider.url_template.clone(),
            fetcher,
        }
    }

    async fn fetch_and_parse(&self, url: &str) -> Result<Vec<Candidate>, FetchError> {
        let html = self.fetcher.fetch(url).await?;
        Ok(parse_page(&self.id, &html))
    }
}

#[async_trait]
impl SourceAdapter for CatholicOrgAdapter {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn fetch_candidates(&self, date: NaiveDate) -> Vec<Candidate> {
        let url = expand_url_template(&self.url_template, date);
        let outcome = self.fetch_and_parse(&url).await;
        absorb(&self.id, date, outcome)
    }
}

/// Extract candidates from a catholic.org daily reading page
pub fn parse_page(source_id: &str, html: &str) -> Vec<Candidate> {
    let blocks = text_blocks(html);
    let anchored = block_anchored(&blocks);
    let finds = two_tier(anchored, || {
        blocks
            .iter()
            .flat_map(|block| grammar::find_citations(block))
            .collect()
    });
    into_candidates(source_id, finds)
}

/// Heading tier over text blocks
fn block_anchored(blocks: &[String]) -> SlotFinds {
    let mut finds = SlotFinds::new();

    for label in BLOCK_OPENERS.iter() {
        for (idx, block) in blocks.iter().enumerate() {
            let Some(end) = label
                .patterns
                .iter()
                .find_map(|re| re.find(block).map(|m| m.end()))
            else {
                continue;
            };
            if label.slot == Slot::Gospel && is_acclamation_heading("", &block[end..]) {
                continue;
            }

            let last = (idx + LOOKAHEAD_BLOCKS).min(blocks.len() - 1);
            let found = std::iter::once(&block[end..])
                .chain(blocks[idx + 1..=last].iter().map(String::as_str))
                .find_map(grammar::first_citation);

            if let Some(citation) = found {
                finds.insert(
                    label.slot,
                    SlotFind {
                        citation,
                        snippet: block.clone(),
                    },
                );
                break;
            }
        }
    }

    finds
}
