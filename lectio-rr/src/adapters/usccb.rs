//! USCCB daily readings adapter (primary provider)
//!
//! Pages are flattened to text and parsed with the lectionary labels
//! ("Reading I", "Responsorial Psalm", "Reading II", "Gospel"). The
//! positional fallback only looks at the top of the page, where the
//! readings are listed before commentary and navigation.

use super::http::{FetchError, PageFetcher};
use super::markup::html_to_text;
use super::{
    absorb, expand_url_template, heading_anchored, into_candidates, two_tier, SourceAdapter,
    LECTIONARY_HEADINGS,
};
use crate::config::ProviderConfig;
use crate::grammar;
use crate::types::Candidate;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Characters after a heading searched for its citation
pub const HEADING_WINDOW_CHARS: usize = 800;

/// Leading characters of the page used by the positional fallback
pub const FALLBACK_SCAN_CHARS: usize = 3000;

pub struct UsccbAdapter {
    id: String,
    url_template: String,
    alt_url_template: Option<String>,
    fetcher: Arc<dyn PageFetcher>,
}

impl UsccbAdapter {
    pub fn new(provider: &ProviderConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            id: provider.id.clone(),
            url_template: provider.url_template.clone(),
            alt_url_template: provider.alt_url_template.clone(),
            fetcher,
        }
    }

    async fn fetch_and_parse(&self, url: &str) -> Result<Vec<Candidate>, FetchError> {
        let html = self.fetcher.fetch(url).await?;
        Ok(parse_page(&self.id, &html))
    }
}

#[async_trait]
impl SourceAdapter for UsccbAdapter {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn fetch_candidates(&self, date: NaiveDate) -> Vec<Candidate> {
        let primary = expand_url_template(&self.url_template, date);
        let outcome = self.fetch_and_parse(&primary).await;

        let needs_alt = !matches!(&outcome, Ok(c) if !c.is_empty());
        let outcome = match (&self.alt_url_template, needs_alt) {
            (Some(alt), true) => {
                let alt = expand_url_template(alt, date);
                match &outcome {
                    Err(e) => {
                        debug!(source = %self.id, error = %e, "Primary URL failed, trying alternate")
                    }
                    Ok(_) => {
                        debug!(source = %self.id, "Primary URL had no citations, trying alternate")
                    }
                }
                self.fetch_and_parse(&alt).await
            }
            _ => outcome,
        };

        absorb(&self.id, date, outcome)
    }
}

/// Extract candidates from a USCCB readings page
pub fn parse_page(source_id: &str, html: &str) -> Vec<Candidate> {
    let text = html_to_text(html);
    let anchored = heading_anchored(&text, &LECTIONARY_HEADINGS, HEADING_WINDOW_CHARS);
    let finds = two_tier(anchored, || {
        let head: String = text.chars().take(FALLBACK_SCAN_CHARS).collect();
        grammar::find_citations(&head)
    });
    into_candidates(source_id, finds)
}
