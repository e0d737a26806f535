//! Resolver Facade
//!
//! date -> adapters (concurrent) -> candidate screening -> reconciler ->
//! validator -> overrides -> strict check -> [`ResolutionResult`]
//!
//! The resolver holds no mutable state: every call works on fresh
//! candidates, so dates can be resolved in parallel.

use crate::adapters::{build_adapters, SourceAdapter};
use crate::config::{AppConfig, ResolverConfig};
use crate::error::{ResolveError, Result};
use crate::overrides::OverrideStore;
use crate::reconciler::Reconciler;
use crate::types::{
    lectionary_key, Candidate, ReconciledSlot, ResolutionResult, Slot, SlotOutcome, SlotReport,
};
use crate::validator::{screen_candidates, validate};
use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source id recorded for slots replaced by an override record
pub const OVERRIDE_SOURCE: &str = "override";

pub struct Resolver {
    config: ResolverConfig,
    /// Highest priority first
    adapters: Vec<Arc<dyn SourceAdapter>>,
    overrides: OverrideStore,
    reconciler: Reconciler,
}

impl Resolver {
    /// Adapter order is priority order
    pub fn new(
        config: ResolverConfig,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        overrides: OverrideStore,
    ) -> Self {
        let priority = adapters
            .iter()
            .map(|adapter| adapter.source_id().to_string())
            .collect();
        let reconciler = Reconciler::new(priority, config.min_agreement);
        Self {
            config,
            adapters,
            overrides,
            reconciler,
        }
    }

    /// Build adapters for the enabled providers and load the override file
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let adapters = build_adapters(config)?;
        let overrides = match config.overrides_path() {
            Some(path) => OverrideStore::load(path)?,
            None => OverrideStore::new(),
        };
        Ok(Self::new(config.resolver.clone(), adapters, overrides))
    }

    pub fn is_strict(&self) -> bool {
        self.config.strict
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Resolve the four reading slots for one date
    ///
    /// Fails only in strict mode, when first, psalm or gospel is empty after
    /// overrides.
    pub async fn resolve(&self, date: NaiveDate) -> Result<ResolutionResult> {
        let candidates = self.gather(date).await;
        debug!(date = %date, count = candidates.len(), "Candidates gathered");

        let (screened, mut issues) = screen_candidates(candidates);
        let mut slots = self.reconciler.reconcile(&screened);
        issues.extend(validate(&mut slots));
        let validation_blanked = slots.iter().any(|s| s.outcome == SlotOutcome::Blanked);

        let override_applied = self.apply_overrides(date, &mut slots);

        let warnings = issues.iter().map(|issue| issue.to_string()).collect();
        let result =
            self.build_result(date, &slots, override_applied, validation_blanked, warnings);

        for report in &result.slots {
            info!(
                date = %date,
                slot = %report.slot,
                outcome = %report.outcome,
                sources = %report.sources.join(","),
                value = %result.get(report.slot),
                "Slot resolved"
            );
        }

        let missing = result.missing_required();
        if !missing.is_empty() && self.config.strict {
            return Err(ResolveError::MissingRequiredSlots {
                date,
                slots: missing,
            });
        }

        Ok(result)
    }

    /// Resolve several dates concurrently; results keep input order
    ///
    /// A failure for one date does not affect the others.
    pub async fn resolve_many(
        &self,
        dates: &[NaiveDate],
    ) -> Vec<(NaiveDate, Result<ResolutionResult>)> {
        let futures = dates.iter().map(|date| async move { (*date, self.resolve(*date).await) });
        join_all(futures).await
    }

    /// Run every adapter for `date`, bounded by the adapter timeout
    ///
    /// Candidates are concatenated in adapter order, independent of
    /// completion order.
    async fn gather(&self, date: NaiveDate) -> Vec<Candidate> {
        let timeout = self.config.adapter_timeout();
        let futures = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            async move {
                match tokio::time::timeout(timeout, adapter.fetch_candidates(date)).await {
                    Ok(candidates) => candidates,
                    Err(_) => {
                        warn!(
                            source = %adapter.source_id(),
                            date = %date,
                            timeout_secs = timeout.as_secs(),
                            "Source timed out"
                        );
                        Vec::new()
                    }
                }
            }
        });

        join_all(futures).await.into_iter().flatten().collect()
    }

    /// Overwrite slots named by the date's override record
    fn apply_overrides(&self, date: NaiveDate, slots: &mut [ReconciledSlot]) -> bool {
        let Some(record) = self.overrides.get(date) else {
            return false;
        };

        let mut applied = false;
        for slot in slots.iter_mut() {
            if let Some(value) = record.get(slot.slot) {
                debug!(
                    date = %date,
                    slot = %slot.slot,
                    previous = %slot.value,
                    value = %value,
                    "Override applied"
                );
                slot.value = value.to_string();
                slot.outcome = SlotOutcome::Override;
                slot.sources = vec![OVERRIDE_SOURCE.to_string()];
                applied = true;
            }
        }
        applied
    }

    fn build_result(
        &self,
        date: NaiveDate,
        slots: &[ReconciledSlot],
        override_applied: bool,
        validation_blanked: bool,
        mut warnings: Vec<String>,
    ) -> ResolutionResult {
        let value_of = |slot: Slot| {
            slots
                .iter()
                .find(|s| s.slot == slot)
                .map(|s| s.value.clone())
                .unwrap_or_default()
        };
        let first_ref = value_of(Slot::First);
        let psalm_ref = value_of(Slot::Psalm);
        let gospel_ref = value_of(Slot::Gospel);

        // Adapters backing at least one final value, in priority order
        let sources = self
            .adapters
            .iter()
            .map(|adapter| adapter.source_id())
            .filter(|id| {
                slots
                    .iter()
                    .filter(|s| !s.is_empty())
                    .any(|s| s.sources.iter().any(|source| source == id))
            })
            .map(str::to_string)
            .collect();

        for slot in Slot::REQUIRED {
            if value_of(slot).trim().is_empty() {
                let message = format!("{} slot is empty", slot);
                if !self.config.strict {
                    warn!(date = %date, slot = %slot, "Required slot is empty");
                }
                warnings.push(message);
            }
        }

        ResolutionResult {
            date,
            lectionary_key: lectionary_key(&first_ref, &psalm_ref, &gospel_ref),
            first_ref,
            second_ref: value_of(Slot::Second),
            psalm_ref,
            gospel_ref,
            sources,
            override_applied,
            validation_blanked,
            slots: slots
                .iter()
                .map(|s| SlotReport {
                    slot: s.slot,
                    outcome: s.outcome,
                    sources: s.sources.clone(),
                })
                .collect(),
            warnings,
        }
    }
}
