//! Core Types for the Reference Resolver
//!
//! Defines the data carried through the resolution pipeline:
//! - **Adapters:** produce [`Candidate`]s (one provider each)
//! - **Reconciler:** turns candidates into one [`ReconciledSlot`] per [`Slot`]
//! - **Validator:** may blank a reconciled slot
//! - **Facade:** applies overrides and returns a [`ResolutionResult`]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Slots and citation classes
// ============================================================================

/// Semantic reading position for a liturgical date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    First,
    Second,
    Psalm,
    Gospel,
}

impl Slot {
    /// Every slot, in output order
    pub const ALL: [Slot; 4] = [Slot::First, Slot::Second, Slot::Psalm, Slot::Gospel];

    /// Slots that must be non-empty for a complete result
    pub const REQUIRED: [Slot; 3] = [Slot::First, Slot::Psalm, Slot::Gospel];

    /// `second` is the only slot allowed to be legitimately empty
    pub fn is_required(self) -> bool {
        self != Slot::Second
    }

    /// Whether a citation of class `class` may occupy this slot
    pub fn accepts(self, class: CitationClass) -> bool {
        match self {
            Slot::Psalm => class == CitationClass::Psalm,
            Slot::Gospel => class == CitationClass::Gospel,
            Slot::First | Slot::Second => class == CitationClass::Other,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::First => write!(f, "first"),
            Slot::Second => write!(f, "second"),
            Slot::Psalm => write!(f, "psalm"),
            Slot::Gospel => write!(f, "gospel"),
        }
    }
}

/// Book class of a citation, derived from its leading book token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationClass {
    Gospel,
    Psalm,
    /// Everything else (first and second readings). A weak signal only.
    Other,
}

impl std::fmt::Display for CitationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CitationClass::Gospel => write!(f, "gospel"),
            CitationClass::Psalm => write!(f, "psalm"),
            CitationClass::Other => write!(f, "other"),
        }
    }
}

// ============================================================================
// Adapter output
// ============================================================================

/// One citation extracted by one adapter for one date
///
/// Ephemeral: produced fresh per resolution call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Adapter that produced this candidate
    pub source_id: String,
    /// Slot the adapter believes this citation belongs to
    pub slot: Slot,
    /// Citation text as displayed by the provider (always a grammar match)
    pub citation: String,
    /// Surrounding text the citation was found in, for diagnostics
    pub snippet: String,
}

impl Candidate {
    pub fn new(
        source_id: impl Into<String>,
        slot: Slot,
        citation: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            slot,
            citation: citation.into(),
            snippet: snippet.into(),
        }
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// How a slot obtained its final value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotOutcome {
    /// At least `min_agreement` sources agreed
    Vote,
    /// No agreement; highest-priority source used
    Priority,
    /// Manual per-date correction
    Override,
    /// Validator rejected the reconciled value
    Blanked,
    /// No source produced a candidate
    Empty,
}

impl std::fmt::Display for SlotOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotOutcome::Vote => write!(f, "vote"),
            SlotOutcome::Priority => write!(f, "priority"),
            SlotOutcome::Override => write!(f, "override"),
            SlotOutcome::Blanked => write!(f, "blanked"),
            SlotOutcome::Empty => write!(f, "empty"),
        }
    }
}

/// Disagreement between two sources for one slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub slot: Slot,
    pub source1: String,
    pub value1: String,
    pub source2: String,
    pub value2: String,
    /// Normalized Levenshtein similarity of the two display strings
    pub similarity: f64,
}

/// Reconciler output for one slot
#[derive(Debug, Clone)]
pub struct ReconciledSlot {
    pub slot: Slot,
    /// Winning display string; empty when the slot has no value
    pub value: String,
    pub outcome: SlotOutcome,
    /// Sources that back the winning value
    pub sources: Vec<String>,
    pub conflicts: Vec<ConflictReport>,
}

impl ReconciledSlot {
    pub fn empty(slot: Slot) -> Self {
        Self {
            slot,
            value: String::new(),
            outcome: SlotOutcome::Empty,
            sources: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Domain rule violated by a candidate or a reconciled slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IssueKind {
    /// Citation book class does not fit the slot
    WrongClass { found: CitationClass },
    /// `second` duplicates another slot by canonical key
    DuplicateOf { other: Slot },
}

/// Validator finding, recorded as a warning rather than an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub slot: Slot,
    pub citation: String,
    /// Source of the offending value (None for reconciled values)
    pub source_id: Option<String>,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = self.source_id.as_deref().unwrap_or("reconciled");
        match &self.kind {
            IssueKind::WrongClass { found } => write!(
                f,
                "{} slot rejected '{}' from {}: classified as {}",
                self.slot, self.citation, origin, found
            ),
            IssueKind::DuplicateOf { other } => write!(
                f,
                "{} slot blanked: '{}' duplicates the {} slot",
                self.slot, self.citation, other
            ),
        }
    }
}

// ============================================================================
// Final result
// ============================================================================

/// Diagnostic record for one slot of a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReport {
    pub slot: Slot,
    pub outcome: SlotOutcome,
    pub sources: Vec<String>,
}

/// Final four-slot answer for one date
///
/// Created fresh per resolution call; immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub date: NaiveDate,
    pub first_ref: String,
    pub second_ref: String,
    pub psalm_ref: String,
    pub gospel_ref: String,
    /// First, psalm and gospel references without spaces, joined by `|`
    pub lectionary_key: String,
    /// Sources backing at least one slot, in priority order
    pub sources: Vec<String>,
    pub override_applied: bool,
    pub validation_blanked: bool,
    pub slots: Vec<SlotReport>,
    pub warnings: Vec<String>,
}

impl ResolutionResult {
    /// Citation for `slot` (empty string when unresolved)
    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::First => &self.first_ref,
            Slot::Second => &self.second_ref,
            Slot::Psalm => &self.psalm_ref,
            Slot::Gospel => &self.gospel_ref,
        }
    }

    /// Required slots that ended up empty
    pub fn missing_required(&self) -> Vec<Slot> {
        Slot::REQUIRED
            .into_iter()
            .filter(|slot| self.get(*slot).trim().is_empty())
            .collect()
    }

    /// Outcome recorded for `slot`
    pub fn outcome(&self, slot: Slot) -> Option<SlotOutcome> {
        self.slots
            .iter()
            .find(|report| report.slot == slot)
            .map(|report| report.outcome)
    }
}

/// Feed de-duplication key built from the three required references
pub fn lectionary_key(first: &str, psalm: &str, gospel: &str) -> String {
    [first, psalm, gospel]
        .iter()
        .map(|part| part.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}
