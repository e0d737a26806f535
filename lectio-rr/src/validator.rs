//! Invariant Validator
//!
//! Rules:
//! - `psalm` holds a psalm-class citation, `gospel` a gospel-class citation
//! - `first` and `second` hold neither
//! - `second` differs (by canonical key) from `first`, `psalm` and `gospel`
//!
//! Violations blank the offending slot and are reported as warnings. A
//! duplicate second reading blanks `second` only.
//!
//! The class rule is applied twice: to raw candidates before the vote, so a
//! mis-tagged candidate cannot win or block agreement, and to the reconciled
//! values afterwards.

use crate::canonical::equivalent;
use crate::grammar::classify;
use crate::types::{Candidate, IssueKind, ReconciledSlot, Slot, SlotOutcome, ValidationIssue};
use tracing::warn;

/// Drop candidates whose book class does not fit their slot
pub fn screen_candidates(candidates: Vec<Candidate>) -> (Vec<Candidate>, Vec<ValidationIssue>) {
    let mut issues = Vec::new();
    let kept = candidates
        .into_iter()
        .filter(|candidate| {
            let class = classify(&candidate.citation);
            if candidate.slot.accepts(class) {
                return true;
            }
            let issue = ValidationIssue {
                slot: candidate.slot,
                citation: candidate.citation.clone(),
                source_id: Some(candidate.source_id.clone()),
                kind: IssueKind::WrongClass { found: class },
            };
            warn!("{}", issue);
            issues.push(issue);
            false
        })
        .collect();
    (kept, issues)
}

/// Check reconciled slots, blanking violators in place
pub fn validate(slots: &mut [ReconciledSlot]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for slot in slots.iter_mut().filter(|s| !s.is_empty()) {
        let class = classify(&slot.value);
        if !slot.slot.accepts(class) {
            let issue = ValidationIssue {
                slot: slot.slot,
                citation: slot.value.clone(),
                source_id: None,
                kind: IssueKind::WrongClass { found: class },
            };
            warn!("{}", issue);
            issues.push(issue);
            blank(slot);
        }
    }

    let Some(second_idx) = slots.iter().position(|s| s.slot == Slot::Second) else {
        return issues;
    };
    if slots[second_idx].is_empty() {
        return issues;
    }

    let second_value = slots[second_idx].value.clone();
    let duplicate = [Slot::First, Slot::Psalm, Slot::Gospel].into_iter().find(|other| {
        slots
            .iter()
            .find(|s| s.slot == *other)
            .is_some_and(|s| equivalent(&second_value, &s.value))
    });

    if let Some(other) = duplicate {
        let issue = ValidationIssue {
            slot: Slot::Second,
            citation: second_value,
            source_id: None,
            kind: IssueKind::DuplicateOf { other },
        };
        warn!("{}", issue);
        issues.push(issue);
        blank(&mut slots[second_idx]);
    }

    issues
}

fn blank(slot: &mut ReconciledSlot) {
    slot.value.clear();
    slot.outcome = SlotOutcome::Blanked;
}
