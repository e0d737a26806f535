//! Slot Reconciler - cross-source majority vote
//!
//! Per slot:
//! 1. Candidates are ordered by source priority, one per source
//! 2. Candidates are grouped by canonical key
//! 3. The largest group wins if it has at least `min_agreement` sources;
//!    ties go to the group holding the highest-priority source
//! 4. Otherwise the highest-priority source's candidate is used
//! 5. With no candidates the slot is empty
//!
//! The winning display string is the first-seen candidate of the group.

use crate::canonical::{canonicalize, CanonicalKey};
use crate::types::{Candidate, ConflictReport, ReconciledSlot, Slot, SlotOutcome};
use std::collections::HashSet;
use tracing::debug;

/// Candidates sharing one canonical key
struct Group<'a> {
    key: CanonicalKey,
    members: Vec<&'a Candidate>,
}

pub struct Reconciler {
    /// Source ids, highest priority first
    priority: Vec<String>,
    min_agreement: usize,
}

impl Reconciler {
    pub fn new(priority: Vec<String>, min_agreement: usize) -> Self {
        Self {
            priority,
            min_agreement: min_agreement.max(2),
        }
    }

    pub fn min_agreement(&self) -> usize {
        self.min_agreement
    }

    /// Reconcile every slot, in [`Slot::ALL`] order
    pub fn reconcile(&self, candidates: &[Candidate]) -> Vec<ReconciledSlot> {
        Slot::ALL
            .into_iter()
            .map(|slot| self.reconcile_slot(slot, candidates))
            .collect()
    }

    /// Reconcile one slot from the adapters' own slot assignments
    pub fn reconcile_slot(&self, slot: Slot, candidates: &[Candidate]) -> ReconciledSlot {
        let ordered = self.ordered_for_slot(slot, candidates);
        if ordered.is_empty() {
            debug!(slot = %slot, "No candidates");
            return ReconciledSlot::empty(slot);
        }

        let groups = group_by_key(&ordered);
        let conflicts = conflicts_between(slot, &groups);

        // Largest group; `max_by_key` keeps the last maximum, so scan in reverse
        // to keep the earliest (highest-priority) group on ties.
        let best = groups
            .iter()
            .rev()
            .max_by_key(|group| group.members.len())
            .filter(|group| group.members.len() >= self.min_agreement);

        let (value, outcome, sources) = match best {
            Some(group) => {
                debug!(
                    slot = %slot,
                    key = %group.key,
                    votes = group.members.len(),
                    "Majority agreement"
                );
                (
                    group.members[0].citation.clone(),
                    SlotOutcome::Vote,
                    group
                        .members
                        .iter()
                        .map(|c| c.source_id.clone())
                        .collect(),
                )
            }
            None => {
                let top = ordered[0];
                debug!(
                    slot = %slot,
                    source = %top.source_id,
                    distinct = groups.len(),
                    "No agreement, using highest-priority source"
                );
                (
                    top.citation.clone(),
                    SlotOutcome::Priority,
                    vec![top.source_id.clone()],
                )
            }
        };

        ReconciledSlot {
            slot,
            value,
            outcome,
            sources,
            conflicts,
        }
    }

    /// Priority rank of a source; unlisted sources rank after listed ones
    fn rank<'a>(&self, source_id: &'a str) -> (usize, &'a str) {
        let idx = self
            .priority
            .iter()
            .position(|id| id == source_id)
            .unwrap_or(self.priority.len());
        (idx, source_id)
    }

    /// Non-empty candidates for `slot`, by priority, first per source
    fn ordered_for_slot<'a>(&self, slot: Slot, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
        let mut ordered: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.slot == slot && !c.citation.trim().is_empty())
            .collect();
        ordered.sort_by(|a, b| self.rank(&a.source_id).cmp(&self.rank(&b.source_id)));

        let mut seen = HashSet::new();
        ordered.retain(|&c| seen.insert(c.source_id.as_str()));
        ordered
    }
}

fn group_by_key<'a>(ordered: &[&'a Candidate]) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    for &candidate in ordered {
        let key = canonicalize(&candidate.citation);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.members.push(candidate),
            None => groups.push(Group {
                key,
                members: vec![candidate],
            }),
        }
    }
    groups
}

/// One report per pair of disagreeing groups, between their first members
fn conflicts_between(slot: Slot, groups: &[Group<'_>]) -> Vec<ConflictReport> {
    let mut conflicts = Vec::new();
    for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            let a = groups[i].members[0];
            let b = groups[j].members[0];
            let similarity = strsim::normalized_levenshtein(&a.citation, &b.citation);
            debug!(
                slot = %slot,
                source1 = %a.source_id,
                value1 = %a.citation,
                source2 = %b.source_id,
                value2 = %b.citation,
                similarity,
                "Sources disagree"
            );
            conflicts.push(ConflictReport {
                slot,
                source1: a.source_id.clone(),
                value1: a.citation.clone(),
                source2: b.source_id.clone(),
                value2: b.citation.clone(),
                similarity,
            });
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconciler() -> Reconciler {
        Reconciler::new(vec!["a".into(), "b".into(), "c".into()], 2)
    }

    fn psalm(source: &str, citation: &str) -> Candidate {
        Candidate::new(source, Slot::Psalm, citation, citation)
    }

    #[test]
    fn test_majority_wins_with_first_seen_display() {
        let candidates = vec![
            psalm("a", "Ps 23:1-3"),
            psalm("b", "Psalm 23:1-3a"),
            psalm("c", "Ps 22:1"),
        ];
        let slot = reconciler().reconcile_slot(Slot::Psalm, &candidates);
        assert_eq!(slot.value, "Ps 23:1-3");
        assert_eq!(slot.outcome, SlotOutcome::Vote);
        assert_eq!(slot.sources, vec!["a", "b"]);
        assert_eq!(slot.conflicts.len(), 1);
    }

    #[test]
    fn test_majority_beats_priority() {
        let candidates = vec![
            psalm("a", "Ps 22:1"),
            psalm("b", "Ps 23:1-3"),
            psalm("c", "Psalm 23:1-6"),
        ];
        let slot = reconciler().reconcile_slot(Slot::Psalm, &candidates);
        assert_eq!(slot.value, "Ps 23:1-3");
        assert_eq!(slot.sources, vec!["b", "c"]);
    }

    #[test]
    fn test_total_disagreement_uses_priority() {
        let candidates = vec![
            psalm("c", "Ps 24:1"),
            psalm("b", "Ps 23:1"),
            psalm("a", "Ps 22:1"),
        ];
        let slot = reconciler().reconcile_slot(Slot::Psalm, &candidates);
        assert_eq!(slot.value, "Ps 22:1");
        assert_eq!(slot.outcome, SlotOutcome::Priority);
        assert_eq!(slot.sources, vec!["a"]);
        assert_eq!(slot.conflicts.len(), 3);
    }

    #[test]
    fn test_single_source_is_priority() {
        let candidates = vec![psalm("b", "Ps 23:1")];
        let slot = reconciler().reconcile_slot(Slot::Psalm, &candidates);
        assert_eq!(slot.outcome, SlotOutcome::Priority);
        assert_eq!(slot.value, "Ps 23:1");
    }

    #[test]
    fn test_empty_slot() {
        let candidates = vec![psalm("a", "Ps 23:1")];
        let slot = reconciler().reconcile_slot(Slot::Second, &candidates);
        assert!(slot.is_empty());
        assert_eq!(slot.outcome, SlotOutcome::Empty);
    }

    #[test]
    fn test_one_vote_per_source() {
        let candidates = vec![
            psalm("c", "Ps 22:1"),
            psalm("c", "Ps 22:1"),
            psalm("a", "Ps 23:1"),
        ];
        let slot = reconciler().reconcile_slot(Slot::Psalm, &candidates);
        assert_eq!(slot.outcome, SlotOutcome::Priority);
        assert_eq!(slot.value, "Ps 23:1");
    }

    #[test]
    fn test_unlisted_sources_rank_last() {
        let candidates = vec![psalm("zz", "Ps 24:1"), psalm("c", "Ps 22:1")];
        let slot = reconciler().reconcile_slot(Slot::Psalm, &candidates);
        assert_eq!(slot.value, "Ps 22:1");
    }

    #[test]
    fn test_tie_between_groups_goes_to_priority() {
        let r = Reconciler::new(vec!["a".into(), "b".into(), "c".into(), "d".into()], 2);
        let candidates = vec![
            psalm("d", "Ps 22:1"),
            psalm("c", "Ps 23:1"),
            psalm("b", "Ps 22:1-2"),
            psalm("a", "Ps 23:1-6"),
        ];
        let slot = r.reconcile_slot(Slot::Psalm, &candidates);
        assert_eq!(slot.outcome, SlotOutcome::Vote);
        assert_eq!(slot.value, "Ps 23:1-6");
        assert_eq!(slot.sources, vec!["a", "c"]);
    }

    #[test]
    fn test_higher_threshold() {
        let r = Reconciler::new(vec!["a".into(), "b".into(), "c".into()], 3);
        let candidates = vec![
            psalm("a", "Ps 22:1"),
            psalm("b", "Ps 23:1"),
            psalm("c", "Ps 23:1"),
        ];
        let slot = r.reconcile_slot(Slot::Psalm, &candidates);
        assert_eq!(slot.outcome, SlotOutcome::Priority);
        assert_eq!(slot.value, "Ps 22:1");
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let candidates = vec![
            psalm("b", "Ps 23:1"),
            psalm("a", "Ps 22:1"),
            Candidate::new("a", Slot::Gospel, "Lk 1:1", ""),
        ];
        let r = reconciler();
        let first: Vec<_> = r.reconcile(&candidates).into_iter().map(|s| s.value).collect();
        let second: Vec<_> = r.reconcile(&candidates).into_iter().map(|s| s.value).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["", "", "Ps 22:1", "Lk 1:1"]);
    }
}
