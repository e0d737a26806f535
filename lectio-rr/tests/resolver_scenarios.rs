// Resolver scenario tests
//
// Exercise the full resolve pipeline (screen -> vote -> validate -> override
// -> strict check) with in-memory adapters. No network access.

use async_trait::async_trait;
use chrono::NaiveDate;
use lectio_rr::canonical::canonicalize;
use lectio_rr::grammar::classify;
use lectio_rr::{
    Candidate, CitationClass, OverrideRecord, OverrideStore, ResolveError, Resolver,
    ResolverConfig, Slot, SlotOutcome, SourceAdapter,
};
use std::sync::Arc;

// ================================================================================================
// Test adapters
// ================================================================================================

/// Returns a fixed candidate list, optionally only for one date
struct StubAdapter {
    id: &'static str,
    only_on: Option<NaiveDate>,
    picks: Vec<(Slot, &'static str)>,
}

impl StubAdapter {
    fn new(id: &'static str, picks: Vec<(Slot, &'static str)>) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            id,
            only_on: None,
            picks,
        })
    }

    fn on(id: &'static str, date: NaiveDate, picks: Vec<(Slot, &'static str)>) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            id,
            only_on: Some(date),
            picks,
        })
    }
}

#[async_trait]
impl SourceAdapter for StubAdapter {
    fn source_id(&self) -> &str {
        self.id
    }

    async fn fetch_candidates(&self, date: NaiveDate) -> Vec<Candidate> {
        if self.only_on.is_some_and(|d| d != date) {
            return Vec::new();
        }
        self.picks
            .iter()
            .map(|(slot, citation)| Candidate::new(self.id, *slot, *citation, *citation))
            .collect()
    }
}

/// Never answers; only the resolver's timeout ends it
struct HangingAdapter {
    id: &'static str,
}

#[async_trait]
impl SourceAdapter for HangingAdapter {
    fn source_id(&self) -> &str {
        self.id
    }

    async fn fetch_candidates(&self, _date: NaiveDate) -> Vec<Candidate> {
        std::future::pending::<()>().await;
        Vec::new()
    }
}

fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 7).unwrap()
}

fn settings(strict: bool) -> ResolverConfig {
    ResolverConfig {
        strict,
        adapter_timeout_secs: 1,
        ..ResolverConfig::default()
    }
}

fn resolver(adapters: Vec<Arc<dyn SourceAdapter>>) -> Resolver {
    Resolver::new(settings(false), adapters, OverrideStore::new())
}

fn full_sunday(id: &'static str) -> Arc<dyn SourceAdapter> {
    StubAdapter::new(
        id,
        vec![
            (Slot::First, "Wis 9:13-18b"),
            (Slot::Psalm, "Ps 90:3-4, 5-6, 12-13, 14-17"),
            (Slot::Second, "Phlm 9-10, 12-17"),
            (Slot::Gospel, "Lk 14:25-33"),
        ],
    )
}

// ================================================================================================
// Scenario 1: majority vote keeps the first-seen display form
// ================================================================================================

#[tokio::test]
async fn scenario_majority_psalm_wins() {
    let r = resolver(vec![
        StubAdapter::new("a", vec![(Slot::Psalm, "Ps 23:1-3")]),
        StubAdapter::new("b", vec![(Slot::Psalm, "Psalm 23:1-3a")]),
        StubAdapter::new("c", vec![(Slot::Psalm, "Ps 22:1")]),
    ]);

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.psalm_ref, "Ps 23:1-3");
    assert_eq!(result.outcome(Slot::Psalm), Some(SlotOutcome::Vote));
    assert_eq!(result.sources, vec!["a", "b"]);
}

#[tokio::test]
async fn agreement_overrides_priority() {
    let r = resolver(vec![
        StubAdapter::new("a", vec![(Slot::Gospel, "Lk 16:1-13")]),
        StubAdapter::new("b", vec![(Slot::Gospel, "Luke 16:19-31")]),
        StubAdapter::new("c", vec![(Slot::Gospel, "Lk 16:19-31")]),
    ]);

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(canonicalize(&result.gospel_ref), canonicalize("Lk 16:19-31"));
    assert_eq!(result.gospel_ref, "Luke 16:19-31");
}

#[tokio::test]
async fn total_disagreement_uses_highest_priority() {
    let r = resolver(vec![
        StubAdapter::new("a", vec![(Slot::First, "Am 6:1a, 4-7")]),
        StubAdapter::new("b", vec![(Slot::First, "Am 8:4-7")]),
        StubAdapter::new("c", vec![(Slot::First, "1 Tm 6:11-16")]),
    ]);

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.first_ref, "Am 6:1a, 4-7");
    assert_eq!(result.outcome(Slot::First), Some(SlotOutcome::Priority));
}

// ================================================================================================
// Scenario 2: mis-tagged candidate is screened before the vote
// ================================================================================================

#[tokio::test]
async fn scenario_mistagged_gospel_in_first_falls_back() {
    let r = resolver(vec![
        StubAdapter::new("a", vec![(Slot::First, "Luke 10:25-37")]),
        StubAdapter::new("b", vec![(Slot::First, "Dt 30:10-14")]),
    ]);

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.first_ref, "Dt 30:10-14");
    assert_eq!(result.outcome(Slot::First), Some(SlotOutcome::Priority));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("Luke 10:25-37") && w.contains("gospel")));
}

#[tokio::test]
async fn scenario_mistagged_everywhere_leaves_slot_empty() {
    let r = resolver(vec![
        StubAdapter::new("a", vec![(Slot::First, "Luke 10:25-37")]),
        StubAdapter::new("b", vec![(Slot::First, "Lk 10:25-37")]),
    ]);

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.first_ref, "");
    assert_eq!(result.outcome(Slot::First), Some(SlotOutcome::Empty));
}

// ================================================================================================
// Scenario 3: weekday without a second reading
// ================================================================================================

#[tokio::test]
async fn scenario_weekday_has_empty_second_without_warning() {
    let weekday = vec![
        (Slot::First, "1 Cor 5:1-8"),
        (Slot::Psalm, "Ps 5:5-6, 7, 12"),
        (Slot::Gospel, "Lk 6:6-11"),
    ];
    let r = resolver(vec![
        StubAdapter::new("a", weekday.clone()),
        StubAdapter::new("b", weekday),
    ]);

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.second_ref, "");
    assert_eq!(result.outcome(Slot::Second), Some(SlotOutcome::Empty));
    assert!(result.warnings.is_empty());
    assert!(!result.validation_blanked);
    assert_eq!(result.lectionary_key, "1Cor5:1-8|Ps5:5-6,7,12|Lk6:6-11");
}

// ================================================================================================
// Scenario 4: override precedence
// ================================================================================================

#[tokio::test]
async fn scenario_override_replaces_gospel() {
    let mut overrides = OverrideStore::new();
    overrides.insert(
        sunday(),
        OverrideRecord {
            gospel_ref: Some("John 11:1-45".into()),
            ..OverrideRecord::default()
        },
    );
    let r = Resolver::new(
        settings(false),
        vec![
            StubAdapter::new("a", vec![(Slot::Gospel, "Luke 16:19-31")]),
            StubAdapter::new("b", vec![(Slot::Gospel, "Lk 16:19-31")]),
        ],
        overrides,
    );

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.gospel_ref, "John 11:1-45");
    assert!(result.override_applied);
    assert_eq!(result.outcome(Slot::Gospel), Some(SlotOutcome::Override));
}

#[tokio::test]
async fn override_bypasses_validation() {
    let store = OverrideStore::from_json_str(r#"{"2025-09-07": {"psalmRef": "X", "secondRef": ""}}"#)
        .unwrap();
    let r = Resolver::new(settings(false), vec![full_sunday("a"), full_sunday("b")], store);

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.psalm_ref, "X");
    assert_eq!(result.second_ref, "");
    assert_eq!(result.outcome(Slot::Second), Some(SlotOutcome::Override));
    assert_eq!(result.first_ref, "Wis 9:13-18b");
}

#[tokio::test]
async fn override_for_other_date_is_ignored() {
    let store =
        OverrideStore::from_json_str(r#"[{"date": "2025-09-08", "gospelRef": "Lk 6:6-11"}]"#)
            .unwrap();
    let r = Resolver::new(settings(false), vec![full_sunday("a")], store);

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.gospel_ref, "Lk 14:25-33");
    assert!(!result.override_applied);
}

// ================================================================================================
// Scenario 5: every adapter times out
// ================================================================================================

#[tokio::test]
async fn scenario_timeouts_fail_in_strict_mode() {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(HangingAdapter { id: "a" }),
        Arc::new(HangingAdapter { id: "b" }),
        Arc::new(HangingAdapter { id: "c" }),
    ];
    let r = Resolver::new(settings(true), adapters, OverrideStore::new());

    let err = r.resolve(sunday()).await.unwrap_err();

    match err {
        ResolveError::MissingRequiredSlots { date, slots } => {
            assert_eq!(date, sunday());
            assert_eq!(slots, vec![Slot::First, Slot::Psalm, Slot::Gospel]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn scenario_timeouts_degrade_in_lenient_mode() {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(HangingAdapter { id: "a" }),
        Arc::new(HangingAdapter { id: "b" }),
    ];
    let r = Resolver::new(settings(false), adapters, OverrideStore::new());

    let result = r.resolve(sunday()).await.unwrap();

    for slot in Slot::ALL {
        assert_eq!(result.get(slot), "");
    }
    assert!(result.sources.is_empty());
    assert_eq!(result.warnings.len(), 3);
}

#[tokio::test]
async fn strict_mode_passes_with_override_filling_gap() {
    let mut overrides = OverrideStore::new();
    overrides.insert(
        sunday(),
        OverrideRecord {
            psalm_ref: Some("Ps 90:3-4".into()),
            ..OverrideRecord::default()
        },
    );
    let r = Resolver::new(
        settings(true),
        vec![StubAdapter::new(
            "a",
            vec![(Slot::First, "Wis 9:13-18b"), (Slot::Gospel, "Lk 14:25-33")],
        )],
        overrides,
    );

    let result = r.resolve(sunday()).await.unwrap();

    assert_eq!(result.psalm_ref, "Ps 90:3-4");
    assert!(result.missing_required().is_empty());
}

// ================================================================================================
// Properties
// ================================================================================================

#[tokio::test]
async fn invariants_hold_on_noisy_input() {
    let r = resolver(vec![
        StubAdapter::new(
            "a",
            vec![
                (Slot::First, "Acts 2:1-11"),
                (Slot::Second, "Acts 2:1-6"),
                (Slot::Psalm, "Is 12:2-6"),
                (Slot::Gospel, "1 John 4:7-10"),
            ],
        ),
        StubAdapter::new(
            "b",
            vec![
                (Slot::First, "Acts 2:1-11"),
                (Slot::Second, "Acts 2:1-11"),
                (Slot::Psalm, "Ps 104:1, 24, 29-30"),
                (Slot::Gospel, "Jn 20:19-23"),
            ],
        ),
    ]);

    let result = r.resolve(sunday()).await.unwrap();

    assert!(result.psalm_ref.is_empty() || classify(&result.psalm_ref) == CitationClass::Psalm);
    assert!(result.gospel_ref.is_empty() || classify(&result.gospel_ref) == CitationClass::Gospel);
    assert_ne!(classify(&result.first_ref), CitationClass::Psalm);
    assert_ne!(classify(&result.first_ref), CitationClass::Gospel);
    if !result.second_ref.is_empty() {
        let second = canonicalize(&result.second_ref);
        for other in [&result.first_ref, &result.psalm_ref, &result.gospel_ref] {
            assert_ne!(second, canonicalize(other));
        }
    }

    assert_eq!(result.psalm_ref, "Ps 104:1, 24, 29-30");
    assert_eq!(result.gospel_ref, "Jn 20:19-23");
    assert_eq!(result.second_ref, "");
    assert!(result.validation_blanked);
    assert_eq!(result.outcome(Slot::Second), Some(SlotOutcome::Blanked));
}

#[tokio::test]
async fn resolve_is_idempotent() {
    let r = resolver(vec![
        full_sunday("a"),
        StubAdapter::new("b", vec![(Slot::Psalm, "Psalm 90:3-6")]),
        StubAdapter::new("c", vec![(Slot::Gospel, "Luke 14:25-33")]),
    ]);

    let first = serde_json::to_string(&r.resolve(sunday()).await.unwrap()).unwrap();
    let second = serde_json::to_string(&r.resolve(sunday()).await.unwrap()).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn resolve_many_keeps_order_and_isolates_failures() {
    let monday = sunday().succ_opt().unwrap();
    let tuesday = monday.succ_opt().unwrap();
    let r = Resolver::new(
        settings(true),
        vec![StubAdapter::on(
            "a",
            monday,
            vec![
                (Slot::First, "1 Cor 2:1-5"),
                (Slot::Psalm, "Ps 119:97-102"),
                (Slot::Gospel, "Lk 4:16-30"),
            ],
        )],
        OverrideStore::new(),
    );

    let results = r.resolve_many(&[sunday(), monday, tuesday]).await;

    let dates: Vec<_> = results.iter().map(|(d, _)| *d).collect();
    assert_eq!(dates, vec![sunday(), monday, tuesday]);
    assert!(results[0].1.is_err());
    assert_eq!(results[1].1.as_ref().unwrap().gospel_ref, "Lk 4:16-30");
    assert!(results[2].1.is_err());
}
