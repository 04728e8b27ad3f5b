//! Property-based tests using proptest.
//!
//! Verifies ordering totality, the description length boundary, round-trips
//! through the service and resilience of the loader against arbitrary
//! stored content.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use tasklist::domain::{compare, sort_tasks, ManualClock};
use tasklist::store::{parse_tasks, MemoryStorage, StorageBackend};
use tasklist::validation::validate_description;
use tasklist::{Task, TaskService, DEFAULT_STORAGE_KEY};

// ─── Arbitrary Strategies ───────────────────────────────────────────────────

fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-f0-9]{8}-[a-f0-9]{4}-4[a-f0-9]{3}-[89ab][a-f0-9]{3}-[a-f0-9]{12}",
        "[a-zA-Z0-9 ]{1,40}",
        any::<bool>(),
        prop_oneof![
            "2025-0[1-9]-[0-2][1-8]T[01][0-9]:[0-5][0-9]:[0-5][0-9]\\.[0-9]{3}Z",
            Just("2025-01-01T00:00:00.000Z".to_string()),
            Just("garbage".to_string()),
        ],
    )
        .prop_map(|(id, description, completed, created_at)| Task {
            id,
            description,
            completed,
            updated_at: created_at.clone(),
            created_at,
        })
}

fn arb_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i64>().prop_map(|n| serde_json::json!(n)),
        "[a-zA-Z]{0,8}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
            prop::collection::hash_map("[a-zA-Z]{1,10}", inner, 0..6)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

// ─── Ordering ───────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn compare_is_antisymmetric(a in arb_task(), b in arb_task()) {
        prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
    }

    #[test]
    fn compare_is_transitive(a in arb_task(), b in arb_task(), c in arb_task()) {
        if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
            prop_assert_ne!(compare(&a, &c), Ordering::Greater);
        }
    }

    #[test]
    fn sorting_ignores_input_order(tasks in prop::collection::vec(arb_task(), 0..12)) {
        let mut reversed = tasks.clone();
        reversed.reverse();
        prop_assert_eq!(sort_tasks(tasks), sort_tasks(reversed));
    }

    #[test]
    fn completion_never_reorders(mut tasks in prop::collection::vec(arb_task(), 1..12), flip in any::<prop::sample::Index>()) {
        let before: Vec<String> = sort_tasks(tasks.clone()).into_iter().map(|t| t.id).collect();
        let i = flip.index(tasks.len());
        tasks[i].completed = !tasks[i].completed;
        let after: Vec<String> = sort_tasks(tasks).into_iter().map(|t| t.id).collect();
        prop_assert_eq!(before, after);
    }
}

// ─── Validation ─────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn description_boundary(len in 1usize..=140, pad in 0usize..4) {
        let core = "x".repeat(len);
        let raw = format!("{}{core}{}", " ".repeat(pad), "\t".repeat(pad));
        let result = validate_description(&raw);
        if len <= 100 {
            prop_assert_eq!(result.unwrap(), core);
        } else {
            let err = result.unwrap_err();
            prop_assert_eq!(err.field(), Some("description"));
        }
    }

    #[test]
    fn whitespace_only_is_empty(raw in "[ \t\n\r]{0,20}") {
        let err = validate_description(&raw).unwrap_err();
        prop_assert_eq!(err.to_string(), "Description cannot be empty");
    }
}

// ─── Service ────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn create_get_round_trip(description in "[ ]{0,3}[a-zA-Z0-9][a-zA-Z0-9 ]{0,90}[ ]{0,3}") {
        let service = TaskService::new(MemoryStorage::new().open_tab());
        let created = service.create(&description).unwrap();
        let fetched = service.get(&created.id).unwrap().unwrap();
        prop_assert_eq!(fetched.description, description.trim());
    }

    #[test]
    fn list_is_newest_first(count in 1usize..8) {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let service = TaskService::new(MemoryStorage::new().open_tab())
            .with_clock(Arc::new(ManualClock::ticking(start, Duration::milliseconds(1))));
        for i in 0..count {
            service.create(&format!("task {i}")).unwrap();
        }
        let listed: Vec<String> = service.list().unwrap().into_iter().map(|t| t.description).collect();
        let expected: Vec<String> = (0..count).rev().map(|i| format!("task {i}")).collect();
        prop_assert_eq!(listed, expected);
    }
}

// ─── Corruption Resilience ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn arbitrary_text_never_panics(raw in ".{0,200}") {
        let _ = parse_tasks(&raw);
    }

    #[test]
    fn arbitrary_json_loads_only_well_shaped_records(value in arb_json()) {
        let tab = MemoryStorage::new().open_tab();
        tab.set_item(DEFAULT_STORAGE_KEY, &value.to_string()).unwrap();
        let tasks = TaskService::new(tab).list().unwrap();
        match value {
            serde_json::Value::Array(items) => prop_assert!(tasks.len() <= items.len()),
            _ => prop_assert!(tasks.is_empty()),
        }
    }

    #[test]
    fn stored_collections_load_back(tasks in prop::collection::vec(arb_task(), 0..10)) {
        let raw = serde_json::to_string(&tasks).unwrap();
        prop_assert_eq!(parse_tasks(&raw), tasks);
    }
}
