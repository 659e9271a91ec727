//! Scenario tests for daily record creation and week-cohort linking.

use chrono::NaiveDate;
use habitual::daily::{DailyOptions, DailyRecordCreator, ExistingPolicy, LinkMode};
use habitual::models::{HabitCatalog, HabitDefinition};
use habitual::store::memory::MemoryStore;
use habitual::store::{Filter, NewRecord, Page, Record, RecordPatch, RecordStore};
use habitual::{Error, Result};
use std::collections::HashSet;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dua() -> HabitDefinition {
    HabitDefinition::new("Dua", 7, "🤲", "Times")
}

fn ids(values: &[String]) -> HashSet<String> {
    values.iter().cloned().collect()
}

fn set(values: &[&String]) -> HashSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Run the creator for `habit` on `day` and return the new record id.
fn link(store: &mut MemoryStore, options: DailyOptions, habit: &HabitDefinition, day: NaiveDate) -> String {
    DailyRecordCreator::new(store, options)
        .link_habit(habit, day)
        .unwrap()
        .record_id
}

fn records_on(store: &MemoryStore, name: &str, day: NaiveDate) -> Vec<Record> {
    store
        .records()
        .iter()
        .filter(|r| !r.is_master && r.name() == name && r.task_date == Some(day))
        .cloned()
        .collect()
}

#[test]
fn test_records_link_to_earlier_days_of_the_week() {
    let mut store = MemoryStore::new();
    let master = store.insert_master("Dua", 7);
    let options = DailyOptions::default();

    // 2024-01-07 is a Sunday, so it opens the week.
    let sun = link(&mut store, options, &dua(), date(2024, 1, 7));
    let mon = link(&mut store, options, &dua(), date(2024, 1, 8));
    let tue = link(&mut store, options, &dua(), date(2024, 1, 9));

    let tue_record = store.get(&tue).unwrap();
    assert_eq!(ids(&tue_record.relation), set(&[&sun, &mon, &master, &tue]));
    assert_eq!(tue_record.week_start, Some(date(2024, 1, 7)));
    assert_eq!(tue_record.target, Some(7));
    assert_eq!(tue_record.unit.as_deref(), Some("Times"));
    assert!(!tue_record.done);

    // One-way linking leaves earlier records untouched.
    assert_eq!(ids(&store.get(&sun).unwrap().relation), set(&[&master, &sun]));
}

#[test]
fn test_relation_has_no_duplicates() {
    let mut store = MemoryStore::new();
    store.insert_master("Dua", 7);
    let options = DailyOptions::default();
    link(&mut store, options, &dua(), date(2024, 1, 7));
    let mon = link(&mut store, options, &dua(), date(2024, 1, 8));

    let relation = &store.get(&mon).unwrap().relation;
    assert_eq!(relation.len(), ids(relation).len());
}

#[test]
fn test_sunday_starts_a_new_cohort() {
    let mut store = MemoryStore::new();
    let master = store.insert_master("Dua", 7);
    let options = DailyOptions::default();

    link(&mut store, options, &dua(), date(2024, 1, 12));
    link(&mut store, options, &dua(), date(2024, 1, 13));
    let next_sun = link(&mut store, options, &dua(), date(2024, 1, 14));

    let record = store.get(&next_sun).unwrap();
    assert_eq!(ids(&record.relation), set(&[&master, &next_sun]));
    assert_eq!(record.week_start, Some(date(2024, 1, 14)));
}

#[test]
fn test_completed_siblings_are_linked_too() {
    let mut store = MemoryStore::new();
    let master = store.insert_master("Dua", 7);
    let options = DailyOptions::default();

    let mon = link(&mut store, options, &dua(), date(2024, 1, 8));
    store.get_mut(&mon).unwrap().done = true;
    let tue = link(&mut store, options, &dua(), date(2024, 1, 9));

    assert_eq!(ids(&store.get(&tue).unwrap().relation), set(&[&mon, &master, &tue]));
}

#[test]
fn test_other_habits_are_not_linked() {
    let mut store = MemoryStore::new();
    let master = store.insert_master("Dua", 7);
    store.insert_master("Reading", 7);
    let reading = HabitDefinition::new("Reading", 7, "📖", "Pages");
    let options = DailyOptions::default();

    link(&mut store, options, &reading, date(2024, 1, 8));
    let dua_id = link(&mut store, options, &dua(), date(2024, 1, 8));

    assert_eq!(ids(&store.get(&dua_id).unwrap().relation), set(&[&master, &dua_id]));
}

#[test]
fn test_rerun_same_day_duplicates_by_default() {
    let mut store = MemoryStore::new();
    let master = store.insert_master("Dua", 7);
    let options = DailyOptions::default();

    let first = link(&mut store, options, &dua(), date(2024, 1, 8));
    let second = link(&mut store, options, &dua(), date(2024, 1, 8));

    assert_ne!(first, second);
    assert_eq!(records_on(&store, "Dua", date(2024, 1, 8)).len(), 2);
    assert_eq!(
        ids(&store.get(&second).unwrap().relation),
        set(&[&first, &master, &second])
    );
}

#[test]
fn test_rerun_same_day_reuses_when_configured() {
    let mut store = MemoryStore::new();
    let master = store.insert_master("Dua", 7);
    let options = DailyOptions {
        on_existing: ExistingPolicy::Reuse,
        ..Default::default()
    };

    let first = link(&mut store, options, &dua(), date(2024, 1, 8));
    let outcome = DailyRecordCreator::new(&mut store, options)
        .link_habit(&dua(), date(2024, 1, 8))
        .unwrap();

    assert!(outcome.reused);
    assert_eq!(outcome.record_id, first);
    assert_eq!(records_on(&store, "Dua", date(2024, 1, 8)).len(), 1);
    assert_eq!(ids(&store.get(&first).unwrap().relation), set(&[&master, &first]));
}

#[test]
fn test_clique_mode_links_back() {
    let mut store = MemoryStore::new();
    let master = store.insert_master("Dua", 7);
    let options = DailyOptions {
        link_mode: LinkMode::Clique,
        ..Default::default()
    };

    let sun = link(&mut store, options, &dua(), date(2024, 1, 7));
    let mon = link(&mut store, options, &dua(), date(2024, 1, 8));
    let outcome = DailyRecordCreator::new(&mut store, options)
        .link_habit(&dua(), date(2024, 1, 9))
        .unwrap();
    let tue = outcome.record_id;

    assert_eq!(outcome.siblings_patched, 2);
    assert_eq!(
        ids(&store.get(&sun).unwrap().relation),
        set(&[&master, &sun, &mon, &tue])
    );
    assert_eq!(
        ids(&store.get(&mon).unwrap().relation),
        set(&[&sun, &master, &mon, &tue])
    );
    // The master itself is never patched.
    assert!(store.get(&master).unwrap().relation.is_empty());
}

#[test]
fn test_paginated_week_lookup() {
    let mut store = MemoryStore::new().with_max_page_size(2);
    let master = store.insert_master("Dua", 7);
    let options = DailyOptions {
        page_size: 2,
        ..Default::default()
    };

    let mut earlier = Vec::new();
    for d in 7..=11 {
        earlier.push(link(&mut store, options, &dua(), date(2024, 1, d)));
    }
    let fri = link(&mut store, options, &dua(), date(2024, 1, 12));

    let relation = ids(&store.get(&fri).unwrap().relation);
    assert_eq!(relation.len(), 7);
    assert!(relation.contains(&master));
    assert!(earlier.iter().all(|id| relation.contains(id)));
}

/// Wraps a memory store and fails every create for one habit.
struct FailingCreates {
    inner: MemoryStore,
    broken: &'static str,
}

impl RecordStore for FailingCreates {
    fn query(&self, filter: &Filter, page_size: usize, cursor: Option<&str>) -> Result<Page> {
        self.inner.query(filter, page_size, cursor)
    }

    fn create(&mut self, record: &NewRecord) -> Result<String> {
        if record.title == self.broken {
            return Err(Error::Http {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        self.inner.create(record)
    }

    fn patch(&mut self, id: &str, patch: &RecordPatch) -> Result<()> {
        self.inner.patch(id, patch)
    }
}

#[test]
fn test_one_failing_habit_does_not_stop_the_run() {
    let mut inner = MemoryStore::new();
    inner.insert_master("Dua", 7);
    inner.insert_master("Broken", 1);
    inner.insert_master("Reading", 7);
    let mut store = FailingCreates {
        inner,
        broken: "Broken",
    };
    let catalog = HabitCatalog::new(vec![
        dua(),
        HabitDefinition::new("Broken", 1, "", "Times"),
        HabitDefinition::new("No Master", 3, "", "Times"),
        HabitDefinition::new("Reading", 7, "📖", "Pages"),
    ])
    .unwrap();

    let report =
        DailyRecordCreator::new(&mut store, DailyOptions::default()).run(&catalog, date(2024, 1, 9));

    let linked: Vec<&str> = report.linked.iter().map(|o| o.habit.as_str()).collect();
    let failed: Vec<&str> = report.failed.iter().map(|f| f.habit.as_str()).collect();
    assert_eq!(linked, vec!["Dua", "Reading"]);
    assert_eq!(failed, vec!["Broken", "No Master"]);
    assert!(report.failed[1].error.contains("No Master"));
    assert_eq!(report.week_start, date(2024, 1, 7));
    assert_eq!(records_on(&store.inner, "Reading", date(2024, 1, 9)).len(), 1);
}
