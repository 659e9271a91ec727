//! Weekly completion rollup.
//!
//! The rollup joins two reads of the record store:
//! - [`MasterIndex`] - every master record, name -> {identity, target}
//! - [`CompletionCounts`] - done daily records inside the week, name -> count
//!
//! [`compute_rollup`] turns them into rows ranked by completion percent.

pub mod chart;

use crate::models::RollupRow;
use crate::store::{Field, Filter, Record, RecordStore, fetch_all};
use crate::week::WeekWindow;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// A master record reduced to what the rollup and linker need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterEntry {
    pub id: String,
    pub name: String,
    pub target: u32,
}

/// Master records keyed by name, in first-seen order.
///
/// When two masters share a name the later one replaces the earlier one's
/// identity and target but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct MasterIndex {
    entries: Vec<MasterEntry>,
    positions: HashMap<String, usize>,
}

impl MasterIndex {
    /// Read every `isMaster == true` record from the store.
    pub fn load<S: RecordStore + ?Sized>(store: &S, page_size: usize) -> Result<Self> {
        let filter = Filter::new().checkbox(Field::IsMaster, true);
        let records = fetch_all(store, &filter, page_size)?;
        Ok(Self::from_records(&records))
    }

    pub fn from_records(records: &[Record]) -> Self {
        let mut index = Self::default();
        for record in records {
            index.insert(MasterEntry {
                id: record.id.clone(),
                name: record.name().to_string(),
                target: record.target.unwrap_or(0),
            });
        }
        index
    }

    fn insert(&mut self, entry: MasterEntry) {
        match self.positions.get(&entry.name) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions.insert(entry.name.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&MasterEntry> {
        self.positions.get(name).map(|&pos| &self.entries[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MasterEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Completed-instance counts per habit name within one week window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionCounts {
    counts: BTreeMap<String, u32>,
}

impl CompletionCounts {
    /// Count `done == true` records dated inside `window`.
    pub fn load<S: RecordStore + ?Sized>(
        store: &S,
        window: &WeekWindow,
        page_size: usize,
    ) -> Result<Self> {
        let filter = Filter::new().checkbox(Field::Done, true).date_between(
            Field::TaskDate,
            window.start(),
            window.end(),
        );
        let records = fetch_all(store, &filter, page_size)?;
        Ok(Self::from_records(&records, window))
    }

    /// One increment per record. Records that are not done or fall outside
    /// `window` are not counted, whatever the store returned.
    pub fn from_records(records: &[Record], window: &WeekWindow) -> Self {
        let mut counts = BTreeMap::new();
        for record in records {
            let in_window = record.task_date.is_some_and(|d| window.contains(d));
            if record.done && in_window {
                *counts.entry(record.name().to_string()).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    pub fn get(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

/// Result of joining masters with completions.
#[derive(Debug, Clone, Serialize)]
pub struct Rollup {
    /// One row per master, highest percent first
    pub rows: Vec<RollupRow>,
    /// Completed names with no master record; not part of `rows`
    pub unmatched: Vec<String>,
}

/// Join masters and counts into ranked rows.
///
/// Every master gets a row, including those with no completions. The sort is
/// stable, so equal percents keep master order.
pub fn compute_rollup(masters: &MasterIndex, counts: &CompletionCounts) -> Rollup {
    let mut rows: Vec<RollupRow> = masters
        .iter()
        .map(|m| RollupRow::new(m.name.clone(), m.target, counts.get(&m.name)))
        .collect();
    rows.sort_by(|a, b| b.percent.total_cmp(&a.percent));

    let unmatched: Vec<String> = counts
        .names()
        .filter(|name| masters.get(name).is_none())
        .map(str::to_string)
        .collect();
    for name in &unmatched {
        warn!(habit = %name, count = counts.get(name), "completions without a master record");
    }

    Rollup { rows, unmatched }
}

/// Load both indexes for `window` and compute the rollup.
///
/// Any store failure aborts; there is no partial rollup. A store with no
/// master records at all is reported as [`Error::NoMasters`].
pub fn run_rollup<S: RecordStore + ?Sized>(
    store: &S,
    window: &WeekWindow,
    page_size: usize,
) -> Result<Rollup> {
    let masters = MasterIndex::load(store, page_size)?;
    if masters.is_empty() {
        return Err(Error::NoMasters);
    }
    let counts = CompletionCounts::load(store, window, page_size)?;
    info!(
        week_start = %window.start(),
        week_end = %window.end(),
        masters = masters.len(),
        completions = counts.total(),
        "computing rollup"
    );
    Ok(compute_rollup(&masters, &counts))
}
