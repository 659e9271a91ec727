//! Daily record creation and week-cohort linking.
//!
//! For each habit, once per day:
//! 1. Look up the habit's master record (`isMaster == true`, title match)
//! 2. Collect every record for the habit dated from the week anchor (Sunday)
//!    through today
//! 3. Create today's record related to those records and the master
//! 4. Patch the new record so its relation also includes itself
//!
//! The new record's identity is only known after step 3, hence the second
//! write. Habits are processed one at a time in catalog order; a failure for
//! one habit is logged and does not stop the rest.

use crate::models::{HabitCatalog, HabitDefinition};
use crate::store::{Field, Filter, NewRecord, Record, RecordPatch, RecordStore, fetch_all, union_ids};
use crate::week::{DAILY_ANCHOR, WeekWindow};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, warn};

/// What to do when today's record for a habit already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExistingPolicy {
    /// Create another record anyway (each run inserts one record)
    #[default]
    Duplicate,
    /// Re-link the existing record in place instead of inserting
    Reuse,
}

impl ExistingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExistingPolicy::Duplicate => "duplicate",
            ExistingPolicy::Reuse => "reuse",
        }
    }
}

impl FromStr for ExistingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "duplicate" => Ok(ExistingPolicy::Duplicate),
            "reuse" => Ok(ExistingPolicy::Reuse),
            other => Err(Error::InvalidInput(format!(
                "on-existing must be \"duplicate\" or \"reuse\", got \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for ExistingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side of a sibling pair gets the relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkMode {
    /// Only the new record references its siblings
    #[default]
    OneWay,
    /// Earlier siblings are also patched to reference the new record
    Clique,
}

impl LinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMode::OneWay => "one-way",
            LinkMode::Clique => "clique",
        }
    }
}

impl FromStr for LinkMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "one-way" | "oneway" => Ok(LinkMode::OneWay),
            "clique" | "both" => Ok(LinkMode::Clique),
            other => Err(Error::InvalidInput(format!(
                "link-mode must be \"one-way\" or \"clique\", got \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyOptions {
    pub on_existing: ExistingPolicy,
    pub link_mode: LinkMode,
    pub page_size: usize,
}

impl Default for DailyOptions {
    fn default() -> Self {
        Self {
            on_existing: ExistingPolicy::default(),
            link_mode: LinkMode::default(),
            page_size: crate::store::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Outcome of linking one habit's record for the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkOutcome {
    pub habit: String,
    pub record_id: String,
    pub master_id: String,
    /// Final relation of the record, itself included
    pub relation: Vec<String>,
    /// True when an existing record for today was re-linked instead of created
    pub reused: bool,
    /// Earlier siblings patched to point back at this record
    pub siblings_patched: usize,
}

/// A habit that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitFailure {
    pub habit: String,
    pub error: String,
}

/// Summary of one run over the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub week_start: NaiveDate,
    pub linked: Vec<LinkOutcome>,
    pub failed: Vec<HabitFailure>,
}

/// Creates and links daily records against a [`RecordStore`].
pub struct DailyRecordCreator<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
    options: DailyOptions,
}

impl<'a, S: RecordStore + ?Sized> DailyRecordCreator<'a, S> {
    pub fn new(store: &'a mut S, options: DailyOptions) -> Self {
        Self { store, options }
    }

    /// Process every habit in catalog order. Never fails as a whole.
    pub fn run(&mut self, catalog: &HabitCatalog, today: NaiveDate) -> DailyReport {
        let week = WeekWindow::containing(today, DAILY_ANCHOR);
        info!(date = %today, week_start = %week.start(), habits = catalog.len(), "creating daily records");

        let mut report = DailyReport {
            date: today,
            week_start: week.start(),
            linked: Vec::new(),
            failed: Vec::new(),
        };

        for habit in catalog.iter() {
            match self.link_habit(habit, today) {
                Ok(outcome) => {
                    info!(
                        habit = %habit.name,
                        record = %outcome.record_id,
                        relations = outcome.relation.len(),
                        reused = outcome.reused,
                        "linked daily record"
                    );
                    report.linked.push(outcome);
                }
                Err(e) => {
                    error!(habit = %habit.name, error = %e, "failed to create daily record");
                    report.failed.push(HabitFailure {
                        habit: habit.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Create (or re-link) today's record for one habit.
    pub fn link_habit(&mut self, habit: &HabitDefinition, today: NaiveDate) -> Result<LinkOutcome> {
        let week = WeekWindow::containing(today, DAILY_ANCHOR);
        let master_id = self.find_master(&habit.name)?;
        let siblings = self.week_records(&habit.name, week.start(), today)?;

        let relation = union_ids(
            siblings
                .iter()
                .map(|r| r.id.as_str())
                .chain(std::iter::once(master_id.as_str())),
        );

        let existing = match self.options.on_existing {
            ExistingPolicy::Reuse => siblings
                .iter()
                .find(|r| !r.is_master && r.task_date == Some(today))
                .map(|r| r.id.clone()),
            ExistingPolicy::Duplicate => None,
        };
        let reused = existing.is_some();

        let record_id = match existing {
            Some(id) => id,
            None => self.store.create(&NewRecord {
                title: habit.name.clone(),
                task_date: today,
                done: false,
                target: habit.target,
                unit: habit.unit.clone(),
                week_start: week.start(),
                relation: relation.clone(),
                glyph: habit.glyph.clone(),
            })?,
        };

        let relation = union_ids(
            relation
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(record_id.as_str())),
        );
        self.store
            .patch(&record_id, &RecordPatch::relation(relation.clone()))?;

        let siblings_patched = match self.options.link_mode {
            LinkMode::OneWay => 0,
            LinkMode::Clique => self.link_back(&siblings, &record_id, &master_id),
        };

        Ok(LinkOutcome {
            habit: habit.name.clone(),
            record_id,
            master_id,
            relation,
            reused,
            siblings_patched,
        })
    }

    fn find_master(&self, name: &str) -> Result<String> {
        let filter = Filter::new()
            .title_equals(name)
            .checkbox(Field::IsMaster, true);
        let masters = fetch_all(&*self.store, &filter, self.options.page_size)?;
        masters
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| Error::MasterNotFound(name.to_string()))
    }

    fn week_records(&self, name: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Record>> {
        let filter = Filter::new()
            .title_equals(name)
            .date_between(Field::TaskDate, from, to);
        fetch_all(&*self.store, &filter, self.options.page_size)
    }

    /// Add `record_id` to each earlier sibling's relation.
    ///
    /// Failures are logged per sibling; the new record is already linked.
    fn link_back(&mut self, siblings: &[Record], record_id: &str, master_id: &str) -> usize {
        let mut patched = 0;
        for sibling in siblings {
            if sibling.id == record_id || sibling.id == master_id {
                continue;
            }
            if sibling.relation.iter().any(|id| id == record_id) {
                continue;
            }
            let relation = union_ids(
                sibling
                    .relation
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(record_id)),
            );
            match self.store.patch(&sibling.id, &RecordPatch::relation(relation)) {
                Ok(()) => patched += 1,
                Err(e) => warn!(sibling = %sibling.id, error = %e, "failed to link sibling back"),
            }
        }
        patched
    }
}
