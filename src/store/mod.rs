//! Record store abstraction.
//!
//! The habit database lives in an external tabular store. This module defines
//! the narrow contract the core needs from it:
//! - `query` - one page of records matching a [`Filter`], continued by cursor
//! - `create` - insert a record, returning its new identity
//! - `patch` - update attributes of an existing record
//!
//! Implementations:
//! - [`memory::MemoryStore`] - In-process store used by tests
//! - [`crate::notion::NotionStore`] - Hosted database over HTTP

pub mod memory;
pub mod paged;

pub use paged::{DEFAULT_PAGE_SIZE, fetch_all};

use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Logical record attributes. Stores map these onto their own property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    IsMaster,
    Done,
    TaskDate,
}

/// A single equality or range condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    TitleEquals(String),
    CheckboxEquals(Field, bool),
    DateOnOrAfter(Field, NaiveDate),
    DateOnOrBefore(Field, NaiveDate),
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::TitleEquals(title) => record.title.as_deref() == Some(title.as_str()),
            Predicate::CheckboxEquals(field, value) => record.checkbox(*field) == Some(*value),
            Predicate::DateOnOrAfter(field, date) => {
                record.date(*field).is_some_and(|d| d >= *date)
            }
            Predicate::DateOnOrBefore(field, date) => {
                record.date(*field).is_some_and(|d| d <= *date)
            }
        }
    }
}

/// Conjunction of predicates. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title_equals(mut self, title: impl Into<String>) -> Self {
        self.predicates.push(Predicate::TitleEquals(title.into()));
        self
    }

    pub fn checkbox(mut self, field: Field, value: bool) -> Self {
        self.predicates.push(Predicate::CheckboxEquals(field, value));
        self
    }

    /// Both bounds inclusive.
    pub fn date_between(mut self, field: Field, from: NaiveDate, to: NaiveDate) -> Self {
        self.predicates.push(Predicate::DateOnOrAfter(field, from));
        self.predicates.push(Predicate::DateOnOrBefore(field, to));
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

/// A record as read back from the store.
///
/// Attributes the store did not return are `None` or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    pub title: Option<String>,
    pub is_master: bool,
    pub target: Option<u32>,
    pub done: bool,
    pub task_date: Option<NaiveDate>,
    pub relation: Vec<String>,
    pub unit: Option<String>,
    pub week_start: Option<NaiveDate>,
}

impl Record {
    /// Title used for grouping; untitled records group under "Untitled".
    pub fn name(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    fn checkbox(&self, field: Field) -> Option<bool> {
        match field {
            Field::IsMaster => Some(self.is_master),
            Field::Done => Some(self.done),
            _ => None,
        }
    }

    fn date(&self, field: Field) -> Option<NaiveDate> {
        match field {
            Field::TaskDate => self.task_date,
            _ => None,
        }
    }
}

/// Attributes of a daily record to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub title: String,
    pub task_date: NaiveDate,
    pub done: bool,
    pub target: u32,
    pub unit: String,
    pub week_start: NaiveDate,
    pub relation: Vec<String>,
    pub glyph: String,
}

/// Attributes to overwrite on an existing record. `None` leaves a value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub relation: Option<Vec<String>>,
}

impl RecordPatch {
    pub fn relation(ids: Vec<String>) -> Self {
        Self {
            relation: Some(ids),
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<Record>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Trait for the external store that holds master and daily records.
///
/// Calls are blocking and issued one at a time. Errors are returned as-is
/// and never retried by callers in this crate.
pub trait RecordStore {
    /// Fetch one page of records matching `filter`, continuing from `cursor`.
    fn query(&self, filter: &Filter, page_size: usize, cursor: Option<&str>) -> Result<Page>;

    /// Create a record in the configured parent database, returning its identity.
    fn create(&mut self, record: &NewRecord) -> Result<String>;

    /// Overwrite attributes of the record with `id`.
    fn patch(&mut self, id: &str, patch: &RecordPatch) -> Result<()>;
}

/// Order-preserving union of identity lists.
pub fn union_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
