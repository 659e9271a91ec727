//! In-memory record store.
//!
//! Keeps records in insertion order and pages query results the same way the
//! hosted store does, so cursor handling is exercised without a network.

use super::{Filter, NewRecord, Page, Record, RecordPatch, RecordStore};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Record>,
    max_page_size: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap every page at `size` records regardless of the requested size.
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = Some(size.max(1));
        self
    }

    /// Seed a record created outside the core (e.g., a master record).
    pub fn insert(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Seed a master record and return its identity.
    pub fn insert_master(&mut self, name: &str, target: u32) -> String {
        let id = new_id();
        self.insert(Record {
            id: id.clone(),
            title: Some(name.to_string()),
            is_master: true,
            target: Some(target),
            ..Default::default()
        });
        id
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of create and patch calls served.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl RecordStore for MemoryStore {
    fn query(&self, filter: &Filter, page_size: usize, cursor: Option<&str>) -> Result<Page> {
        let offset = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| Error::InvalidInput(format!("invalid cursor: {}", c)))?,
            None => 0,
        };
        let size = self
            .max_page_size
            .map_or(page_size, |max| page_size.min(max))
            .max(1);

        let matching: Vec<&Record> = self.records.iter().filter(|r| filter.matches(r)).collect();
        let records: Vec<Record> = matching
            .iter()
            .skip(offset)
            .take(size)
            .map(|r| (*r).clone())
            .collect();
        let next = offset + records.len();
        let has_more = next < matching.len();

        Ok(Page {
            records,
            has_more,
            next_cursor: has_more.then(|| next.to_string()),
        })
    }

    fn create(&mut self, record: &NewRecord) -> Result<String> {
        let id = new_id();
        self.records.push(Record {
            id: id.clone(),
            title: Some(record.title.clone()),
            is_master: false,
            target: Some(record.target),
            done: record.done,
            task_date: Some(record.task_date),
            relation: record.relation.clone(),
            unit: Some(record.unit.clone()),
            week_start: Some(record.week_start),
        });
        self.writes += 1;
        Ok(id)
    }

    fn patch(&mut self, id: &str, patch: &RecordPatch) -> Result<()> {
        let record = self
            .get_mut(id)
            .ok_or_else(|| Error::Http {
                status: 404,
                body: format!("Could not find page with ID: {}", id),
            })?;
        if let Some(ref relation) = patch.relation {
            record.relation = relation.clone();
        }
        self.writes += 1;
        Ok(())
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Field, fetch_all};
    use chrono::NaiveDate;

    #[test]
    fn test_pages_are_capped_and_chained() {
        let mut store = MemoryStore::new().with_max_page_size(2);
        for i in 0..5 {
            store.insert_master(&format!("Habit {}", i), 1);
        }

        let first = store
            .query(&Filter::new().checkbox(Field::IsMaster, true), 100, None)
            .unwrap();
        assert_eq!(first.records.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.next_cursor.as_deref(), Some("2"));

        let all = fetch_all(&store, &Filter::new(), 100).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_create_then_patch_relation() {
        let mut store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let id = store
            .create(&NewRecord {
                title: "Dua".to_string(),
                task_date: day,
                done: false,
                target: 7,
                unit: "Times".to_string(),
                week_start: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                relation: vec!["m".to_string()],
                glyph: "🤲".to_string(),
            })
            .unwrap();

        store
            .patch(&id, &RecordPatch::relation(vec!["m".to_string(), id.clone()]))
            .unwrap();

        let record = store.get(&id).unwrap();
        assert_eq!(record.relation, vec!["m".to_string(), id.clone()]);
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn test_patch_unknown_record_fails() {
        let mut store = MemoryStore::new();
        let err = store.patch("missing", &RecordPatch::default()).unwrap_err();
        assert!(matches!(err, Error::Http { status: 404, .. }));
    }
}
