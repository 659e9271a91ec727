//! Cursor walking over a [`RecordStore`] query.

use super::{Filter, Record, RecordStore};
use crate::Result;
use tracing::debug;

/// Page size requested when the configuration does not say otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Drain every page of `filter` into one vector.
///
/// Pages are requested sequentially since each cursor is only known from the
/// previous response. Stops when the store reports no more pages or hands
/// back no cursor. The first store error aborts the walk and is returned
/// unchanged.
pub fn fetch_all<S: RecordStore + ?Sized>(
    store: &S,
    filter: &Filter,
    page_size: usize,
) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store.query(filter, page_size, cursor.as_deref())?;
        pages += 1;
        records.extend(page.records);

        match page.next_cursor {
            Some(next) if page.has_more => cursor = Some(next),
            _ => break,
        }
    }

    debug!(pages, records = records.len(), "query drained");
    Ok(records)
}
