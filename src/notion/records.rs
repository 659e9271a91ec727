//! Record store over a Notion database.

use super::{NotionClient, plain_text, rich_text};
use crate::Result;
use crate::config::{NotionCredentials, PropertyNames};
use crate::store::{Field, Filter, NewRecord, Page, Predicate, Record, RecordPatch, RecordStore};
use chrono::NaiveDate;
use serde_json::{Map, Value, json};

pub struct NotionStore {
    client: NotionClient,
    database_id: String,
    props: PropertyNames,
}

impl NotionStore {
    pub fn new(credentials: &NotionCredentials, props: PropertyNames) -> Self {
        Self {
            client: NotionClient::new(&credentials.token, &credentials.notion_version),
            database_id: credentials.database_id.clone(),
            props,
        }
    }
}

impl RecordStore for NotionStore {
    fn query(&self, filter: &Filter, page_size: usize, cursor: Option<&str>) -> Result<Page> {
        let body = query_body(filter, &self.props, page_size, cursor);
        let response = self
            .client
            .post(&format!("/databases/{}/query", self.database_id), &body)?;
        Ok(page_from_response(&response, &self.props))
    }

    fn create(&mut self, record: &NewRecord) -> Result<String> {
        let body = create_body(&self.database_id, record, &self.props);
        let response = self.client.post("/pages", &body)?;
        response["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| crate::Error::Other("create response carried no page id".to_string()))
    }

    fn patch(&mut self, id: &str, patch: &RecordPatch) -> Result<()> {
        let body = patch_body(patch, &self.props);
        self.client.patch(&format!("/pages/{}", id), &body)?;
        Ok(())
    }
}

fn property_name<'a>(field: Field, props: &'a PropertyNames) -> &'a str {
    match field {
        Field::Title => &props.title,
        Field::IsMaster => &props.is_master,
        Field::Done => &props.done,
        Field::TaskDate => &props.task_date,
    }
}

fn predicate_json(predicate: &Predicate, props: &PropertyNames) -> Value {
    match predicate {
        Predicate::TitleEquals(title) => {
            json!({ "property": props.title, "title": { "equals": title } })
        }
        Predicate::CheckboxEquals(field, value) => {
            json!({ "property": property_name(*field, props), "checkbox": { "equals": value } })
        }
        Predicate::DateOnOrAfter(field, date) => json!({
            "property": property_name(*field, props),
            "date": { "on_or_after": date.to_string() }
        }),
        Predicate::DateOnOrBefore(field, date) => json!({
            "property": property_name(*field, props),
            "date": { "on_or_before": date.to_string() }
        }),
    }
}

/// A lone predicate is sent as-is; several are wrapped in `and`.
fn filter_json(filter: &Filter, props: &PropertyNames) -> Option<Value> {
    let mut parts: Vec<Value> = filter
        .predicates()
        .iter()
        .map(|p| predicate_json(p, props))
        .collect();
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(json!({ "and": parts })),
    }
}

fn query_body(
    filter: &Filter,
    props: &PropertyNames,
    page_size: usize,
    cursor: Option<&str>,
) -> Value {
    let mut body = Map::new();
    body.insert("page_size".to_string(), json!(page_size));
    if let Some(filter) = filter_json(filter, props) {
        body.insert("filter".to_string(), filter);
    }
    if let Some(cursor) = cursor {
        body.insert("start_cursor".to_string(), json!(cursor));
    }
    Value::Object(body)
}

fn page_from_response(response: &Value, props: &PropertyNames) -> Page {
    let records = response["results"]
        .as_array()
        .map(|pages| pages.iter().map(|p| record_from_page(p, props)).collect())
        .unwrap_or_default();
    Page {
        records,
        has_more: response["has_more"].as_bool().unwrap_or(false),
        next_cursor: response["next_cursor"].as_str().map(str::to_string),
    }
}

fn record_from_page(page: &Value, props: &PropertyNames) -> Record {
    let p = &page["properties"];
    Record {
        id: page["id"].as_str().unwrap_or_default().to_string(),
        title: plain_text(&p[props.title.as_str()]["title"]),
        is_master: p[props.is_master.as_str()]["checkbox"]
            .as_bool()
            .unwrap_or(false),
        target: p[props.target.as_str()]["number"]
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u32),
        done: p[props.done.as_str()]["checkbox"].as_bool().unwrap_or(false),
        task_date: date_start(&p[props.task_date.as_str()]),
        relation: p[props.relation.as_str()]["relation"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|r| r["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
        unit: plain_text(&p[props.unit.as_str()]["rich_text"]),
        week_start: date_start(&p[props.week_start.as_str()]),
    }
}

/// Calendar date of a date property's `start`, ignoring any time part.
fn date_start(property: &Value) -> Option<NaiveDate> {
    let start = property["date"]["start"].as_str()?;
    NaiveDate::parse_from_str(start.get(..10)?, "%Y-%m-%d").ok()
}

fn relation_json(ids: &[String]) -> Value {
    json!({ "relation": ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>() })
}

fn create_body(database_id: &str, record: &NewRecord, props: &PropertyNames) -> Value {
    let mut properties = Map::new();
    properties.insert(
        props.title.clone(),
        json!({ "title": [{ "text": { "content": record.title } }] }),
    );
    properties.insert(
        props.task_date.clone(),
        json!({ "date": { "start": record.task_date.to_string() } }),
    );
    properties.insert(props.done.clone(), json!({ "checkbox": record.done }));
    properties.insert(props.target.clone(), json!({ "number": record.target }));
    properties.insert(props.relation.clone(), relation_json(&record.relation));
    properties.insert(props.unit.clone(), json!({ "rich_text": rich_text(&record.unit) }));
    properties.insert(
        props.week_start.clone(),
        json!({ "date": { "start": record.week_start.to_string() } }),
    );

    let mut body = json!({
        "parent": { "database_id": database_id },
        "properties": properties,
    });
    if !record.glyph.is_empty() {
        body["icon"] = json!({ "type": "emoji", "emoji": record.glyph });
    }
    body
}

fn patch_body(patch: &RecordPatch, props: &PropertyNames) -> Value {
    let mut properties = Map::new();
    if let Some(ref ids) = patch.relation {
        properties.insert(props.relation.clone(), relation_json(ids));
    }
    json!({ "properties": properties })
}
