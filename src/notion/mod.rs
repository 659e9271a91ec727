//! Notion API interactions.
//!
//! This module provides:
//! - [`NotionClient`] - authenticated JSON requests against the REST API
//! - [`NotionStore`] - the [`crate::store::RecordStore`] over a database
//! - [`NotionDashboard`] - the [`crate::publish::DocumentSink`] over a page

mod blocks;
mod records;

pub use blocks::NotionDashboard;
pub use records::NotionStore;

use crate::{Error, Result};
use serde_json::Value;

/// Notion API base URL
const NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// Blocking client; one request in flight at a time.
#[derive(Clone)]
pub struct NotionClient {
    token: String,
    notion_version: String,
    agent: ureq::Agent,
}

impl NotionClient {
    pub fn new(token: impl Into<String>, notion_version: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            notion_version: notion_version.into(),
            agent: ureq::Agent::new(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{}", NOTION_API_BASE, path))
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Notion-Version", &self.notion_version)
            .set("Content-Type", "application/json")
    }

    pub fn get(&self, path: &str) -> Result<Value> {
        into_json(self.request("GET", path).call())
    }

    pub fn post(&self, path: &str, body: &Value) -> Result<Value> {
        into_json(self.request("POST", path).send_json(body))
    }

    pub fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        into_json(self.request("PATCH", path).send_json(body))
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        into_json(self.request("DELETE", path).call()).map(|_| ())
    }
}

fn into_json(response: std::result::Result<ureq::Response, ureq::Error>) -> Result<Value> {
    match response {
        Ok(resp) => resp
            .into_json()
            .map_err(|e| Error::Other(format!("Failed to parse Notion response: {}", e))),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            Err(Error::Http { status: code, body })
        }
        Err(e) => Err(Error::Transport(e.to_string())),
    }
}

/// Text content as a rich-text array.
fn rich_text(content: &str) -> Value {
    serde_json::json!([{ "type": "text", "text": { "content": content } }])
}

/// First `plain_text` of a rich-text (or title) array.
fn plain_text(value: &Value) -> Option<String> {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item["plain_text"].as_str())
        .map(str::to_string)
}
