//! Dashboard page: chart embeds as child blocks.

use super::{NotionClient, plain_text, rich_text};
use crate::{Error, Result};
use crate::publish::DocumentSink;
use serde_json::{Value, json};
use tracing::{debug, info};

/// Headings written above each chart start with this.
const CHART_HEADING_PREFIX: &str = "Weekly Count %";

pub struct NotionDashboard {
    client: NotionClient,
    page_id: String,
}

impl NotionDashboard {
    pub fn new(client: NotionClient, page_id: impl Into<String>) -> Self {
        Self {
            client,
            page_id: page_id.into(),
        }
    }

    fn children(&self) -> Result<Vec<Value>> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut path = format!("/blocks/{}/children?page_size=100", self.page_id);
            if let Some(ref c) = cursor {
                path.push_str(&format!("&start_cursor={}", c));
            }
            let response = self.client.get(&path)?;
            if let Some(results) = response["results"].as_array() {
                blocks.extend(results.iter().cloned());
            }
            cursor = response["next_cursor"].as_str().map(str::to_string);
            if !response["has_more"].as_bool().unwrap_or(false) || cursor.is_none() {
                break;
            }
        }
        debug!(count = blocks.len(), "fetched dashboard blocks");
        Ok(blocks)
    }
}

impl DocumentSink for NotionDashboard {
    fn remove_previous(&self, public_id: &str) -> Result<usize> {
        let blocks = self.children()?;
        let stale = stale_block_ids(&blocks, public_id);
        for id in &stale {
            self.client.delete(&format!("/blocks/{}", id))?;
        }
        if !stale.is_empty() {
            info!(removed = stale.len(), public_id, "removed previous chart blocks");
        }
        Ok(stale.len())
    }

    fn embed(&self, url: &str, caption: &str) -> Result<()> {
        self.client
            .patch(
                &format!("/blocks/{}/children", self.page_id),
                &embed_body(url, caption),
            )
            .map_err(Error::into_late_timeout)?;
        Ok(())
    }
}

fn embed_body(url: &str, caption: &str) -> Value {
    json!({
        "children": [
            {
                "object": "block",
                "type": "heading_2",
                "heading_2": { "rich_text": rich_text(caption) }
            },
            {
                "object": "block",
                "type": "image",
                "image": { "type": "external", "external": { "url": url } }
            }
        ]
    })
}

fn is_chart_for(block: &Value, public_id: &str) -> bool {
    if block["type"] != "image" {
        return false;
    }
    let image = &block["image"];
    let in_url = image["external"]["url"]
        .as_str()
        .is_some_and(|u| u.contains(public_id));
    let in_caption = image["caption"].as_array().is_some_and(|parts| {
        parts
            .iter()
            .any(|p| p["plain_text"].as_str().is_some_and(|t| t.contains(public_id)))
    });
    in_url || in_caption
}

fn is_chart_heading(block: &Value) -> bool {
    block["type"] == "heading_2"
        && plain_text(&block["heading_2"]["rich_text"])
            .is_some_and(|t| t.starts_with(CHART_HEADING_PREFIX))
}

/// Ids of images showing `public_id`, each with the chart heading right above it.
fn stale_block_ids(blocks: &[Value], public_id: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if !is_chart_for(block, public_id) {
            continue;
        }
        if let Some(prev) = i.checked_sub(1).map(|j| &blocks[j]) {
            if is_chart_heading(prev) {
                if let Some(id) = prev["id"].as_str() {
                    ids.push(id.to_string());
                }
            }
        }
        if let Some(id) = block["id"].as_str() {
            ids.push(id.to_string());
        }
    }
    ids
}
