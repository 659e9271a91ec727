//! KDL schema for config.kdl.
//!
//! This module provides:
//! - Rust structs representing the KDL schema
//! - Parsing from KDL with validation
//! - The embedded default habit catalog
//!
//! # KDL Schema
//!
//! ```kdl
//! store {
//!     database-id "0123456789abcdef0123456789abcdef"
//!     page-size 100
//!     notion-version "2022-06-28"
//! }
//! properties {
//!     title "Task"
//!     is-master "Is Master"
//!     done "Done"
//! }
//! dashboard {
//!     page-id "fedcba9876543210fedcba9876543210"
//! }
//! publisher {
//!     cloud-name "my-cloud"
//!     folder "notion-charts"
//!     signature-algorithm "sha1"  // or "sha256"
//! }
//! daily {
//!     on-existing "duplicate"  // or "reuse"
//!     link-mode "one-way"      // or "clique"
//! }
//! logging {
//!     dir "~/.local/state/habitual"
//! }
//! habit "Teeth Brush" {
//!     target 7
//!     glyph "🪥"
//!     unit "Times"
//! }
//! ```
//!
//! Secrets (API tokens and keys) are never read from this file.

use crate::daily::{ExistingPolicy, LinkMode};
use crate::models::HabitDefinition;
use crate::publish::cloudinary::SignatureAlgorithm;
use crate::{Error, Result};
use kdl::{KdlDocument, KdlNode};
use std::path::{Path, PathBuf};

/// Habit catalog compiled into the binary.
pub const DEFAULT_HABITS_KDL: &str = include_str!("default_habits.kdl");

/// Property names of the record database.
///
/// Defaults match the database layout the tool was built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    pub title: String,
    pub is_master: String,
    pub target: String,
    pub done: String,
    pub task_date: String,
    pub relation: String,
    pub unit: String,
    pub week_start: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Task".to_string(),
            is_master: "Is Master".to_string(),
            target: "Target".to_string(),
            done: "Done".to_string(),
            task_date: "Task Date".to_string(),
            relation: "Relation".to_string(),
            unit: "Unit".to_string(),
            week_start: "Week Start".to_string(),
        }
    }
}

/// Values read from config.kdl. `None` means "not set in the file".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitualConfig {
    pub database_id: Option<String>,
    pub page_size: Option<usize>,
    pub notion_version: Option<String>,
    pub properties: PropertyNames,
    pub dashboard_page_id: Option<String>,
    pub cloud_name: Option<String>,
    pub cloud_folder: Option<String>,
    pub signature_algorithm: Option<SignatureAlgorithm>,
    pub on_existing: Option<ExistingPolicy>,
    pub link_mode: Option<LinkMode>,
    pub log_dir: Option<PathBuf>,
    pub habits: Vec<HabitDefinition>,
}

impl HabitualConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes are ignored. Invalid values for known nodes are errors.
    pub fn from_kdl(doc: &KdlDocument) -> Result<Self> {
        let mut config = Self::new();

        for node in doc.nodes() {
            match node.name().value() {
                "store" => {
                    for child in children(node) {
                        match child.name().value() {
                            "database-id" => config.database_id = get_string_arg(child),
                            "page-size" => {
                                let size = get_int_arg(child, "page-size")?;
                                if !(1..=100).contains(&size) {
                                    return Err(Error::Config(format!(
                                        "page-size must be 1-100, got {}",
                                        size
                                    )));
                                }
                                config.page_size = Some(size as usize);
                            }
                            "notion-version" => config.notion_version = get_string_arg(child),
                            _ => {}
                        }
                    }
                }
                "properties" => parse_properties(node, &mut config.properties),
                "dashboard" => {
                    for child in children(node) {
                        if child.name().value() == "page-id" {
                            config.dashboard_page_id = get_string_arg(child);
                        }
                    }
                }
                "publisher" => {
                    for child in children(node) {
                        match child.name().value() {
                            "cloud-name" => config.cloud_name = get_string_arg(child),
                            "folder" => config.cloud_folder = get_string_arg(child),
                            "signature-algorithm" => {
                                if let Some(s) = get_string_arg(child) {
                                    config.signature_algorithm = Some(s.parse()?);
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "daily" => {
                    for child in children(node) {
                        match child.name().value() {
                            "on-existing" => {
                                if let Some(s) = get_string_arg(child) {
                                    config.on_existing = Some(s.parse()?);
                                }
                            }
                            "link-mode" => {
                                if let Some(s) = get_string_arg(child) {
                                    config.link_mode = Some(s.parse()?);
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "logging" => {
                    for child in children(node) {
                        if child.name().value() == "dir" {
                            config.log_dir = get_string_arg(child).map(|s| expand_home(Path::new(&s)));
                        }
                    }
                }
                "habit" => config.habits.push(parse_habit_node(node)?),
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        Ok(config)
    }

    /// Load config from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let doc = parse_document(&content, &path.display().to_string())?;
        Self::from_kdl(&doc)
    }
}

/// Parse the embedded default habit catalog.
pub fn default_habits() -> Result<Vec<HabitDefinition>> {
    let doc = parse_document(DEFAULT_HABITS_KDL, "embedded default_habits.kdl")?;
    Ok(HabitualConfig::from_kdl(&doc)?.habits)
}

fn parse_document(content: &str, origin: &str) -> Result<KdlDocument> {
    content
        .parse()
        .map_err(|e| Error::Config(format!("Failed to parse KDL in {}: {}", origin, e)))
}

fn parse_properties(node: &KdlNode, props: &mut PropertyNames) {
    for child in children(node) {
        let Some(value) = get_string_arg(child) else {
            continue;
        };
        match child.name().value() {
            "title" => props.title = value,
            "is-master" => props.is_master = value,
            "target" => props.target = value,
            "done" => props.done = value,
            "task-date" => props.task_date = value,
            "relation" => props.relation = value,
            "unit" => props.unit = value,
            "week-start" => props.week_start = value,
            _ => {}
        }
    }
}

/// Parse a single `habit "name" { ... }` node.
fn parse_habit_node(node: &KdlNode) -> Result<HabitDefinition> {
    let name = get_string_arg(node)
        .ok_or_else(|| Error::Config("habit node must have a name argument".to_string()))?;

    let mut habit = HabitDefinition::new(name, 0, "", "");
    for child in children(node) {
        match child.name().value() {
            "target" => {
                let target = get_int_arg(child, "target")?;
                habit.target = u32::try_from(target).map_err(|_| {
                    Error::Config(format!(
                        "habit \"{}\": target must be a non-negative integer, got {}",
                        habit.name, target
                    ))
                })?;
            }
            "glyph" => habit.glyph = get_string_arg(child).unwrap_or_default(),
            "unit" => habit.unit = get_string_arg(child).unwrap_or_default(),
            _ => {}
        }
    }
    Ok(habit)
}

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes().iter())
}

/// Get a string argument from a node's first entry.
fn get_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Get a required integer argument from a node's first entry.
fn get_int_arg(node: &KdlNode, key: &str) -> Result<i128> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_integer())
        .ok_or_else(|| Error::Config(format!("{} must be an integer", key)))
}

/// Expand ~ in path to home directory.
pub(crate) fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
