//! Data models for Habitual.
//!
//! This module defines the core data structures:
//! - `HabitDefinition` - A recurring habit from the configured catalog
//! - `HabitCatalog` - The read-only, name-unique list of habits
//! - `RollupRow` - One derived actual-vs-target line of a weekly rollup

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A recurring habit as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDefinition {
    /// Human key, unique within the catalog
    pub name: String,

    /// Completions expected per week
    pub target: u32,

    /// Presentation glyph (used as the record icon)
    pub glyph: String,

    /// Unit label (e.g., "Times", "Hours")
    pub unit: String,
}

impl HabitDefinition {
    pub fn new(
        name: impl Into<String>,
        target: u32,
        glyph: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            glyph: glyph.into(),
            unit: unit.into(),
        }
    }
}

/// The static habit catalog, processed in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HabitCatalog {
    habits: Vec<HabitDefinition>,
}

impl HabitCatalog {
    /// Build a catalog, rejecting duplicate or empty names.
    pub fn new(habits: Vec<HabitDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for habit in &habits {
            if habit.name.trim().is_empty() {
                return Err(Error::InvalidInput("habit name must not be empty".to_string()));
            }
            if !seen.insert(habit.name.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate habit name in catalog: {}",
                    habit.name
                )));
            }
        }
        Ok(Self { habits })
    }

    pub fn iter(&self) -> impl Iterator<Item = &HabitDefinition> {
        self.habits.iter()
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }
}

/// One line of a weekly rollup.
///
/// `percent` is unclamped; use [`RollupRow::bar_value`] for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupRow {
    pub name: String,
    pub target: u32,
    pub count: u32,
    pub percent: f64,
}

impl RollupRow {
    pub fn new(name: impl Into<String>, target: u32, count: u32) -> Self {
        let percent = if target > 0 {
            f64::from(count) / f64::from(target) * 100.0
        } else {
            0.0
        };
        Self {
            name: name.into(),
            target,
            count,
            percent,
        }
    }

    /// Rounded percent clamped to 0-100, as drawn in the chart.
    pub fn bar_value(&self) -> u32 {
        self.percent.round().clamp(0.0, 100.0) as u32
    }
}
