//! Command implementations for Habitual CLI.
//!
//! This module contains the business logic for each CLI command:
//! - `week` - resolve a week selection
//! - `rollup` - weekly completion rollup, chart, publish
//! - `daily` - create and link today's records
//! - `catalog` - list the habit catalog

use crate::config::{ResolvedSettings, ValueSource};
use crate::daily::{DailyOptions, DailyRecordCreator, DailyReport, ExistingPolicy, LinkMode};
use crate::models::{HabitDefinition, RollupRow};
use crate::notion::{NotionClient, NotionDashboard, NotionStore};
use crate::publish::cloudinary::CloudinaryUploader;
use crate::publish::{DocumentSink, ImageUploader, PublishOutcome, chart_title, publish_chart};
use crate::rollup::chart::{ChartRenderer, SvgBarChart};
use crate::rollup::run_rollup;
use crate::store::RecordStore;
use crate::week::{WeekSelector, WeekWindow};
use crate::Result;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_of<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

// ----------------------------------------------------------------------------
// week
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct WeekResult {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
    pub iso_year: i32,
    pub iso_week: u32,
}

impl CommandResult for WeekResult {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        format!(
            "{}\n  {} → {} (ISO {}-W{:02})",
            self.label, self.start, self.end, self.iso_year, self.iso_week
        )
    }
}

/// Resolve `selector` to its Monday-start window.
pub fn week(selector: WeekSelector, today: NaiveDate) -> Result<WeekResult> {
    let window = selector.resolve(today)?;
    let iso = window.start().iso_week();
    Ok(WeekResult {
        start: window.start(),
        end: window.end(),
        label: window.label(),
        iso_year: iso.year(),
        iso_week: iso.week(),
    })
}

// ----------------------------------------------------------------------------
// rollup
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RollupOptions {
    /// Compute rows only; nothing is rendered or published
    pub dry_run: bool,
    /// Also write the rendered chart here
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct RollupResult {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub label: String,
    pub rows: Vec<RollupRow>,
    pub unmatched: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishOutcome>,
}

impl CommandResult for RollupResult {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Weekly rollup: {}", self.label)];
        if self.label != format!("{} → {}", self.week_start, self.week_end) {
            lines.push(format!("  {} → {}", self.week_start, self.week_end));
        }
        if self.rows.is_empty() {
            lines.push("  (no habits)".to_string());
        }
        let width = self.rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
        for row in &self.rows {
            lines.push(format!(
                "  {:<width$}  {:>3}/{:<3} {:>6.1}%",
                row.name,
                row.count,
                row.target,
                row.percent,
                width = width
            ));
        }
        if !self.unmatched.is_empty() {
            lines.push(format!(
                "Completions without a master: {}",
                self.unmatched.join(", ")
            ));
        }
        if let Some(ref path) = self.chart_file {
            lines.push(format!("Chart written to {}", path.display()));
        }
        match self.publish {
            Some(PublishOutcome::Published { ref url, replaced }) => {
                lines.push(format!("Published {} (replaced {} block(s))", url, replaced));
            }
            Some(PublishOutcome::AssumedPublished { ref reason }) => {
                lines.push(format!("Publish timed out late, assuming success: {}", reason));
            }
            None => {}
        }
        lines.join("\n")
    }
}

/// Compute the rollup for `selector` against the configured store and,
/// unless `dry_run`, render and publish its chart.
pub fn rollup(
    settings: &ResolvedSettings,
    selector: WeekSelector,
    today: NaiveDate,
    options: &RollupOptions,
) -> Result<RollupResult> {
    let window = selector.resolve(today)?;
    let credentials = settings.notion_credentials()?;
    let store = NotionStore::new(&credentials, settings.properties.clone());

    if options.dry_run {
        return rollup_with(&store, &window, settings.page_size(), options, None);
    }

    let uploader = CloudinaryUploader::new(settings.cloudinary()?);
    let dashboard = NotionDashboard::new(
        NotionClient::new(&credentials.token, &credentials.notion_version),
        settings.dashboard_page_id()?,
    );
    let publisher: (&dyn ImageUploader, &dyn DocumentSink) = (&uploader, &dashboard);
    rollup_with(&store, &window, settings.page_size(), options, Some(publisher))
}

/// Rollup over any store, with an optional publisher pair.
pub fn rollup_with<S: RecordStore + ?Sized>(
    store: &S,
    window: &WeekWindow,
    page_size: usize,
    options: &RollupOptions,
    publisher: Option<(&dyn ImageUploader, &dyn DocumentSink)>,
) -> Result<RollupResult> {
    let rollup = run_rollup(store, window, page_size)?;

    let publisher = if options.dry_run { None } else { publisher };
    let needs_chart = publisher.is_some() || options.output.is_some();

    let mut chart_file = None;
    let mut publish = None;
    if needs_chart {
        let chart = SvgBarChart::default().render(&rollup.rows, &chart_title(window))?;
        if let Some(ref path) = options.output {
            write_chart(path, &chart.bytes)?;
            chart_file = Some(path.clone());
        }
        if let Some((uploader, sink)) = publisher {
            publish = Some(publish_chart(uploader, sink, &chart, window)?);
        }
    }

    Ok(RollupResult {
        week_start: window.start(),
        week_end: window.end(),
        label: window.label(),
        rows: rollup.rows,
        unmatched: rollup.unmatched,
        chart_file,
        publish,
    })
}

fn write_chart(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), "chart written");
    Ok(())
}

// ----------------------------------------------------------------------------
// daily
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DailyResult {
    #[serde(flatten)]
    pub report: DailyReport,
    pub on_existing: ExistingPolicy,
    pub link_mode: LinkMode,
}

impl CommandResult for DailyResult {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let report = &self.report;
        let mut lines = vec![format!(
            "Daily records for {} (week from {}): {} linked, {} failed",
            report.date,
            report.week_start,
            report.linked.len(),
            report.failed.len()
        )];
        for outcome in &report.linked {
            let verb = if outcome.reused { "relinked" } else { "created" };
            lines.push(format!(
                "  {} {} ({} relations)",
                verb,
                outcome.habit,
                outcome.relation.len()
            ));
        }
        for failure in &report.failed {
            lines.push(format!("  FAILED {}: {}", failure.habit, failure.error));
        }
        lines.join("\n")
    }
}

/// Overrides for the configured daily options.
#[derive(Debug, Clone, Default)]
pub struct DailyOverrides {
    pub reuse_existing: bool,
    pub link_mode: Option<String>,
}

/// Apply CLI overrides on top of the configured options.
pub fn daily_options(settings: &ResolvedSettings, overrides: &DailyOverrides) -> Result<DailyOptions> {
    let mut options = settings.daily_options();
    if overrides.reuse_existing {
        options.on_existing = ExistingPolicy::Reuse;
    }
    if let Some(ref mode) = overrides.link_mode {
        options.link_mode = mode.parse()?;
    }
    Ok(options)
}

/// Create and link today's record for every habit in the catalog.
///
/// Only setup problems are errors; per-habit failures land in the report.
pub fn daily(
    settings: &ResolvedSettings,
    today: NaiveDate,
    options: DailyOptions,
) -> Result<DailyResult> {
    let credentials = settings.notion_credentials()?;
    let mut store = NotionStore::new(&credentials, settings.properties.clone());

    let report = DailyRecordCreator::new(&mut store, options).run(settings.catalog(), today);
    Ok(DailyResult {
        report,
        on_existing: options.on_existing,
        link_mode: options.link_mode,
    })
}

// ----------------------------------------------------------------------------
// catalog
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CatalogResult {
    pub source: String,
    pub count: usize,
    pub habits: Vec<HabitDefinition>,
}

impl CommandResult for CatalogResult {
    fn to_json(&self) -> String {
        json_of(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} habit(s) from {}", self.count, self.source)];
        for habit in &self.habits {
            lines.push(format!(
                "  {} {} - {} {}",
                habit.glyph, habit.name, habit.target, habit.unit
            ));
        }
        lines.join("\n")
    }
}

pub fn catalog(settings: &ResolvedSettings) -> CatalogResult {
    let source = match settings.catalog.source {
        ValueSource::Default => "built-in catalog".to_string(),
        ref other => other.to_string(),
    };
    let habits: Vec<HabitDefinition> = settings.catalog().iter().cloned().collect();
    CatalogResult {
        source,
        count: habits.len(),
        habits,
    }
}
