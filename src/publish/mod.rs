//! Publishing a rendered rollup chart.
//!
//! Two collaborators are involved:
//! - [`ImageUploader`] - image bytes in, public URL out
//! - [`DocumentSink`] - URL and caption in, embedded into the dashboard
//!
//! A timeout reported by either after the write was accepted is treated as
//! success, since re-running would publish the chart twice.

pub mod cloudinary;

use crate::Result;
use crate::rollup::chart::Chart;
use crate::week::WeekWindow;
use serde::Serialize;
use tracing::{info, warn};

/// A successfully uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

pub trait ImageUploader {
    fn upload(&self, chart: &Chart, public_id: &str) -> Result<UploadedImage>;
}

/// The document the chart gets embedded in.
pub trait DocumentSink {
    /// Remove charts previously embedded for `public_id`; returns how many.
    fn remove_previous(&self, public_id: &str) -> Result<usize>;

    /// Append `caption` followed by the image at `url`.
    fn embed(&self, url: &str, caption: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published { url: String, replaced: usize },
    /// A late timeout was reported; the chart most likely went through
    AssumedPublished { reason: String },
}

/// `Weekly Count % (<start> → <end>)`
pub fn chart_title(window: &WeekWindow) -> String {
    format!("Weekly Count % ({} → {})", window.start(), window.end())
}

/// Stable upload id for a week, so re-publishing overwrites.
pub fn public_id_for(window: &WeekWindow) -> String {
    format!("week_{}_to_{}", window.start(), window.end())
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Upload `chart`, replace older embeds for the week, and embed the new one.
///
/// Removing older embeds is best-effort. Any other failure aborts, except
/// the late-timeout class, which ends the run as [`PublishOutcome::AssumedPublished`].
pub fn publish_chart(
    uploader: &dyn ImageUploader,
    sink: &dyn DocumentSink,
    chart: &Chart,
    window: &WeekWindow,
) -> Result<PublishOutcome> {
    let public_id = public_id_for(window);
    let title = chart_title(window);

    let uploaded = match uploader.upload(chart, &public_id) {
        Ok(uploaded) => uploaded,
        Err(e) if e.is_late_timeout() => return Ok(assume_published(e)),
        Err(e) => return Err(e),
    };
    info!(url = %uploaded.url, "chart uploaded");

    let replaced = match sink.remove_previous(&public_id) {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "could not remove previous charts for this week");
            0
        }
    };

    match sink.embed(&uploaded.url, &title) {
        Ok(()) => {}
        Err(e) if e.is_late_timeout() => return Ok(assume_published(e)),
        Err(e) => return Err(e),
    }
    info!(replaced, "chart embedded on dashboard");

    Ok(PublishOutcome::Published {
        url: uploaded.url,
        replaced,
    })
}

fn assume_published(err: crate::Error) -> PublishOutcome {
    warn!(error = %err, "timeout reported after upload; chart likely succeeded, ignoring");
    PublishOutcome::AssumedPublished {
        reason: err.to_string(),
    }
}
