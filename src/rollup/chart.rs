//! Bar chart rendering for a weekly rollup.
//!
//! Produces a self-contained SVG document: one bar per row, heights taken
//! from [`RollupRow::bar_value`] on a fixed 0-100 axis.

use crate::Result;
use crate::models::RollupRow;
use std::fmt::Write;

/// A rendered chart ready to hand to a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl Chart {
    /// Inline `data:` URI of the chart.
    pub fn data_uri(&self) -> String {
        use base64::Engine;
        format!(
            "data:{};base64,{}",
            self.content_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Turns ranked rows and a title into an image.
pub trait ChartRenderer {
    fn render(&self, rows: &[RollupRow], title: &str) -> Result<Chart>;
}

/// Vertical bar chart rendered as SVG.
#[derive(Debug, Clone, Copy)]
pub struct SvgBarChart {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgBarChart {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 560,
        }
    }
}

const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 56.0;
const MARGIN_BOTTOM: f64 = 150.0;
const BAR_FILL: &str = "#36a2eb";

impl ChartRenderer for SvgBarChart {
    fn render(&self, rows: &[RollupRow], title: &str) -> Result<Chart> {
        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let plot_w = (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let plot_h = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
        let baseline = MARGIN_TOP + plot_h;

        // fmt::Write into a String cannot fail
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(
            svg,
            r#"<rect width="100%" height="100%" fill="white"/>"#
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="32" text-anchor="middle" font-size="18" font-weight="bold">{}</text>"#,
            width / 2.0,
            escape(title)
        );

        for tick in (0..=100).step_by(20) {
            let y = baseline - plot_h * f64::from(tick) / 100.0;
            let _ = writeln!(
                svg,
                r##"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{tx}" y="{ty:.1}" text-anchor="end" font-size="12">{tick}</text>"##,
                x1 = MARGIN_LEFT,
                x2 = MARGIN_LEFT + plot_w,
                tx = MARGIN_LEFT - 8.0,
                ty = y + 4.0,
            );
        }

        if !rows.is_empty() {
            let slot = plot_w / rows.len() as f64;
            let bar_w = slot * 0.7;
            for (i, row) in rows.iter().enumerate() {
                let value = f64::from(row.bar_value());
                let bar_h = plot_h * value / 100.0;
                let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
                let center = x + bar_w / 2.0;
                let _ = writeln!(
                    svg,
                    r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_w:.1}" height="{bar_h:.1}" fill="{BAR_FILL}"><title>{name}: {value}%</title></rect>"#,
                    y = baseline - bar_h,
                    name = escape(&row.name),
                );
                let _ = writeln!(
                    svg,
                    r#"<text x="{center:.1}" y="{y:.1}" transform="rotate(-60 {center:.1} {y:.1})" text-anchor="end" font-size="11">{}</text>"#,
                    escape(&row.name),
                    y = baseline + 14.0,
                );
            }
        }

        let _ = writeln!(
            svg,
            r##"<line x1="{x1}" y1="{baseline}" x2="{x2}" y2="{baseline}" stroke="#333"/>"##,
            x1 = MARGIN_LEFT,
            x2 = MARGIN_LEFT + plot_w,
        );
        svg.push_str("</svg>\n");

        Ok(Chart {
            bytes: svg.into_bytes(),
            content_type: "image/svg+xml",
        })
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
