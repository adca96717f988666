use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::file::write_text;
use super::{Arguments, ParamKind, ReturnKind, Tool, ToolDescriptor};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN: f64 = 60.0;
const PALETTE: [&str; 6] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Scatter,
}

/// One named run of (x, y) points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// A chart description the model can build as plain JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: ChartKind,
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    pub series: Vec<Series>,
}

/// Serialize a figure to `path`; the extension picks the format (svg or json).
pub async fn save_plot(figure: &Figure, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content = match extension.as_str() {
        "svg" => render_svg(figure)?,
        "json" => serde_json::to_string_pretty(figure).context("failed to serialize figure")?,
        other => anyhow::bail!(
            "unsupported plot format '{}' for {} (supported: svg, json)",
            other,
            path.display()
        ),
    };

    write_text(&content, path).await
}

/// Render a figure as a standalone SVG document.
pub fn render_svg(figure: &Figure) -> Result<String> {
    let points: Vec<(f64, f64)> = figure
        .series
        .iter()
        .flat_map(|s| s.points.iter().copied())
        .collect();
    if points.is_empty() {
        anyhow::bail!("figure has no data points");
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        anyhow::bail!("figure contains non-finite values");
    }

    let (mut x_min, mut x_max) = bounds(points.iter().map(|p| p.0));
    let (mut y_min, mut y_max) = bounds(points.iter().map(|p| p.1));
    if figure.kind == ChartKind::Bar {
        y_min = y_min.min(0.0);
        y_max = y_max.max(0.0);
        // room for the outermost bars
        x_min -= 0.5;
        x_max += 0.5;
    }
    let (x_min, x_max) = widen(x_min, x_max);
    let (y_min, y_max) = widen(y_min, y_max);

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let sx = |x: f64| MARGIN + (x - x_min) / (x_max - x_min) * plot_w;
    let sy = |y: f64| HEIGHT - MARGIN - (y - y_min) / (y_max - y_min) * plot_h;

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = WIDTH,
        h = HEIGHT
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;

    // axes
    let (left, bottom) = (MARGIN, HEIGHT - MARGIN);
    writeln!(
        svg,
        r#"<line x1="{left}" y1="{bottom}" x2="{}" y2="{bottom}" stroke="black"/>"#,
        WIDTH - MARGIN
    )?;
    writeln!(
        svg,
        r#"<line x1="{left}" y1="{MARGIN}" x2="{left}" y2="{bottom}" stroke="black"/>"#
    )?;

    for (value, anchor_x) in [(x_min, sx(x_min)), (x_max, sx(x_max))] {
        writeln!(
            svg,
            r#"<text x="{anchor_x:.1}" y="{:.1}" font-size="11" text-anchor="middle">{}</text>"#,
            bottom + 16.0,
            format_tick(value)
        )?;
    }
    for (value, anchor_y) in [(y_min, sy(y_min)), (y_max, sy(y_max))] {
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{anchor_y:.1}" font-size="11" text-anchor="end">{}</text>"#,
            left - 6.0,
            format_tick(value)
        )?;
    }

    if !figure.title.is_empty() {
        writeln!(
            svg,
            r#"<text x="{:.1}" y="30" font-size="16" text-anchor="middle">{}</text>"#,
            WIDTH / 2.0,
            escape_xml(&figure.title)
        )?;
    }
    if !figure.x_label.is_empty() {
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"#,
            WIDTH / 2.0,
            HEIGHT - 15.0,
            escape_xml(&figure.x_label)
        )?;
    }
    if !figure.y_label.is_empty() {
        writeln!(
            svg,
            r#"<text x="15" y="{:.1}" font-size="12" text-anchor="middle" transform="rotate(-90 15 {:.1})">{}</text>"#,
            HEIGHT / 2.0,
            HEIGHT / 2.0,
            escape_xml(&figure.y_label)
        )?;
    }

    let series_count = figure.series.len() as f64;
    for (i, series) in figure.series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        match figure.kind {
            ChartKind::Line => {
                let coords: Vec<String> = series
                    .points
                    .iter()
                    .map(|&(x, y)| format!("{:.1},{:.1}", sx(x), sy(y)))
                    .collect();
                writeln!(
                    svg,
                    r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{}"/>"#,
                    coords.join(" ")
                )?;
            }
            ChartKind::Scatter => {
                for &(x, y) in &series.points {
                    writeln!(
                        svg,
                        r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{color}"/>"#,
                        sx(x),
                        sy(y)
                    )?;
                }
            }
            ChartKind::Bar => {
                let slot = plot_w / (x_max - x_min) * 0.8;
                let bar_w = slot / series_count;
                for &(x, y) in &series.points {
                    let x0 = sx(x) - slot / 2.0 + bar_w * i as f64;
                    let (top, base) = (sy(y.max(0.0)), sy(y.min(0.0)));
                    writeln!(
                        svg,
                        r#"<rect x="{x0:.1}" y="{top:.1}" width="{bar_w:.1}" height="{:.1}" fill="{color}"/>"#,
                        base - top
                    )?;
                }
            }
        }

        if !series.name.is_empty() {
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="11" fill="{color}">{}</text>"#,
                WIDTH - MARGIN + 5.0,
                MARGIN + 14.0 * i as f64,
                escape_xml(&series.name)
            )?;
        }
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn widen(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Tool for saving a chart to a file
pub struct SavePlotTool {
    descriptor: ToolDescriptor,
}

impl SavePlotTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                "save_plot_to_file",
                "Save a chart to a file. The format is taken from the path's extension: \
                 .svg renders the chart, .json stores the chart description.",
            )
            .param(
                "figure",
                ParamKind::Object,
                "Chart description: {\"title\": str, \"kind\": \"line\"|\"bar\"|\"scatter\", \
                 \"x_label\": str, \"y_label\": str, \"series\": [{\"name\": str, \"points\": [[x, y], ...]}]}",
            )
            .param("path", ParamKind::String, "Path to save plot")
            .returns(ReturnKind::Nothing, ""),
        }
    }
}

impl Default for SavePlotTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SavePlotTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let figure: Figure = serde_json::from_value(args.value("figure")?.clone())
            .context("figure does not match the expected chart description")?;
        save_plot(&figure, args.str("path")?).await?;
        Ok(Value::Null)
    }
}
