//! Chart rendering.
//!
//! Rendering is split in two steps:
//!
//! 1. [`render_timeline`], [`render_histogram`] and [`render_topic_frequency`]
//!    turn one aggregate view into a backend-neutral [`Chart`].
//! 2. A [`ChartWriter`] encodes the chart with a [`ChartBackend`] and saves it
//!    under its output directory.
//!
//! The bundled backend is [`VegaLiteBackend`], which writes Vega-Lite v5 JSON
//! specs that any Vega viewer can draw.
//!
//! # Example
//!
//! ```no_run
//! use chatmood::aggregate::aggregate;
//! use chatmood::render::{render_timeline, ChartWriter};
//!
//! let result = aggregate(&[], &["News".to_string()]);
//! let writer = ChartWriter::new("images");
//! let path = writer.save_chart(&render_timeline(&result.timeline), "sentiment_timeline.json")?;
//! println!("saved {}", path.display());
//! # Ok::<(), chatmood::ChatmoodError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::aggregate::{SentimentHistogram, TimelineRow, TopicFrequencyTable};
use crate::error::Result;

/// Mark type of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

/// One plotted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Category or date label on the x axis
    pub x: String,
    pub y: i64,
}

impl DataPoint {
    pub fn new(x: impl Into<String>, y: i64) -> Self {
        Self { x: x.into(), y }
    }
}

/// A renderable chart, independent of any drawing backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Legend entry for the single series
    pub series: String,
    pub color: String,
    /// Draw point markers on line charts
    pub markers: bool,
    /// Rotation of x axis labels, in degrees
    pub x_label_angle: i32,
    pub grid: bool,
    pub width: u32,
    pub height: u32,
    /// Points in display order
    pub points: Vec<DataPoint>,
}

impl Chart {
    /// Creates an empty chart with default styling.
    pub fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            series: String::new(),
            color: "steelblue".to_string(),
            markers: false,
            x_label_angle: 0,
            grid: true,
            width: 720,
            height: 360,
            points: Vec::new(),
        }
    }

    /// Builder method to set both axis labels.
    #[must_use]
    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    /// Builder method to name the series.
    #[must_use]
    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = series.into();
        self
    }

    /// Builder method to set the mark color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Builder method to enable point markers.
    #[must_use]
    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }

    /// Builder method to rotate x axis labels.
    #[must_use]
    pub fn with_x_label_angle(mut self, angle: i32) -> Self {
        self.x_label_angle = angle;
        self
    }

    /// Builder method to set the data.
    #[must_use]
    pub fn with_points(mut self, points: Vec<DataPoint>) -> Self {
        self.points = points;
        self
    }

    /// Returns `true` if there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Line chart of summed sentiment per date bucket.
pub fn render_timeline(timeline: &[TimelineRow]) -> Chart {
    let points = timeline
        .iter()
        .map(|row| DataPoint::new(row.bucket.to_string(), row.score))
        .collect();

    Chart::new(ChartKind::Line, "Timeline of Sentiment Dynamics")
        .with_axes("Date", "Cumulative Sentiment Value")
        .with_series("Sentiment Dynamics")
        .with_color("green")
        .with_markers()
        .with_x_label_angle(-45)
        .with_points(points)
}

/// Bar chart over the three sentiment categories, Negative to Positive.
pub fn render_histogram(histogram: &SentimentHistogram) -> Chart {
    let points = histogram
        .rows()
        .iter()
        .map(|(sentiment, count)| DataPoint::new(sentiment.label(), *count as i64))
        .collect();

    Chart::new(ChartKind::Bar, "Sentiment Distribution")
        .with_axes("Sentiment", "Messages")
        .with_series("Messages per sentiment")
        .with_points(points)
}

/// Bar chart over the candidate topics, in candidate order.
pub fn render_topic_frequency(topics: &TopicFrequencyTable) -> Chart {
    let points = topics
        .iter()
        .map(|(topic, count)| DataPoint::new(topic, count as i64))
        .collect();

    Chart::new(ChartKind::Bar, "Topic Frequency")
        .with_axes("Topic", "Messages")
        .with_series("Messages per topic")
        .with_color("darkorange")
        .with_points(points)
}

/// Encodes a [`Chart`] into a file format.
pub trait ChartBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Serializes the chart.
    fn encode(&self, chart: &Chart) -> Result<Vec<u8>>;
}

/// Writes Vega-Lite v5 JSON specs.
#[derive(Debug, Clone, Copy, Default)]
pub struct VegaLiteBackend;

impl VegaLiteBackend {
    pub const SCHEMA: &'static str = "https://vega.github.io/schema/vega-lite/v5.json";

    /// Builds the spec as a JSON value.
    pub fn spec(chart: &Chart) -> Value {
        let mark = match chart.kind {
            ChartKind::Line => json!({
                "type": "line",
                "point": chart.markers,
                "color": chart.color,
            }),
            ChartKind::Bar => json!({
                "type": "bar",
                "color": chart.color,
            }),
        };

        json!({
            "$schema": Self::SCHEMA,
            "title": chart.title,
            "description": chart.series,
            "width": chart.width,
            "height": chart.height,
            "data": { "values": chart.points },
            "mark": mark,
            "encoding": {
                "x": {
                    "field": "x",
                    "type": "ordinal",
                    "sort": null,
                    "title": chart.x_label,
                    "axis": { "labelAngle": chart.x_label_angle, "grid": chart.grid },
                },
                "y": {
                    "field": "y",
                    "type": "quantitative",
                    "title": chart.y_label,
                    "axis": { "grid": chart.grid },
                },
            },
        })
    }
}

impl ChartBackend for VegaLiteBackend {
    fn name(&self) -> &'static str {
        "vega-lite"
    }

    fn encode(&self, chart: &Chart) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&Self::spec(chart))?)
    }
}

/// Saves charts into a fixed output directory.
pub struct ChartWriter<B: ChartBackend = VegaLiteBackend> {
    dir: PathBuf,
    backend: B,
}

impl ChartWriter<VegaLiteBackend> {
    /// Creates a writer using the Vega-Lite backend.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_backend(dir, VegaLiteBackend)
    }
}

impl<B: ChartBackend> ChartWriter<B> {
    pub fn with_backend(dir: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            dir: dir.into(),
            backend,
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encodes `chart` and writes it to `<dir>/<filename>`.
    ///
    /// The directory is created if missing and an existing file is replaced.
    /// Returns the written path.
    pub fn save_chart(&self, chart: &Chart, filename: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        let bytes = self.backend.encode(chart)?;
        fs::write(&path, bytes)?;

        tracing::info!(
            path = %path.display(),
            backend = self.backend.name(),
            points = chart.points.len(),
            "Chart saved"
        );
        Ok(path)
    }
}

impl<B: ChartBackend> std::fmt::Debug for ChartWriter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartWriter")
            .field("dir", &self.dir)
            .field("backend", &self.backend.name())
            .finish()
    }
}
