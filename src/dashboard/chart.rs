//! Chart State
//!
//! The series a chart currently displays plus the viewport-derived sizing.
//! Drawing itself belongs to the front end; this type is what it draws.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Viewport width (logical px) below which the compact layout is used
pub const BREAKPOINT_PX: f64 = 640.0;

/// Default dataset label
pub const DEFAULT_DATASET_LABEL: &str = "Daya (kWh)";

/// Chart update errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Label/value length mismatch: {labels} labels but {values} values")]
    LengthMismatch { labels: usize, values: usize },
}

/// Legend placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
}

/// Sizing derived from the viewport width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakpointConfig {
    /// Maximum number of x-axis labels drawn
    pub max_ticks: usize,
    pub tick_font_size: u32,
    pub axis_title_font_size: u32,
    pub legend_font_size: u32,
    pub legend_position: LegendPosition,
    pub legend_box_width: u32,
    pub point_radius: f64,
    /// Maximum x label rotation in degrees
    pub max_rotation: u32,
    /// Use the short label variant
    pub compact_labels: bool,
}

/// Compute chart sizing for a viewport width
pub fn breakpoint_config(width: f64) -> BreakpointConfig {
    if width < BREAKPOINT_PX {
        BreakpointConfig {
            max_ticks: 4,
            tick_font_size: 8,
            axis_title_font_size: 12,
            legend_font_size: 10,
            legend_position: LegendPosition::Bottom,
            legend_box_width: 12,
            point_radius: 2.0,
            max_rotation: 45,
            compact_labels: true,
        }
    } else {
        BreakpointConfig {
            max_ticks: 7,
            tick_font_size: 10,
            axis_title_font_size: 14,
            legend_font_size: 12,
            legend_position: LegendPosition::Top,
            legend_box_width: 40,
            point_radius: 4.0,
            max_rotation: 30,
            compact_labels: false,
        }
    }
}

/// Labels and values of equal length
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    /// Short labels for narrow viewports, same length as `labels`
    pub compact_labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    /// Build a series, using the labels as their own compact variant
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Result<Self, ChartError> {
        if labels.len() != values.len() {
            return Err(ChartError::LengthMismatch {
                labels: labels.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            compact_labels: labels.clone(),
            labels,
            values,
        })
    }

    /// Build a series from `(label, compact_label, value)` points
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (String, String, f64)>,
    {
        let mut series = Self::default();
        for (label, compact, value) in points {
            series.labels.push(label);
            series.compact_labels.push(compact);
            series.values.push(value);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// `(min, max)` of the values, `None` when empty
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// What the chart is showing right now
///
/// Every update replaces the series wholesale; concurrent updates resolve
/// as last write wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartState {
    dataset_label: String,
    series: ChartSeries,
    config: BreakpointConfig,
    revision: u64,
}

impl ChartState {
    pub fn new(dataset_label: impl Into<String>, width: f64) -> Self {
        Self {
            dataset_label: dataset_label.into(),
            series: ChartSeries::default(),
            config: breakpoint_config(width),
            revision: 0,
        }
    }

    /// Replace the displayed labels and values, then redraw
    pub fn update(&mut self, labels: Vec<String>, values: Vec<f64>) -> Result<(), ChartError> {
        let series = ChartSeries::new(labels, values)?;
        self.replace(series);
        Ok(())
    }

    /// Replace the displayed series, then redraw
    pub fn replace(&mut self, series: ChartSeries) {
        self.series = series;
        self.redraw();
    }

    /// Recompute sizing for a new viewport width, then redraw
    pub fn resize(&mut self, width: f64) {
        self.config = breakpoint_config(width);
        self.redraw();
    }

    fn redraw(&mut self) {
        self.revision += 1;
        tracing::trace!(
            revision = self.revision,
            points = self.series.len(),
            "Chart redraw"
        );
    }

    pub fn dataset_label(&self) -> &str {
        &self.dataset_label
    }

    pub fn series(&self) -> &ChartSeries {
        &self.series
    }

    pub fn config(&self) -> &BreakpointConfig {
        &self.config
    }

    /// Number of redraws so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Labels matching the current breakpoint
    pub fn display_labels(&self) -> &[String] {
        if self.config.compact_labels {
            &self.series.compact_labels
        } else {
            &self.series.labels
        }
    }

    /// Indices of the x labels to draw, evenly skipped to at most
    /// `max_ticks`, always keeping the first and last
    pub fn tick_indices(&self) -> Vec<usize> {
        let n = self.series.len();
        let max_ticks = self.config.max_ticks;
        if n <= max_ticks {
            return (0..n).collect();
        }
        if max_ticks < 2 {
            return vec![0];
        }

        let step = (n - 1).div_ceil(max_ticks - 1);
        let mut indices: Vec<usize> = (0..n - 1).step_by(step).collect();
        indices.push(n - 1);
        indices
    }
}
