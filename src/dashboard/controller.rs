//! Dashboard Controller
//!
//! Owns the aggregation, the filter controls and the chart state for one
//! mounted dashboard. Filter changes re-query the aggregation and overwrite
//! the chart series.
//!
//! | Month    | Week     | Series shown                          |
//! |----------|----------|---------------------------------------|
//! | all      | (off)    | every reading, input order            |
//! | `YYYY-M` | all      | per-day totals of the month           |
//! | `YYYY-M` | `n`      | per-day totals of week `n`            |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::chart::{ChartSeries, ChartState, DEFAULT_DATASET_LABEL};
use super::filter::{FilterControls, FilterError, FilterLabels, MonthChoice, WeekChoice};
use crate::aggregate::{
    Aggregation, DisplayLocale, DAY_COMPACT_FORMAT, DAY_LABEL_FORMAT, READING_COMPACT_FORMAT,
    READING_LABEL_FORMAT,
};

/// Dashboard presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub labels: FilterLabels,
    #[serde(default = "default_dataset_label")]
    pub dataset_label: String,
}

fn default_dataset_label() -> String {
    DEFAULT_DATASET_LABEL.to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            labels: FilterLabels::default(),
            dataset_label: default_dataset_label(),
        }
    }
}

/// A mounted dashboard
#[derive(Debug, Clone)]
pub struct DashboardController {
    aggregation: Aggregation,
    config: DashboardConfig,
    controls: FilterControls,
    chart: ChartState,
}

impl DashboardController {
    /// Mount a dashboard over an aggregation
    ///
    /// Starts on the newest month with every week shown, or on the
    /// unfiltered series when there are no readings.
    pub fn mount(aggregation: Aggregation, config: DashboardConfig, width: f64) -> Self {
        let controls = FilterControls::build(&aggregation, &config.labels);
        let chart = ChartState::new(config.dataset_label.clone(), width);
        let mut controller = Self {
            aggregation,
            config,
            controls,
            chart,
        };

        let initial = controller
            .aggregation
            .latest_month()
            .map(|m| MonthChoice::Month(m.key))
            .unwrap_or(MonthChoice::All);
        if let Err(e) = controller.select_month(initial) {
            tracing::warn!(error = %e, "Initial month not selected");
        }

        tracing::debug!(
            months = controller.controls.month_options.len() - 1,
            readings = controller.aggregation.readings().len(),
            "Dashboard mounted"
        );
        controller
    }

    /// Unmount, releasing the chart and bucket map
    pub fn teardown(self) {
        tracing::debug!(revision = self.chart.revision(), "Dashboard torn down");
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn controls(&self) -> &FilterControls {
        &self.controls
    }

    pub fn chart(&self) -> &ChartState {
        &self.chart
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Handle a month select change
    ///
    /// A missing month is logged and leaves both the controls and the chart
    /// as they were.
    pub fn select_month(&mut self, choice: MonthChoice) -> Result<&ChartSeries, FilterError> {
        if let Err(e) = self
            .controls
            .set_month(choice, &self.aggregation, &self.config.labels)
        {
            tracing::error!(error = %e, "Month filter not applied");
            return Err(e);
        }

        let series = self.series_for(choice, WeekChoice::All)?;
        self.chart.replace(series);
        Ok(self.chart.series())
    }

    /// Handle a week select change
    pub fn select_week(&mut self, choice: WeekChoice) -> Result<&ChartSeries, FilterError> {
        if let Err(e) = self.controls.set_week(choice, &self.aggregation) {
            tracing::error!(error = %e, "Week filter not applied");
            return Err(e);
        }

        let series = self.series_for(self.controls.month, choice)?;
        self.chart.replace(series);
        Ok(self.chart.series())
    }

    /// Apply raw select values (`""` = all months, `""`/`"all"` = all weeks)
    ///
    /// The pair is checked as a whole, so a bad week leaves the month
    /// select and the chart untouched.
    pub fn apply_query(
        &mut self,
        month: Option<&str>,
        week: Option<&str>,
    ) -> Result<&ChartSeries, FilterError> {
        let month = MonthChoice::parse(month.unwrap_or_default())?;
        let week = WeekChoice::parse(week.unwrap_or_default())?;

        if let Err(e) = self.check_pair(month, week) {
            tracing::error!(error = %e, "Filter query not applied");
            return Err(e);
        }

        self.select_month(month)?;
        if week != WeekChoice::All {
            self.select_week(week)?;
        }
        Ok(self.chart.series())
    }

    fn check_pair(&self, month: MonthChoice, week: WeekChoice) -> Result<(), FilterError> {
        match (month, week) {
            (_, WeekChoice::All) => Ok(()),
            (MonthChoice::All, WeekChoice::Week(_)) => Err(FilterError::NoMonthSelected),
            (MonthChoice::Month(key), WeekChoice::Week(w)) => {
                let bucket = self
                    .aggregation
                    .month(key)
                    .ok_or(FilterError::MonthNotFound(key))?;
                match bucket.week(w) {
                    Some(_) => Ok(()),
                    None => Err(FilterError::WeekNotFound { month: key, week: w }),
                }
            }
        }
    }

    /// Handle a viewport resize
    pub fn resize(&mut self, width: f64) {
        self.chart.resize(width);
    }

    fn series_for(&self, month: MonthChoice, week: WeekChoice) -> Result<ChartSeries, FilterError> {
        let locale = self.aggregation.locale();
        match (month, week) {
            (MonthChoice::All, _) => Ok(readings_series(&self.aggregation)),
            (MonthChoice::Month(key), week) => {
                let bucket = self
                    .aggregation
                    .month(key)
                    .ok_or(FilterError::MonthNotFound(key))?;
                match week {
                    WeekChoice::All => Ok(day_series(&bucket.days, locale)),
                    WeekChoice::Week(w) => bucket
                        .week(w)
                        .map(|b| day_series(&b.days, locale))
                        .ok_or(FilterError::WeekNotFound { month: key, week: w }),
                }
            }
        }
    }
}

/// One point per reading, in input order
fn readings_series(aggregation: &Aggregation) -> ChartSeries {
    let locale = aggregation.locale();
    ChartSeries::from_points(aggregation.readings().iter().map(|r| {
        (
            locale.format(r.timestamp, READING_LABEL_FORMAT),
            locale.format(r.timestamp, READING_COMPACT_FORMAT),
            r.value,
        )
    }))
}

/// One point per day, chronological
fn day_series(days: &BTreeMap<NaiveDate, f64>, locale: DisplayLocale) -> ChartSeries {
    ChartSeries::from_points(days.iter().filter_map(|(day, &total)| {
        let at = day.and_hms_opt(0, 0, 0)?;
        Some((
            locale.format(at, DAY_LABEL_FORMAT),
            locale.format(at, DAY_COMPACT_FORMAT),
            total,
        ))
    }))
}
