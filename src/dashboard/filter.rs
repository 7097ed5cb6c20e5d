//! Month / week filter controls
//!
//! Two dependent selects: the month list is fixed once built, the week list
//! is repopulated whenever the month changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{Aggregation, MonthKey};

/// Select value meaning "every week of the month"
pub const ALL_WEEKS_VALUE: &str = "all";

/// Filter errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Month data not found: {0}")]
    MonthNotFound(MonthKey),

    #[error("Week data not found: week {week} of {month}")]
    WeekNotFound { month: MonthKey, week: u8 },

    #[error("No month selected")]
    NoMonthSelected,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

/// Month select state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthChoice {
    All,
    Month(MonthKey),
}

impl MonthChoice {
    /// Parse a select value: empty means all months
    pub fn parse(value: &str) -> Result<Self, FilterError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(MonthChoice::All);
        }
        value
            .parse()
            .map(MonthChoice::Month)
            .map_err(|_| FilterError::InvalidSelection(value.to_string()))
    }

    /// Select value for this choice
    pub fn value(&self) -> String {
        match self {
            MonthChoice::All => String::new(),
            MonthChoice::Month(key) => key.to_string(),
        }
    }
}

/// Week select state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekChoice {
    All,
    Week(u8),
}

impl WeekChoice {
    /// Parse a select value: empty or `all` means all weeks
    pub fn parse(value: &str) -> Result<Self, FilterError> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(ALL_WEEKS_VALUE) {
            return Ok(WeekChoice::All);
        }
        match value.parse::<u8>() {
            Ok(week) if (1..=5).contains(&week) => Ok(WeekChoice::Week(week)),
            _ => Err(FilterError::InvalidSelection(value.to_string())),
        }
    }

    pub fn value(&self) -> String {
        match self {
            WeekChoice::All => ALL_WEEKS_VALUE.to_string(),
            WeekChoice::Week(week) => week.to_string(),
        }
    }
}

/// One `<option>` of a select
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Texts shown on the filter controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterLabels {
    #[serde(default = "default_all_months")]
    pub all_months: String,
    #[serde(default = "default_all_weeks")]
    pub all_weeks: String,
    /// Prefix for the week options (`Minggu 2`)
    #[serde(default = "default_week")]
    pub week: String,
    #[serde(default = "default_month_caption")]
    pub month_caption: String,
    #[serde(default = "default_week_caption")]
    pub week_caption: String,
}

fn default_all_months() -> String {
    "Semua Data".to_string()
}

fn default_all_weeks() -> String {
    "Semua Minggu".to_string()
}

fn default_week() -> String {
    "Minggu".to_string()
}

fn default_month_caption() -> String {
    "Bulan:".to_string()
}

fn default_week_caption() -> String {
    "Minggu:".to_string()
}

impl Default for FilterLabels {
    fn default() -> Self {
        Self {
            all_months: default_all_months(),
            all_weeks: default_all_weeks(),
            week: default_week(),
            month_caption: default_month_caption(),
            week_caption: default_week_caption(),
        }
    }
}

/// State of both selects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterControls {
    pub month_options: Vec<SelectOption>,
    pub week_options: Vec<SelectOption>,
    pub week_enabled: bool,
    pub month: MonthChoice,
    pub week: WeekChoice,
}

impl FilterControls {
    /// Build the controls: "all" first, then months newest first; the week
    /// select starts disabled
    pub fn build(aggregation: &Aggregation, labels: &FilterLabels) -> Self {
        let mut month_options = vec![SelectOption::new("", labels.all_months.as_str())];
        month_options.extend(
            aggregation
                .month_keys_newest_first()
                .into_iter()
                .filter_map(|key| aggregation.month(key))
                .map(|bucket| SelectOption::new(bucket.key.to_string(), bucket.name.as_str())),
        );

        Self {
            month_options,
            week_options: Vec::new(),
            week_enabled: false,
            month: MonthChoice::All,
            week: WeekChoice::All,
        }
    }

    /// Change the month; repopulates the week options and resets the week
    /// to "all". A missing month leaves the controls untouched.
    pub fn set_month(
        &mut self,
        choice: MonthChoice,
        aggregation: &Aggregation,
        labels: &FilterLabels,
    ) -> Result<(), FilterError> {
        match choice {
            MonthChoice::All => {
                self.week_options.clear();
                self.week_enabled = false;
            }
            MonthChoice::Month(key) => {
                let bucket = aggregation
                    .month(key)
                    .ok_or(FilterError::MonthNotFound(key))?;

                let mut options = vec![SelectOption::new(ALL_WEEKS_VALUE, labels.all_weeks.as_str())];
                options.extend(bucket.week_keys().into_iter().map(|week| {
                    SelectOption::new(week.to_string(), format!("{} {}", labels.week, week))
                }));
                self.week_options = options;
                self.week_enabled = true;
            }
        }

        self.month = choice;
        self.week = WeekChoice::All;
        Ok(())
    }

    /// Change the week within the selected month
    pub fn set_week(&mut self, choice: WeekChoice, aggregation: &Aggregation) -> Result<(), FilterError> {
        match (self.month, choice) {
            (_, WeekChoice::All) => {}
            (MonthChoice::All, WeekChoice::Week(_)) => return Err(FilterError::NoMonthSelected),
            (MonthChoice::Month(key), WeekChoice::Week(week)) => {
                let bucket = aggregation
                    .month(key)
                    .ok_or(FilterError::MonthNotFound(key))?;
                if bucket.week(week).is_none() {
                    return Err(FilterError::WeekNotFound { month: key, week });
                }
            }
        }

        self.week = choice;
        Ok(())
    }
}
