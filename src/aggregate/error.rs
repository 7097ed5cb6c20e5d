//! Aggregation error types

use thiserror::Error;

/// Errors raised while validating and bucketing readings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// Timestamp and value arrays differ in length
    #[error("Length mismatch: {timestamps} timestamps but {values} values")]
    LengthMismatch { timestamps: usize, values: usize },

    /// A timestamp could not be parsed
    #[error("Invalid timestamp at index {index}: {value:?}")]
    InvalidTimestamp { index: usize, value: String },

    /// A value is NaN or infinite
    #[error("Invalid value at index {index}: {value}")]
    InvalidValue { index: usize, value: f64 },

    /// A host attribute did not contain the expected JSON array
    #[error("Invalid JSON in attribute {attribute}: {error}")]
    Json { attribute: String, error: String },

    /// Month key not in `YYYY-M` / `YYYY-MM` form
    #[error("Invalid month key: {0}")]
    InvalidMonthKey(String),

    /// Locale name not supported
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    /// UTC offset outside +/-23 hours
    #[error("Invalid UTC offset: {0} hours")]
    InvalidOffset(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AggregateError::LengthMismatch {
            timestamps: 3,
            values: 2,
        };
        assert_eq!(err.to_string(), "Length mismatch: 3 timestamps but 2 values");

        let err = AggregateError::InvalidTimestamp {
            index: 1,
            value: "yesterday".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid timestamp at index 1: \"yesterday\"");
    }
}
