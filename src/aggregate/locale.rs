//! Display locale for month names, weekday names and chart labels

use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::AggregateError;

/// Label format for a single reading (`Rab, 1 - 08:00`)
pub const READING_LABEL_FORMAT: &str = "%a, %-d - %H:%M";
/// Label format for a single reading on narrow screens (`Rab 08:00`)
pub const READING_COMPACT_FORMAT: &str = "%a %H:%M";
/// Label format for a day total (`Rab, 1 Mei`)
pub const DAY_LABEL_FORMAT: &str = "%a, %-d %b";
/// Label format for a day total on narrow screens (`1 Mei`)
pub const DAY_COMPACT_FORMAT: &str = "%-d %b";
/// Month bucket display name (`Mei 2024`)
pub const MONTH_NAME_FORMAT: &str = "%B %Y";

/// Locales the dashboard can format dates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayLocale {
    #[default]
    #[serde(rename = "id_ID")]
    Indonesian,
    #[serde(rename = "en_US")]
    EnglishUs,
    #[serde(rename = "en_GB")]
    EnglishGb,
    #[serde(rename = "nl_NL")]
    Dutch,
    #[serde(rename = "de_DE")]
    German,
    #[serde(rename = "fr_FR")]
    French,
    #[serde(rename = "ja_JP")]
    Japanese,
}

impl DisplayLocale {
    fn chrono_locale(self) -> chrono::Locale {
        match self {
            DisplayLocale::Indonesian => chrono::Locale::id_ID,
            DisplayLocale::EnglishUs => chrono::Locale::en_US,
            DisplayLocale::EnglishGb => chrono::Locale::en_GB,
            DisplayLocale::Dutch => chrono::Locale::nl_NL,
            DisplayLocale::German => chrono::Locale::de_DE,
            DisplayLocale::French => chrono::Locale::fr_FR,
            DisplayLocale::Japanese => chrono::Locale::ja_JP,
        }
    }

    /// POSIX style tag (`id_ID`)
    pub fn tag(self) -> &'static str {
        match self {
            DisplayLocale::Indonesian => "id_ID",
            DisplayLocale::EnglishUs => "en_US",
            DisplayLocale::EnglishGb => "en_GB",
            DisplayLocale::Dutch => "nl_NL",
            DisplayLocale::German => "de_DE",
            DisplayLocale::French => "fr_FR",
            DisplayLocale::Japanese => "ja_JP",
        }
    }

    /// Format a wall-clock time with a strftime pattern, no zone shift applied
    pub fn format(self, at: NaiveDateTime, pattern: &str) -> String {
        Utc.from_utc_datetime(&at)
            .format_localized(pattern, self.chrono_locale())
            .to_string()
    }
}

impl fmt::Display for DisplayLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DisplayLocale {
    type Err = AggregateError;

    /// Accepts `id`, `id_ID`, `id-ID` and the same shapes for the other locales
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").to_lowercase().as_str() {
            "id" | "id_id" => Ok(DisplayLocale::Indonesian),
            "en" | "en_us" => Ok(DisplayLocale::EnglishUs),
            "en_gb" => Ok(DisplayLocale::EnglishGb),
            "nl" | "nl_nl" => Ok(DisplayLocale::Dutch),
            "de" | "de_de" => Ok(DisplayLocale::German),
            "fr" | "fr_fr" => Ok(DisplayLocale::French),
            "ja" | "ja_jp" => Ok(DisplayLocale::Japanese),
            _ => Err(AggregateError::UnknownLocale(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_locale_names() {
        assert_eq!("id".parse::<DisplayLocale>().unwrap(), DisplayLocale::Indonesian);
        assert_eq!("en-US".parse::<DisplayLocale>().unwrap(), DisplayLocale::EnglishUs);
        assert_eq!("de_DE".parse::<DisplayLocale>().unwrap(), DisplayLocale::German);
        assert!(matches!(
            "xx_YY".parse::<DisplayLocale>(),
            Err(AggregateError::UnknownLocale(_))
        ));
    }

    #[test]
    fn test_default_is_indonesian() {
        assert_eq!(DisplayLocale::default(), DisplayLocale::Indonesian);
        assert_eq!(DisplayLocale::default().to_string(), "id_ID");
    }

    #[test]
    fn test_format_english_labels() {
        let locale = DisplayLocale::EnglishUs;
        let t = at(2024, 5, 1, 8, 0);
        assert_eq!(locale.format(t, MONTH_NAME_FORMAT), "May 2024");
        assert_eq!(locale.format(t, READING_LABEL_FORMAT), "Wed, 1 - 08:00");
        assert_eq!(locale.format(t, READING_COMPACT_FORMAT), "Wed 08:00");
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&DisplayLocale::Indonesian).unwrap();
        assert_eq!(json, "\"id_ID\"");
        let parsed: DisplayLocale = serde_json::from_str("\"en_GB\"").unwrap();
        assert_eq!(parsed, DisplayLocale::EnglishGb);
    }
}
