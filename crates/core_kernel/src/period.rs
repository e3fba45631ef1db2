//! Billing period labels
//!
//! A billing period is the opaque label for one rent cycle, formatted as
//! `"Month Year"` (e.g. `"March 2025"`). The label is validated on
//! construction but never interpreted as a calendar date: ordering,
//! proration, and cycle arithmetic are all out of scope.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// English month names accepted in a billing period label
const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Errors related to billing period labels
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Malformed billing period '{0}': expected \"Month Year\"")]
    Malformed(String),

    #[error("Unknown month name '{0}'")]
    UnknownMonth(String),

    #[error("Invalid year '{0}': expected a four-digit year")]
    InvalidYear(String),
}

/// One rent cycle, identified by its `"Month Year"` label
///
/// Two periods are equal exactly when their labels are equal. The label is
/// the unit of double-booking checks and due derivation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BillingPeriod {
    label: String,
}

impl BillingPeriod {
    /// Parses and validates a `"Month Year"` label
    ///
    /// # Errors
    ///
    /// Returns `PeriodError` if the label is not an English month name
    /// followed by a single space and a four-digit year.
    pub fn parse(label: &str) -> Result<Self, PeriodError> {
        let (month, year) = label
            .split_once(' ')
            .ok_or_else(|| PeriodError::Malformed(label.to_string()))?;
        if month.is_empty() || year.contains(' ') {
            return Err(PeriodError::Malformed(label.to_string()));
        }

        if !MONTH_NAMES.contains(&month) {
            return Err(PeriodError::UnknownMonth(month.to_string()));
        }
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(PeriodError::InvalidYear(year.to_string()));
        }

        Ok(Self {
            label: label.to_string(),
        })
    }

    /// Returns the label
    pub fn as_str(&self) -> &str {
        &self.label
    }

    /// Returns the month component of the label
    pub fn month_name(&self) -> &str {
        self.label.split(' ').next().unwrap_or_default()
    }

    /// Returns the year component of the label
    pub fn year(&self) -> &str {
        self.label.split(' ').nth(1).unwrap_or_default()
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl FromStr for BillingPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BillingPeriod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for BillingPeriod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BillingPeriod::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_label() {
        let period = BillingPeriod::parse("March 2025").unwrap();
        assert_eq!(period.as_str(), "March 2025");
        assert_eq!(period.month_name(), "March");
        assert_eq!(period.year(), "2025");
    }

    #[test]
    fn test_rejects_unknown_month() {
        assert_eq!(
            BillingPeriod::parse("Marzo 2025"),
            Err(PeriodError::UnknownMonth("Marzo".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_year() {
        assert_eq!(
            BillingPeriod::parse("March 25"),
            Err(PeriodError::InvalidYear("25".to_string()))
        );
        assert_eq!(
            BillingPeriod::parse("March 20x5"),
            Err(PeriodError::InvalidYear("20x5".to_string()))
        );
    }

    #[test]
    fn test_rejects_malformed_label() {
        assert!(matches!(
            BillingPeriod::parse("March"),
            Err(PeriodError::Malformed(_))
        ));
        assert!(matches!(
            BillingPeriod::parse("March  2025"),
            Err(PeriodError::Malformed(_))
        ));
        assert!(matches!(
            BillingPeriod::parse("March 2025 extra"),
            Err(PeriodError::Malformed(_))
        ));
        assert!(matches!(
            BillingPeriod::parse(""),
            Err(PeriodError::Malformed(_))
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let period = BillingPeriod::parse("April 2025").unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"April 2025\"");

        let back: BillingPeriod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);

        let bad: Result<BillingPeriod, _> = serde_json::from_str("\"Sometime 2025\"");
        assert!(bad.is_err());
    }
}
