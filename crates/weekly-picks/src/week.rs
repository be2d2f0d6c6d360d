use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::predictions::domain::DomainError;

/// Scheduling period grouping matches, entries, scoring passes, and draws.
///
/// Identifiers produced from dates follow the ISO-8601 week format (`2026-W05`), but any
/// non-blank label is accepted so operators can run ad-hoc weeks through an override.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId(String);

impl WeekId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidWeek(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// ISO week-year and week number of `date`, zero padded.
    pub fn for_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self(format!("{}-W{:02}", iso.year(), iso.week()))
    }

    /// Resolve the active week, preferring a non-blank operator override.
    pub fn current(today: NaiveDate, override_id: Option<&str>) -> Self {
        override_id
            .and_then(|value| Self::parse(value).ok())
            .unwrap_or_else(|| Self::for_date(today))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WeekId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WeekId> for String {
    fn from(value: WeekId) -> Self {
        value.0
    }
}
