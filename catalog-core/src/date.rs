//! Calendar dates in the catalog's `MM/DD/YYYY` wire format.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::ValidationError;

const WIRE_FORMAT: &str = "%m/%d/%Y";

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2])/(0[1-9]|[12][0-9]|3[01])/(19|20)\d{2}$")
        .expect("Invalid date regex")
});

/// A calendar date that always renders as `MM/DD/YYYY`.
///
/// Years are restricted to 1900-2099 and the day must exist on the
/// calendar (`02/30/2024` is rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogDate(NaiveDate);

impl CatalogDate {
    /// Parse a `MM/DD/YYYY` string, naming `field` in the error.
    pub fn parse(field: &str, raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let invalid = || ValidationError::InvalidDateFormat {
            field: field.to_string(),
            value: raw.to_string(),
        };
        if !DATE_RE.is_match(trimmed) {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(trimmed, WIRE_FORMAT)
            .map(CatalogDate)
            .map_err(|_| invalid())
    }

    /// Today's date in UTC.
    pub fn today() -> Self {
        CatalogDate(chrono::Utc::now().date_naive())
    }

    /// Whole years elapsed between `self` (a birth date) and `on`.
    pub fn age_on(&self, on: CatalogDate) -> i32 {
        let (born, on) = (self.0, on.0);
        let mut age = on.year() - born.year();
        if (on.month(), on.day()) < (born.month(), born.day()) {
            age -= 1;
        }
        age
    }
}

impl fmt::Display for CatalogDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

impl Serialize for CatalogDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CatalogDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CatalogDate::parse("date", &raw).map_err(serde::de::Error::custom)
    }
}
