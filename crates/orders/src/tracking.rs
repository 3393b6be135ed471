//! Human-facing order tracking codes: `PREFIX-YYYYMMDD-NNNN`.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, ValueObject};

/// Source of the 4-digit random suffix.
///
/// Infra provides a `rand`-backed implementation; tests inject fixed sequences
/// to force collisions.
pub trait SuffixSource: Send + Sync {
    /// Return a value in `TrackingCode::SUFFIX_RANGE`.
    fn next_suffix(&self) -> u16;
}

/// Unique (per store) tracking code for an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingCode(String);

impl ValueObject for TrackingCode {}

impl TrackingCode {
    /// Suffixes are always four digits.
    pub const SUFFIX_RANGE: core::ops::Range<u16> = 1000..10000;

    pub fn compose(prefix: &str, date: NaiveDate, suffix: u16) -> DomainResult<Self> {
        validate_prefix(prefix)?;
        if !Self::SUFFIX_RANGE.contains(&suffix) {
            return Err(DomainError::invalid_argument(format!(
                "tracking suffix {suffix} is not four digits"
            )));
        }
        Ok(Self(format!("{prefix}-{}-{suffix}", date.format("%Y%m%d"))))
    }

    /// Validate a prefix without composing a code (used when loading configuration).
    pub fn check_prefix(prefix: &str) -> DomainResult<()> {
        validate_prefix(prefix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        // Validated on construction: exactly two dashes follow the prefix.
        let mut parts = self.0.rsplitn(3, '-');
        parts.next();
        parts.next();
        parts.next().unwrap_or_default()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.0
            .rsplitn(3, '-')
            .nth(1)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y%m%d").ok())
    }

    pub fn suffix(&self) -> Option<u16> {
        self.0.rsplit('-').next().and_then(|s| s.parse().ok())
    }
}

fn validate_prefix(prefix: &str) -> DomainResult<()> {
    if prefix.is_empty() {
        return Err(DomainError::invalid_argument("tracking prefix cannot be empty"));
    }
    if !prefix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(DomainError::invalid_argument(format!(
            "tracking prefix '{prefix}' must be uppercase ASCII letters or digits"
        )));
    }
    Ok(())
}

impl FromStr for TrackingCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::invalid_argument(format!("malformed tracking code '{s}'"));

        let mut parts = s.rsplitn(3, '-');
        let suffix = parts.next().ok_or_else(invalid)?;
        let date = parts.next().ok_or_else(invalid)?;
        let prefix = parts.next().ok_or_else(invalid)?;

        if suffix.len() != 4 || date.len() != 8 {
            return Err(invalid());
        }
        let suffix: u16 = suffix.parse().map_err(|_| invalid())?;
        let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;

        Self::compose(prefix, date, suffix)
    }
}

impl TryFrom<String> for TrackingCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrackingCode> for String {
    fn from(value: TrackingCode) -> Self {
        value.0
    }
}

impl core::fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
