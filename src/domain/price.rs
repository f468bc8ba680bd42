//! Fixed-point dish prices.
//!
//! Prices travel as decimal strings (`"9.99"`) and are stored as `NUMERIC(12,2)`.
//! Internally they are whole cents so that formatting is exact.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::DomainError;

const MAX_INTEGER_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: i64,
}

impl Price {
    pub fn from_cents(cents: i64) -> Result<Self, DomainError> {
        if cents < 0 {
            return Err(DomainError::validation("price", "must not be negative"));
        }
        Ok(Self { cents })
    }

    pub fn cents(self) -> i64 {
        self.cents
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DomainError::validation("price", "must not be empty"));
        }
        if value.starts_with('-') {
            return Err(DomainError::validation("price", "must not be negative"));
        }

        let (whole, fraction) = match value.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (value, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(
                "price",
                format!("`{value}` is not a decimal number"),
            ));
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(
                "price",
                format!("`{value}` is not a decimal number"),
            ));
        }
        if fraction.len() > 2 {
            return Err(DomainError::validation(
                "price",
                "at most two fractional digits are allowed",
            ));
        }

        let whole = whole.trim_start_matches('0');
        if whole.len() > MAX_INTEGER_DIGITS {
            return Err(DomainError::validation("price", "value is too large"));
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| DomainError::validation("price", "value is too large"))?
        };
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => i64::from(fraction.as_bytes()[0] - b'0') * 10,
            _ => fraction
                .parse()
                .map_err(|_| DomainError::validation("price", "invalid fractional part"))?,
        };

        Self::from_cents(units * 100 + fraction_cents)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl From<u32> for Price {
    fn from(cents: u32) -> Self {
        Self {
            cents: i64::from(cents),
        }
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Price::parse(&raw).map_err(serde::de::Error::custom)
    }
}
