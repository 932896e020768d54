//! Product Module
//!
//! Product records and the fixed-point price type they carry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// == Constants ==
/// Shortest accepted product name, counted in characters after trimming.
pub const MIN_NAME_CHARS: usize = 2;

/// Longest accepted product name, counted in characters after trimming.
pub const MAX_NAME_CHARS: usize = 100;

/// Largest price representable at `NUMERIC(12,2)` scale, in cents.
pub const MAX_PRICE_CENTS: i64 = 999_999_999_999;

// == Price ==
/// Non-negative decimal price with a fixed 2-digit scale, stored as cents.
///
/// Serialized as a string with exactly two fraction digits (`"12.50"`).
/// Deserializes from that string form or from a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must be a finite number")]
    NotFinite,
    #[error("price must be >= 0")]
    Negative,
    #[error("price must not exceed 9999999999.99")]
    TooLarge,
    #[error("invalid price literal `{0}`")]
    Malformed(String),
}

impl Price {
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents < 0 {
            return Err(PriceError::Negative);
        }
        if cents > MAX_PRICE_CENTS {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(cents))
    }

    /// Converts a transport-level number, rounding half away from zero to cents.
    pub fn from_f64(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::NotFinite);
        }
        if value < 0.0 {
            return Err(PriceError::Negative);
        }
        let cents = (value * 100.0).round();
        if cents > MAX_PRICE_CENTS as f64 {
            return Err(PriceError::TooLarge);
        }
        Self::from_cents(cents as i64)
    }

    pub fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();
        if literal.starts_with('-') {
            return Err(PriceError::Negative);
        }
        let malformed = || PriceError::Malformed(s.to_string());

        let (whole, frac) = literal.split_once('.').unwrap_or((literal, ""));
        if whole.is_empty()
            || frac.len() > 2
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        let whole: i64 = whole.parse().map_err(|_| PriceError::TooLarge)?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| malformed())? * 10,
            _ => frac.parse().map_err(|_| malformed())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or(PriceError::TooLarge)?;
        Self::from_cents(cents)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PriceVisitor;

        impl Visitor<'_> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative decimal price")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
                Price::from_f64(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
                let cents = i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .ok_or_else(|| E::custom(PriceError::TooLarge))?;
                Price::from_cents(cents).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
                if v < 0 {
                    return Err(E::custom(PriceError::Negative));
                }
                self.visit_u64(v as u64)
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}

// == Product ==
/// A product record as owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Opaque unique identifier, assigned by the store
    pub id: String,
    /// Trimmed, globally unique, case-sensitive name
    pub name: String,
    pub price: Price,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub stock: i32,
}

/// Partial update; absent fields are left untouched.
///
/// `price` and `stock` arrive as transport numbers and are range-checked by
/// the service before they are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.stock.is_none()
    }
}

// == Field Normalization ==
/// Trims a product name and checks its length.
pub fn normalize_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    let chars = name.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&chars) {
        return Err(format!(
            "name must be between {} and {} characters",
            MIN_NAME_CHARS, MAX_NAME_CHARS
        ));
    }
    Ok(name.to_string())
}

/// Checks that a stock count is a non-negative integer that fits the store.
pub fn parse_stock(raw: i64) -> Result<i32, String> {
    if raw < 0 {
        return Err("stock must be an integer >= 0".to_string());
    }
    i32::try_from(raw).map_err(|_| format!("stock must not exceed {}", i32::MAX))
}
