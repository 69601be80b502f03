//! Scalars that arrive either typed or as text
//!
//! Parsed backup trees carry every scalar as a string (`"id": "5"`,
//! `"weight": "1.0000000"`, `"multiple": "1"`), while hand-written documents
//! use native numbers and booleans. Fields that can come from either source
//! deserialize through these helpers.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Integer id or format code, typed or as text
pub fn int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => v,
        Scalar::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("invalid integer {:?}", s)))?,
        other => return Err(D::Error::custom(format!("invalid integer {:?}", other))),
    };
    T::try_from(value).map_err(|_| D::Error::custom(format!("integer {} out of range", value)))
}

/// Floating point value, typed or as text
pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => Ok(v as f64),
        Scalar::Float(v) => Ok(v),
        Scalar::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid number {:?}", s))),
        Scalar::Bool(b) => Err(D::Error::custom(format!("invalid number {}", b))),
    }
}

/// Flag as a boolean, `0`/`1` or their text forms
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => Ok(b),
        Scalar::Int(v) => Ok(v != 0),
        Scalar::Float(v) => Ok(v != 0.0),
        Scalar::Text(s) => match s.trim() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(D::Error::custom(format!("invalid flag {:?}", other))),
        },
    }
}
