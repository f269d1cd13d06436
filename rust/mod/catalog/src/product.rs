//! Product records and their integer codes.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Integer identifier of a product.
///
/// Codes compare by numeric value. Deserialization accepts a JSON integer,
/// an integral float (`12.0`) or a numeric string (`"12"`), so records
/// coming from loosely typed sources still match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Code(pub i64);

impl Code {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for Code {
    fn from(v: i64) -> Self {
        Code(v)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCodeError(String);

impl fmt::Display for ParseCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid product code '{}'", self.0)
    }
}

impl std::error::Error for ParseCodeError {}

fn integral_f64(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

impl FromStr for Code {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Ok(Code(v));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(integral_f64)
            .map(Code)
            .ok_or_else(|| ParseCodeError(s.to_string()))
    }
}

struct CodeVisitor;

impl Visitor<'_> for CodeVisitor {
    type Value = Code;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer product code or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Code, E> {
        Ok(Code(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Code, E> {
        i64::try_from(v)
            .map(Code)
            .map_err(|_| E::custom(format!("product code {} out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Code, E> {
        integral_f64(v)
            .map(Code)
            .ok_or_else(|| E::custom(format!("product code {} is not an integer", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Code, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CodeVisitor)
    }
}

/// Name of the identifier field in the flat JSON form.
pub const CODE_FIELD: &str = "code";

/// A product record: a `code` plus an open set of payload fields.
///
/// Serialized flat, e.g. `{"code": 12, "name": "Pen", "price": 3.5}`.
/// Payload fields are opaque; the reconciliation engine compares them
/// structurally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Code>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Product {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: impl Into<Code>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set a payload field. A `code` field sets the product code instead,
    /// and is dropped when the value is not a valid code.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == CODE_FIELD {
            if let Ok(code) = serde_json::from_value::<Option<Code>>(value) {
                self.code = code;
            }
        } else {
            self.fields.insert(name, value);
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Parse a product from an arbitrary JSON value. Non-object values are
    /// rejected.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
