use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Most decimals a rounding formula or a fixed-decimal rule may ask for.
pub const MAX_DECIMALS: u32 = 15;

/// A single field value as it travels between the engine, the rules and the wire.
///
/// Serialized untagged: a JSON number, a JSON string, or `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

// Numbers compare by bits, matching `Hash`; a NaN result equals itself.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Empty, FieldValue::Empty) => true,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

// Manual implementation to handle f64 by hashing its bits
impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Number(n) => n.to_bits().hash(state),
            FieldValue::Text(s) => s.hash(state),
            FieldValue::Empty => {}
        }
    }
}

impl FieldValue {
    /// Builds a value from raw widget input. Blank input clears the field.
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(raw.to_string())
        }
    }

    /// Formats a number with a fixed count of decimals, the way lab results are stored.
    ///
    /// Ties round away from zero (`300.125` -> `"300.13"`), like the `Round`
    /// formula. `decimals` is capped at [`MAX_DECIMALS`].
    pub fn fixed(value: f64, decimals: u32) -> Self {
        let decimals = decimals.min(MAX_DECIMALS);
        let rounded = round_to(value, decimals).unwrap_or(value);
        FieldValue::Text(format!("{:.*}", decimals as usize, rounded))
    }

    /// Lenient numeric view: numbers as-is, text that parses to a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Number(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Empty, Into::into)
    }
}

/// Rounds half away from zero to `digits` decimals.
///
/// Returns `None` when `digits` exceeds [`MAX_DECIMALS`] or the result is not finite.
pub fn round_to(value: f64, digits: u32) -> Option<f64> {
    if digits > MAX_DECIMALS {
        return None;
    }
    let factor = 10f64.powi(i32::try_from(digits).ok()?);
    let rounded = (value * factor).round() / factor;
    rounded.is_finite().then_some(rounded)
}
