//! Raw numeric input and its validation into a token or time count.
//!
//! Configuration values and `take` arguments arrive as a [`Quantity`], which may
//! come from Rust code (any primitive number, `bool`, or string) or from a parsed
//! configuration document. [`coerce`] is the only gate that turns one into a `u64`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BucketError;

/// Placeholder echoed in error messages for an absent required value.
pub const MISSING: &str = "missing";

/// An unvalidated count as supplied by the caller.
///
/// Deserializes from any scalar (integer, float, bool, or string), so a config
/// document with `capacity: 1.5` or `capacity: "ten"` still parses and is then
/// rejected by [`coerce`] with a message naming the offending value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    /// Signed integer
    Int(i64),
    /// Unsigned integer too large for `i64`
    UInt(u64),
    /// Floating point number (accepted only when integral and finite)
    Float(f64),
    /// Boolean (never accepted)
    Bool(bool),
    /// Text (accepted when it parses as a base-10 integer)
    Text(String),
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Int(v) => write!(f, "{v}"),
            Quantity::UInt(v) => write!(f, "{v}"),
            Quantity::Float(v) if v.is_nan() => f.write_str("NaN"),
            Quantity::Float(v) if v.is_infinite() && *v > 0.0 => f.write_str("Infinity"),
            Quantity::Float(v) if v.is_infinite() => f.write_str("-Infinity"),
            // Negative zero prints as plain 0
            Quantity::Float(v) if *v == 0.0 => f.write_str("0"),
            Quantity::Float(v) => write!(f, "{v}"),
            Quantity::Bool(v) => write!(f, "{v}"),
            Quantity::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Quantity {
                fn from(value: $ty) -> Self {
                    Quantity::$variant(value.into())
                }
            }
        )+
    };
}

impl_from!(Int: i8, i16, i32, i64);
impl_from!(UInt: u8, u16, u32, u64);
impl_from!(Float: f32, f64);
impl_from!(Bool: bool);
impl_from!(Text: String, &str);

impl From<usize> for Quantity {
    fn from(value: usize) -> Self {
        Quantity::UInt(value as u64)
    }
}

impl From<isize> for Quantity {
    fn from(value: isize) -> Self {
        Quantity::Int(value as i64)
    }
}

impl Quantity {
    /// Exact integer value, or `None` if the input is not an integer.
    fn integral(&self) -> Option<i128> {
        match self {
            Quantity::Int(v) => Some(i128::from(*v)),
            Quantity::UInt(v) => Some(i128::from(*v)),
            Quantity::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i128),
            Quantity::Float(_) | Quantity::Bool(_) => None,
            Quantity::Text(s) => s.trim().parse::<i128>().ok(),
        }
    }
}

/// Validate a raw value as a non-negative integer count.
///
/// `name` is interpolated into the error message. A `None` value is treated as
/// a missing required field. Zero is rejected unless `allow_zero` is set.
///
/// # Errors
///
/// - [`BucketError::NotAnInteger`] when the value is absent, non-finite,
///   fractional, boolean, or non-numeric text.
/// - [`BucketError::OutOfRange`] when the integer is negative, zero while zero
///   is disallowed, or larger than `u64::MAX`.
pub fn coerce(value: Option<&Quantity>, name: &str, allow_zero: bool) -> Result<u64, BucketError> {
    let Some(value) = value else {
        return Err(BucketError::NotAnInteger {
            name: name.to_string(),
            value: MISSING.to_string(),
        });
    };

    let Some(parsed) = value.integral() else {
        return Err(BucketError::NotAnInteger {
            name: name.to_string(),
            value: value.to_string(),
        });
    };

    let out_of_range = || BucketError::OutOfRange {
        name: name.to_string(),
        value: value.to_string(),
    };

    if parsed < 0 || (parsed == 0 && !allow_zero) {
        return Err(out_of_range());
    }

    u64::try_from(parsed).map_err(|_| out_of_range())
}
