//! Explicitly-undefined ratios.
//!
//! Every derived metric divides by a quantity that can legitimately be zero
//! (a jurisdiction with no target, a county with no housing stock) or
//! missing (no demographic record). [`Ratio`] keeps that distinction visible
//! instead of letting `NaN` or infinity leak into aggregates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Why a [`Ratio`] has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Undefined {
    /// The denominator was zero.
    ZeroDenominator,
    /// An input to the ratio was not available.
    MissingInput,
}

/// A quotient that is either a finite value or explicitly undefined.
///
/// Serializes as a JSON number, or `null` when undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    /// A finite quotient.
    Value(f64),
    /// No meaningful quotient exists.
    Undefined(Undefined),
}

impl Ratio {
    /// Divides `numerator` by `denominator`, yielding
    /// [`Undefined::ZeroDenominator`] when the denominator is zero.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if !numerator.is_finite() || !denominator.is_finite() {
            return Self::Undefined(Undefined::MissingInput);
        }
        if denominator == 0.0 {
            return Self::Undefined(Undefined::ZeroDenominator);
        }
        Self::Value(numerator / denominator)
    }

    /// Like [`Self::of`], but either side may be absent.
    #[must_use]
    pub fn of_optional(numerator: Option<f64>, denominator: Option<f64>) -> Self {
        match (numerator, denominator) {
            (Some(n), Some(d)) => Self::of(n, d),
            _ => Self::Undefined(Undefined::MissingInput),
        }
    }

    /// Divides one ratio by another. Undefined on either side propagates,
    /// with the numerator's reason taking precedence.
    #[must_use]
    pub fn divide(self, other: Self) -> Self {
        match (self, other) {
            (Self::Value(n), Self::Value(d)) => Self::of(n, d),
            (Self::Undefined(reason), _) | (_, Self::Undefined(reason)) => {
                Self::Undefined(reason)
            }
        }
    }

    /// Returns the value, or `None` when undefined.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undefined(_) => None,
        }
    }

    /// Whether this ratio has a value.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns the value as a percentage (x100).
    #[must_use]
    pub fn as_percent(self) -> Option<f64> {
        self.value().map(|v| v * 100.0)
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?
            .map_or(Self::Undefined(Undefined::MissingInput), Self::Value))
    }
}
