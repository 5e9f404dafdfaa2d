//! Dimension-checked conversion into canonical units.

use tracing::debug;

use crate::registry::{Unit, UnitRegistry};

/// Outcome of converting a user value towards a canonical unit.
///
/// An unconverted value is never silently treated as canonical: callers have
/// to match on the variant to get at the number.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// The value is expressed in `canonical`. `user` is the unit it was
    /// converted from, `None` when the user already supplied the canonical unit.
    Converted {
        value: f64,
        canonical: Unit,
        user: Option<Unit>,
    },
    /// The value is raw, in the unit the user supplied (which may be unknown).
    Unconverted { value: f64, user: Option<String> },
}

impl Conversion {
    pub fn value(&self) -> f64 {
        match self {
            Conversion::Converted { value, .. } | Conversion::Unconverted { value, .. } => *value,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Conversion::Converted { .. })
    }
}

/// Converts values between units of the same dimension.
///
/// Holds a read-only registry, so one converter can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct UnitConverter {
    registry: UnitRegistry,
}

impl UnitConverter {
    pub fn new(registry: UnitRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Resolve the canonical unit for the dimension of a user unit code.
    pub fn canonical_for_code(&self, code: &str) -> Option<&Unit> {
        self.registry
            .lookup(code)
            .and_then(|unit| self.registry.canonical_for(unit.dimension))
    }

    /// Convert `value` between two units, or `None` when their dimensions differ.
    pub fn convert_between(&self, value: f64, from: &Unit, to: &Unit) -> Option<f64> {
        if from.dimension != to.dimension {
            return None;
        }
        if from.code == to.code {
            return Some(value);
        }
        Some(to.from_base(from.to_base(value)))
    }

    /// Convert `value` between two unit codes, or `None` when either is
    /// unknown or their dimensions differ.
    pub fn convert_codes(&self, value: f64, from: &str, to: &str) -> Option<f64> {
        let from = self.registry.lookup(from)?;
        let to = self.registry.lookup(to)?;
        self.convert_between(value, from, to)
    }

    /// Convert a user value into `canonical`.
    ///
    /// Falls back to [`Conversion::Unconverted`] when there is no canonical
    /// unit, when the user unit is missing or unknown, or when the dimensions
    /// differ.
    pub fn to_canonical(
        &self,
        value: f64,
        user_unit: Option<&str>,
        canonical: Option<&Unit>,
    ) -> Conversion {
        let unconverted = || Conversion::Unconverted {
            value,
            user: user_unit.map(str::to_string),
        };

        let Some(canonical) = canonical else {
            return unconverted();
        };
        let Some(code) = user_unit else {
            debug!(canonical = %canonical, "No user unit, value left unconverted");
            return unconverted();
        };
        let Some(user) = self.registry.lookup(code) else {
            debug!(unit = code, "Unknown user unit, value left unconverted");
            return unconverted();
        };

        match self.convert_between(value, user, canonical) {
            Some(converted) => Conversion::Converted {
                value: converted,
                canonical: canonical.clone(),
                user: (user.code != canonical.code).then(|| user.clone()),
            },
            None => {
                debug!(
                    unit = %user,
                    dimension = %user.dimension,
                    canonical = %canonical,
                    canonical_dimension = %canonical.dimension,
                    "Unit dimension mismatch, value left unconverted"
                );
                unconverted()
            }
        }
    }

    /// Inverse of [`UnitConverter::to_canonical`]: express a canonical value
    /// in the user unit it was converted from.
    pub fn from_canonical(&self, value: f64, canonical: &Unit, user: &Unit) -> Option<f64> {
        self.convert_between(value, canonical, user)
    }
}
