//! Treatment zones, their data variables and zone codes.

use std::collections::HashMap;

use unit_system::{Conversion, Unit};

use crate::error::{GridCodecError, Result};
use crate::reducer::CodeGrid;

/// Identity of a zone within one grid's zone table.
///
/// Reserved zones are distinct variants, so an ordinary zone can never be
/// handed a reserved code. The numeric value only exists at serialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZoneCode {
    /// Every product at rate 0.
    Default,
    /// Applied while the positioning signal is lost.
    LossOfSignal,
    /// Applied outside the field boundary.
    OutOfField,
    /// Raster-derived zone, by allocation order.
    Ordinary(usize),
}

impl ZoneCode {
    pub const DEFAULT_VALUE: usize = 1;
    pub const LOSS_OF_SIGNAL_VALUE: usize = 253;
    pub const OUT_OF_FIELD_VALUE: usize = 254;
    const FIRST_ORDINARY_VALUE: usize = 2;

    /// Numeric code written to the grid and the zone table.
    ///
    /// Ordinary zones count up from 2 and step over 253 and 254.
    pub fn value(self) -> usize {
        match self {
            ZoneCode::Default => Self::DEFAULT_VALUE,
            ZoneCode::LossOfSignal => Self::LOSS_OF_SIGNAL_VALUE,
            ZoneCode::OutOfField => Self::OUT_OF_FIELD_VALUE,
            ZoneCode::Ordinary(index) => {
                let value = Self::FIRST_ORDINARY_VALUE + index;
                if value >= Self::LOSS_OF_SIGNAL_VALUE {
                    value + 2
                } else {
                    value
                }
            }
        }
    }

    /// Inverse of [`ZoneCode::value`]. Code 0 is not a zone.
    pub fn from_value(value: usize) -> Option<Self> {
        match value {
            0 => None,
            Self::DEFAULT_VALUE => Some(ZoneCode::Default),
            Self::LOSS_OF_SIGNAL_VALUE => Some(ZoneCode::LossOfSignal),
            Self::OUT_OF_FIELD_VALUE => Some(ZoneCode::OutOfField),
            v if v < Self::LOSS_OF_SIGNAL_VALUE => Some(ZoneCode::Ordinary(v - 2)),
            v => Some(ZoneCode::Ordinary(v - 4)),
        }
    }
}

impl std::fmt::Display for ZoneCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Unit provenance of a data variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableUnit {
    /// Value is in `canonical`; `user` is the unit it was converted from.
    Canonical { canonical: Unit, user: Option<Unit> },
    /// Value is raw, in the user's unit code (possibly unknown or absent).
    Raw { user: Option<String> },
}

impl VariableUnit {
    pub fn canonical(&self) -> Option<&Unit> {
        match self {
            VariableUnit::Canonical { canonical, .. } => Some(canonical),
            VariableUnit::Raw { .. } => None,
        }
    }

    /// Code of the unit the user supplied, when one was recorded.
    pub fn user_code(&self) -> Option<&str> {
        match self {
            VariableUnit::Canonical { user, .. } => user.as_ref().map(|u| u.code.as_str()),
            VariableUnit::Raw { user } => user.as_deref(),
        }
    }

    fn key(&self) -> UnitKey {
        match self {
            VariableUnit::Canonical { canonical, user } => UnitKey::Canonical {
                canonical: canonical.code.clone(),
                user: user.as_ref().map(|u| u.code.clone()),
            },
            VariableUnit::Raw { user } => UnitKey::Raw { user: user.clone() },
        }
    }
}

/// One product's rate within a zone.
#[derive(Debug, Clone)]
pub struct DataVariable {
    /// ISO product id.
    pub product_id: String,
    pub value: f64,
    pub unit: VariableUnit,
}

impl DataVariable {
    /// Build a variable from a conversion result.
    ///
    /// Returns `None` for a NaN value, which counts as an absent rate.
    pub fn from_conversion(product_id: impl Into<String>, conversion: Conversion) -> Option<Self> {
        let (value, unit) = match conversion {
            Conversion::Converted {
                value,
                canonical,
                user,
            } => (value, VariableUnit::Canonical { canonical, user }),
            Conversion::Unconverted { value, user } => (value, VariableUnit::Raw { user }),
        };
        if value.is_nan() {
            return None;
        }

        Some(Self {
            product_id: product_id.into(),
            // fold -0.0 into 0.0 so both hit the default zone
            value: if value == 0.0 { 0.0 } else { value },
            unit,
        })
    }

    fn key(&self) -> VariableKey {
        VariableKey {
            product_id: self.product_id.clone(),
            value_bits: self.value.to_bits(),
            unit: self.unit.key(),
        }
    }
}

impl PartialEq for DataVariable {
    fn eq(&self, other: &Self) -> bool {
        self.product_id == other.product_id
            && self.value.to_bits() == other.value.to_bits()
            && self.unit == other.unit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum UnitKey {
    Canonical {
        canonical: String,
        user: Option<String>,
    },
    Raw {
        user: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct VariableKey {
    product_id: String,
    value_bits: u64,
    unit: UnitKey,
}

/// Hashable structural identity of a zone's variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneKey(Vec<VariableKey>);

/// A named set of per-product rates.
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentZone {
    pub name: String,
    pub variables: Vec<DataVariable>,
}

impl TreatmentZone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
        }
    }

    pub fn push(&mut self, variable: DataVariable) {
        self.variables.push(variable);
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Structural identity, ignoring the name.
    pub fn key(&self) -> ZoneKey {
        ZoneKey(self.variables.iter().map(DataVariable::key).collect())
    }

    /// Two zones are equivalent when every product position carries the same
    /// value with the same unit provenance.
    pub fn is_equivalent(&self, other: &TreatmentZone) -> bool {
        self.variables == other.variables
    }

    /// Variable for a product, if the zone has one.
    pub fn variable(&self, product_id: &str) -> Option<&DataVariable> {
        self.variables.iter().find(|v| v.product_id == product_id)
    }
}

/// A zone with its assigned code.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneEntry {
    pub code: ZoneCode,
    pub zone: TreatmentZone,
}

/// The zones of one grid, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneTable {
    entries: Vec<ZoneEntry>,
}

impl ZoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a zone. Codes must be unique within a table.
    pub fn push(&mut self, code: ZoneCode, zone: TreatmentZone) {
        debug_assert!(self.get(code).is_none(), "duplicate zone code {}", code);
        self.entries.push(ZoneEntry { code, zone });
    }

    pub fn get(&self, code: ZoneCode) -> Option<&TreatmentZone> {
        self.entries
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| &entry.zone)
    }

    pub fn contains(&self, code: ZoneCode) -> bool {
        self.get(code).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map every cell of a code grid to its zone.
    pub fn resolve_grid<'a>(&'a self, grid: &CodeGrid) -> Result<Vec<&'a TreatmentZone>> {
        let by_code: HashMap<ZoneCode, &TreatmentZone> = self
            .entries
            .iter()
            .map(|entry| (entry.code, &entry.zone))
            .collect();

        grid.codes
            .iter()
            .map(|code| {
                by_code
                    .get(code)
                    .copied()
                    .ok_or(GridCodecError::UnknownZoneCode(code.value()))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ZoneTable {
    type Item = &'a ZoneEntry;
    type IntoIter = std::slice::Iter<'a, ZoneEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
