//! Unit definitions and the registry that resolves unit codes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::error::{UnitError, UnitResult};

const ACRE_M2: f64 = 4_046.856_422_4;
const US_GALLON_ML: f64 = 3_785.411_784;
const POUND_G: f64 = 453.592_37;

/// A unit of measure.
///
/// A value `v` in this unit equals `v * scale + offset` in the base unit of
/// its dimension. For dimensions with an ISO canonical unit, the canonical
/// unit is the base (scale 1, offset 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub code: String,
    pub dimension: Dimension,
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
}

impl Unit {
    /// Create a linear unit.
    pub fn new(code: impl Into<String>, dimension: Dimension, scale: f64) -> Self {
        Self {
            code: code.into(),
            dimension,
            scale,
            offset: 0.0,
        }
    }

    /// Create an affine unit (temperatures).
    pub fn affine(code: impl Into<String>, dimension: Dimension, scale: f64, offset: f64) -> Self {
        Self {
            code: code.into(),
            dimension,
            scale,
            offset,
        }
    }

    /// Express a value of this unit in the dimension's base unit.
    #[inline]
    pub fn to_base(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    /// Express a base-unit value in this unit.
    #[inline]
    pub fn from_base(&self, value: f64) -> f64 {
        (value - self.offset) / self.scale
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Resolves unit codes to units and knows the canonical unit per dimension.
///
/// The registry is open: callers may register additional units and aliases
/// on top of the built-in table.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: BTreeMap<String, Unit>,
    aliases: BTreeMap<String, String>,
    canonical: BTreeMap<Dimension, String>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl UnitRegistry {
    /// An empty registry with no canonical units.
    pub fn empty() -> Self {
        Self {
            units: BTreeMap::new(),
            aliases: BTreeMap::new(),
            canonical: BTreeMap::new(),
        }
    }

    /// The built-in table of agricultural units.
    pub fn builtin() -> Self {
        use Dimension::*;

        let mut registry = Self::empty();
        let table = [
            // Length, base mm
            Unit::new("mm", Length, 1.0),
            Unit::new("cm", Length, 10.0),
            Unit::new("m", Length, 1_000.0),
            Unit::new("km", Length, 1_000_000.0),
            Unit::new("in", Length, 25.4),
            Unit::new("ft", Length, 304.8),
            Unit::new("yd", Length, 914.4),
            Unit::new("mi", Length, 1_609_344.0),
            // Area, base m2
            Unit::new("m2", Area, 1.0),
            Unit::new("ha", Area, 10_000.0),
            Unit::new("km2", Area, 1_000_000.0),
            Unit::new("ac", Area, ACRE_M2),
            Unit::new("ft2", Area, 0.092_903_04),
            // Volume, base ml
            Unit::new("ml", Volume, 1.0),
            Unit::new("mm3", Volume, 0.001),
            Unit::new("l", Volume, 1_000.0),
            Unit::new("m3", Volume, 1_000_000.0),
            Unit::new("gal", Volume, US_GALLON_ML),
            Unit::new("qt", Volume, US_GALLON_ML / 4.0),
            Unit::new("pt", Volume, US_GALLON_ML / 8.0),
            Unit::new("floz", Volume, US_GALLON_ML / 128.0),
            // Mass, base g
            Unit::new("g", Mass, 1.0),
            Unit::new("mg", Mass, 0.001),
            Unit::new("kg", Mass, 1_000.0),
            Unit::new("t", Mass, 1_000_000.0),
            Unit::new("lb", Mass, POUND_G),
            Unit::new("oz", Mass, POUND_G / 16.0),
            Unit::new("ton", Mass, POUND_G * 2_000.0),
            // Count, base count
            Unit::new("count", Count, 1.0),
            Unit::new("seeds", Count, 1.0),
            Unit::new("kseeds", Count, 1_000.0),
            // Volume per area, base mm3/m2
            Unit::new("mm3/m2", VolumePerArea, 1.0),
            Unit::new("ml/m2", VolumePerArea, 1_000.0),
            Unit::new("l/m2", VolumePerArea, 1_000_000.0),
            Unit::new("l/ha", VolumePerArea, 100.0),
            Unit::new("m3/ha", VolumePerArea, 100_000.0),
            Unit::new("gal/ac", VolumePerArea, US_GALLON_ML * 1_000.0 / ACRE_M2),
            Unit::new("floz/ac", VolumePerArea, US_GALLON_ML * 1_000.0 / 128.0 / ACRE_M2),
            // Mass per area, base mg/m2
            Unit::new("mg/m2", MassPerArea, 1.0),
            Unit::new("g/m2", MassPerArea, 1_000.0),
            Unit::new("kg/m2", MassPerArea, 1_000_000.0),
            Unit::new("kg/ha", MassPerArea, 100.0),
            Unit::new("t/ha", MassPerArea, 100_000.0),
            Unit::new("lb/ac", MassPerArea, POUND_G * 1_000.0 / ACRE_M2),
            Unit::new("oz/ac", MassPerArea, POUND_G * 1_000.0 / 16.0 / ACRE_M2),
            // Count per area, base /m2
            Unit::new("/m2", CountPerArea, 1.0),
            Unit::new("seeds/m2", CountPerArea, 1.0),
            Unit::new("seeds/ha", CountPerArea, 1.0 / 10_000.0),
            Unit::new("seeds/ac", CountPerArea, 1.0 / ACRE_M2),
            Unit::new("kseeds/ha", CountPerArea, 1_000.0 / 10_000.0),
            Unit::new("kseeds/ac", CountPerArea, 1_000.0 / ACRE_M2),
            // Volume per time, base mm3/s
            Unit::new("mm3/s", VolumePerTime, 1.0),
            Unit::new("ml/s", VolumePerTime, 1_000.0),
            Unit::new("l/min", VolumePerTime, 1_000_000.0 / 60.0),
            Unit::new("l/h", VolumePerTime, 1_000_000.0 / 3_600.0),
            Unit::new("gal/min", VolumePerTime, US_GALLON_ML * 1_000.0 / 60.0),
            // Mass per time, base mg/s
            Unit::new("mg/s", MassPerTime, 1.0),
            Unit::new("g/s", MassPerTime, 1_000.0),
            Unit::new("kg/min", MassPerTime, 1_000_000.0 / 60.0),
            Unit::new("kg/h", MassPerTime, 1_000_000.0 / 3_600.0),
            Unit::new("lb/min", MassPerTime, POUND_G * 1_000.0 / 60.0),
            // Temperature, base K
            Unit::new("K", Temperature, 1.0),
            Unit::affine("C", Temperature, 1.0, 273.15),
            Unit::affine("F", Temperature, 5.0 / 9.0, 273.15 - 32.0 * 5.0 / 9.0),
            // Dimensionless, base ratio
            Unit::new("ratio", Dimensionless, 1.0),
            Unit::new("%", Dimensionless, 0.01),
            Unit::new("ppm", Dimensionless, 0.000_001),
        ];

        for unit in table {
            registry.units.insert(unit.code.clone(), unit);
        }

        for (alias, code) in [
            ("L/ha", "l/ha"),
            ("L/m2", "l/m2"),
            ("L/min", "l/min"),
            ("L/h", "l/h"),
            ("gal(us)/ac", "gal/ac"),
            ("gal1ac-1", "gal/ac"),
            ("l1ha-1", "l/ha"),
            ("kg1ha-1", "kg/ha"),
            ("lb1ac-1", "lb/ac"),
            ("mm3m-2", "mm3/m2"),
            ("mgm-2", "mg/m2"),
            ("count/m2", "/m2"),
            ("seeds1ac-1", "seeds/ac"),
            ("degC", "C"),
            ("degF", "F"),
        ] {
            registry.aliases.insert(alias.to_string(), code.to_string());
        }

        for (dimension, code) in [
            (VolumePerArea, "mm3/m2"),
            (MassPerArea, "mg/m2"),
            (CountPerArea, "/m2"),
            (Length, "mm"),
            (VolumePerTime, "mm3/s"),
            (MassPerTime, "mg/s"),
        ] {
            registry.canonical.insert(dimension, code.to_string());
        }

        registry
    }

    /// Add a unit to the registry.
    pub fn register(&mut self, unit: Unit) -> UnitResult<()> {
        if !(unit.scale.is_finite() && unit.scale != 0.0) || !unit.offset.is_finite() {
            return Err(UnitError::InvalidScale {
                code: unit.code.clone(),
                scale: unit.scale,
            });
        }
        if self.units.contains_key(&unit.code) || self.aliases.contains_key(&unit.code) {
            return Err(UnitError::DuplicateCode(unit.code));
        }
        self.units.insert(unit.code.clone(), unit);
        Ok(())
    }

    /// Make `alias` resolve to the unit registered under `code`.
    pub fn add_alias(&mut self, alias: impl Into<String>, code: &str) -> UnitResult<()> {
        let alias = alias.into();
        if !self.units.contains_key(code) {
            return Err(UnitError::UnknownUnit(code.to_string()));
        }
        if self.units.contains_key(&alias) || self.aliases.contains_key(&alias) {
            return Err(UnitError::DuplicateCode(alias));
        }
        self.aliases.insert(alias, code.to_string());
        Ok(())
    }

    /// Resolve a unit code or alias.
    ///
    /// Matching is case-sensitive: `MG/M2` is megagrams, not milligrams.
    /// Spelling variants need an explicit alias.
    pub fn lookup(&self, code: &str) -> Option<&Unit> {
        let code = code.trim();
        self.units.get(code).or_else(|| {
            self.aliases
                .get(code)
                .and_then(|target| self.units.get(target))
        })
    }

    /// The ISO canonical unit for a dimension, if the dimension has one.
    pub fn canonical_for(&self, dimension: Dimension) -> Option<&Unit> {
        self.canonical
            .get(&dimension)
            .and_then(|code| self.units.get(code))
    }

    /// Whether `unit` is the canonical unit of its dimension.
    pub fn is_canonical(&self, unit: &Unit) -> bool {
        self.canonical
            .get(&unit.dimension)
            .map(|code| code == &unit.code)
            .unwrap_or(false)
    }

    /// DDI identifying a canonical unit in task data.
    pub fn ddi_of(&self, unit: &Unit) -> Option<u16> {
        if self.is_canonical(unit) {
            unit.dimension.setpoint_ddi()
        } else {
            None
        }
    }

    /// Canonical unit identified by a DDI.
    pub fn canonical_for_ddi(&self, ddi: u16) -> Option<&Unit> {
        Dimension::from_setpoint_ddi(ddi).and_then(|dim| self.canonical_for(dim))
    }

    /// Number of registered units (aliases excluded).
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
