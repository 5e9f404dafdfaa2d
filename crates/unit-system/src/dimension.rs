//! Physical dimensions.

use serde::{Deserialize, Serialize};

/// The physical dimension of a unit.
///
/// Two units can only be converted into each other when they share a
/// dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Length,
    Area,
    Volume,
    Mass,
    Count,
    VolumePerArea,
    MassPerArea,
    CountPerArea,
    VolumePerTime,
    MassPerTime,
    Temperature,
    Dimensionless,
}

impl Dimension {
    /// ISO 11783-11 setpoint DDI whose unit is canonical for this dimension.
    pub fn setpoint_ddi(&self) -> Option<u16> {
        match self {
            Dimension::VolumePerArea => Some(0x0001),
            Dimension::MassPerArea => Some(0x0006),
            Dimension::CountPerArea => Some(0x000B),
            Dimension::Length => Some(0x0010),
            Dimension::VolumePerTime => Some(0x0024),
            Dimension::MassPerTime => Some(0x0029),
            _ => None,
        }
    }

    /// Dimension of a setpoint DDI, the inverse of [`Dimension::setpoint_ddi`].
    pub fn from_setpoint_ddi(ddi: u16) -> Option<Self> {
        match ddi {
            0x0001 => Some(Dimension::VolumePerArea),
            0x0006 => Some(Dimension::MassPerArea),
            0x000B => Some(Dimension::CountPerArea),
            0x0010 => Some(Dimension::Length),
            0x0024 => Some(Dimension::VolumePerTime),
            0x0029 => Some(Dimension::MassPerTime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Length => "length",
            Dimension::Area => "area",
            Dimension::Volume => "volume",
            Dimension::Mass => "mass",
            Dimension::Count => "count",
            Dimension::VolumePerArea => "volume_per_area",
            Dimension::MassPerArea => "mass_per_area",
            Dimension::CountPerArea => "count_per_area",
            Dimension::VolumePerTime => "volume_per_time",
            Dimension::MassPerTime => "mass_per_time",
            Dimension::Temperature => "temperature",
            Dimension::Dimensionless => "dimensionless",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddi_round_trip() {
        for dim in [
            Dimension::VolumePerArea,
            Dimension::MassPerArea,
            Dimension::CountPerArea,
            Dimension::Length,
            Dimension::VolumePerTime,
            Dimension::MassPerTime,
        ] {
            let ddi = dim.setpoint_ddi().unwrap();
            assert_eq!(Dimension::from_setpoint_ddi(ddi), Some(dim));
        }
    }

    #[test]
    fn test_no_ddi_for_plain_quantities() {
        assert_eq!(Dimension::Area.setpoint_ddi(), None);
        assert_eq!(Dimension::Temperature.setpoint_ddi(), None);
        assert_eq!(Dimension::from_setpoint_ddi(0x0002), None);
    }
}
