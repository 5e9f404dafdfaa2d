//! Value presentations (VPN) for user units.
//!
//! Task data stores every value in the canonical unit of its DDI. When the
//! prescription used another unit, a value presentation records how to show
//! the value again: `shown = (stored + offset) * scale`.

use std::collections::HashMap;

use grid_codec::VariableUnit;
use isoxml_common::IdGenerator;
use unit_system::Unit;

/// Element prefix of value presentation ids.
pub const VPN_PREFIX: &str = "VPN";

/// One `VPN` element.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePresentation {
    pub id: String,
    pub offset: f64,
    pub scale: f64,
    pub decimals: u8,
    /// Unit designator, the user unit code.
    pub unit: String,
}

impl ValuePresentation {
    /// Presentation mapping canonical values onto `user`.
    ///
    /// Returns `None` for a degenerate user unit with a zero scale.
    pub fn for_units(id: String, canonical: &Unit, user: &Unit, decimals: u8) -> Option<Self> {
        if user.scale == 0.0 || canonical.scale == 0.0 {
            return None;
        }
        Some(Self {
            id,
            offset: (canonical.offset - user.offset) / canonical.scale,
            scale: canonical.scale / user.scale,
            decimals,
            unit: user.code.clone(),
        })
    }

    /// Presentation that only labels a value with its unit.
    pub fn label(id: String, unit: &str, decimals: u8) -> Self {
        Self {
            id,
            offset: 0.0,
            scale: 1.0,
            decimals,
            unit: unit.to_string(),
        }
    }

    /// Value as shown to the user.
    pub fn present(&self, stored: f64) -> f64 {
        (stored + self.offset) * self.scale
    }

    fn key(&self) -> PresentationKey {
        PresentationKey {
            unit: self.unit.clone(),
            offset_bits: self.offset.to_bits(),
            scale_bits: self.scale.to_bits(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PresentationKey {
    unit: String,
    offset_bits: u64,
    scale_bits: u64,
}

/// Value presentations of one document, deduplicated.
///
/// Tracks which entries were already written so each is emitted once, ahead
/// of the first task referring to it.
#[derive(Debug, Clone, Default)]
pub struct ValuePresentations {
    entries: Vec<ValuePresentation>,
    by_key: HashMap<PresentationKey, usize>,
    written: usize,
}

impl ValuePresentations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presentation id for a variable's unit, allocating one if needed.
    ///
    /// Variables without a user unit get `None`.
    pub fn register(
        &mut self,
        unit: &VariableUnit,
        decimals: u8,
        ids: &mut dyn IdGenerator,
    ) -> Option<String> {
        let candidate = match unit {
            VariableUnit::Canonical {
                canonical,
                user: Some(user),
            } => ValuePresentation::for_units(String::new(), canonical, user, decimals)?,
            VariableUnit::Raw { user: Some(user) } => {
                ValuePresentation::label(String::new(), user, decimals)
            }
            _ => return None,
        };

        let key = candidate.key();
        if let Some(&index) = self.by_key.get(&key) {
            return Some(self.entries[index].id.clone());
        }

        let id = ids.next_id(VPN_PREFIX);
        self.by_key.insert(key, self.entries.len());
        self.entries.push(ValuePresentation {
            id: id.clone(),
            ..candidate
        });
        Some(id)
    }

    /// Id of an already registered presentation for `unit`.
    pub fn id_for(&self, unit: &VariableUnit, decimals: u8) -> Option<&str> {
        let candidate = match unit {
            VariableUnit::Canonical {
                canonical,
                user: Some(user),
            } => ValuePresentation::for_units(String::new(), canonical, user, decimals)?,
            VariableUnit::Raw { user: Some(user) } => {
                ValuePresentation::label(String::new(), user, decimals)
            }
            _ => return None,
        };
        self.by_key
            .get(&candidate.key())
            .map(|&index| self.entries[index].id.as_str())
    }

    /// Entries registered since the last call, marking them written.
    pub fn take_unwritten(&mut self) -> &[ValuePresentation] {
        let start = self.written;
        self.written = self.entries.len();
        &self.entries[start..]
    }

    pub fn get(&self, id: &str) -> Option<&ValuePresentation> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValuePresentation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
