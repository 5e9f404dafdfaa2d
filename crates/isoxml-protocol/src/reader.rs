//! Reading task data back into zone tables and grids.

use std::collections::HashMap;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use grid_codec::{
    CodeGrid, DataVariable, GridBinaryCodec, TreatmentZone, VariableUnit, ZoneCode, ZoneTable,
};
use isoxml_common::{GeoPoint, OwnerChain};
use unit_system::UnitConverter;

use crate::error::{CodecError, CodecResult};
use crate::presentation::ValuePresentation;
use crate::task::{GridDefinition, Task};

/// Everything read from a task data fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskData {
    pub presentations: Vec<ValuePresentation>,
    pub tasks: Vec<Task>,
}

impl TaskData {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }
}

/// Parses `TSK` and `VPN` elements, ignoring everything else.
#[derive(Debug, Clone, Default)]
pub struct TaskDataReader {
    converter: UnitConverter,
}

impl TaskDataReader {
    pub fn new(converter: UnitConverter) -> Self {
        Self { converter }
    }

    /// Parse a document or fragment.
    ///
    /// DDIs resolve to canonical units and presentation references to user
    /// units, so the zone tables compare equal to the ones that were written.
    pub fn read(&self, xml: &str) -> CodecResult<TaskData> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut state = ParseState::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => state.open(&e, false)?,
                Event::Empty(e) => state.open(&e, true)?,
                Event::End(e) => state.close(e.name().as_ref()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let ParseState {
            presentations,
            tasks,
            ..
        } = state;

        let by_id: HashMap<&str, &ValuePresentation> = presentations
            .iter()
            .map(|vpn| (vpn.id.as_str(), vpn))
            .collect();
        let tasks = tasks
            .into_iter()
            .map(|raw| self.resolve_task(raw, &by_id))
            .collect::<CodecResult<Vec<_>>>()?;

        debug!(
            tasks = tasks.len(),
            presentations = presentations.len(),
            "Read task data"
        );

        Ok(TaskData {
            presentations,
            tasks,
        })
    }

    /// Value of a variable in the unit the user originally supplied.
    pub fn user_value(&self, variable: &DataVariable) -> f64 {
        match &variable.unit {
            VariableUnit::Canonical {
                canonical,
                user: Some(user),
            } => self
                .converter
                .from_canonical(variable.value, canonical, user)
                .unwrap_or(variable.value),
            _ => variable.value,
        }
    }

    fn resolve_task(
        &self,
        raw: RawTask,
        presentations: &HashMap<&str, &ValuePresentation>,
    ) -> CodecResult<Task> {
        let grid = raw.grid.ok_or(CodecError::MissingElement {
            parent: "TSK",
            element: "GRD",
        })?;

        let mut zones = ZoneTable::new();
        for zone in raw.zones {
            if zones.contains(zone.code) {
                return Err(CodecError::InvalidAttribute {
                    element: "TZN",
                    attribute: "A",
                    value: zone.code.to_string(),
                });
            }
            let mut treatment = TreatmentZone::new(zone.name);
            for value in zone.values {
                treatment.push(self.resolve_value(value, presentations)?);
            }
            zones.push(zone.code, treatment);
        }

        Ok(Task {
            id: raw.id,
            description: raw.description,
            owners: raw.owners,
            status: raw.status,
            loss_of_signal_code: raw.loss_of_signal_code,
            out_of_field_code: raw.out_of_field_code,
            zones,
            grid,
        })
    }

    fn resolve_value(
        &self,
        raw: RawValue,
        presentations: &HashMap<&str, &ValuePresentation>,
    ) -> CodecResult<DataVariable> {
        let presentation = match raw.presentation {
            Some(id) => Some(
                presentations
                    .get(id.as_str())
                    .copied()
                    .ok_or(CodecError::UnknownPresentation(id))?,
            ),
            None => None,
        };

        let unit = match raw.ddi {
            Some(ddi) => {
                let registry = self.converter.registry();
                let canonical = registry.canonical_for_ddi(ddi).cloned().ok_or_else(|| {
                    CodecError::InvalidAttribute {
                        element: "PDV",
                        attribute: "A",
                        value: format!("{:04X}", ddi),
                    }
                })?;
                let user = presentation.and_then(|vpn| {
                    let unit = registry.lookup(&vpn.unit).cloned();
                    if unit.is_none() {
                        debug!(unit = %vpn.unit, "Unknown presentation unit");
                    }
                    unit
                });
                VariableUnit::Canonical { canonical, user }
            }
            None => VariableUnit::Raw {
                user: presentation.map(|vpn| vpn.unit.clone()),
            },
        };

        Ok(DataVariable {
            product_id: raw.product_id,
            value: raw.value,
            unit,
        })
    }
}

/// Decode a task's binary grid into codes.
///
/// The code width comes from the grid's recorded file length.
pub fn decode_codes(grid: &GridDefinition, data: &[u8]) -> CodecResult<CodeGrid> {
    let width = grid.code_width().ok_or_else(|| CodecError::InvalidAttribute {
        element: "GRD",
        attribute: "H",
        value: grid.file_length.to_string(),
    })?;
    Ok(GridBinaryCodec::new(width).decode(data, grid.columns, grid.rows, width)?)
}

/// Zone of every cell, row-major.
pub fn decode_cells<'t>(task: &'t Task, data: &[u8]) -> CodecResult<Vec<&'t TreatmentZone>> {
    let codes = decode_codes(&task.grid, data)?;
    Ok(task.zones.resolve_grid(&codes)?)
}

struct RawTask {
    id: String,
    description: String,
    owners: OwnerChain,
    status: u8,
    loss_of_signal_code: Option<ZoneCode>,
    out_of_field_code: Option<ZoneCode>,
    zones: Vec<RawZone>,
    grid: Option<GridDefinition>,
}

struct RawZone {
    code: ZoneCode,
    name: String,
    values: Vec<RawValue>,
}

struct RawValue {
    ddi: Option<u16>,
    value: f64,
    product_id: String,
    presentation: Option<String>,
}

#[derive(Default)]
struct ParseState {
    presentations: Vec<ValuePresentation>,
    tasks: Vec<RawTask>,
    task: Option<RawTask>,
    zone: Option<RawZone>,
}

impl ParseState {
    fn open(&mut self, element: &BytesStart<'_>, empty: bool) -> CodecResult<()> {
        let name = element.name();
        let attrs = Attributes::collect(element)?;
        match name.as_ref() {
            b"VPN" => self.presentations.push(parse_presentation(&attrs)?),
            b"TSK" => {
                self.task = Some(parse_task(&attrs)?);
                if empty {
                    self.close(b"TSK");
                }
            }
            b"TZN" if self.task.is_some() => {
                self.zone = Some(RawZone {
                    code: attrs.parse_code("TZN", "A")?,
                    name: attrs.get("B").unwrap_or_default().to_string(),
                    values: Vec::new(),
                });
                if empty {
                    self.close(b"TZN");
                }
            }
            b"PDV" => {
                if let Some(zone) = self.zone.as_mut() {
                    zone.values.push(parse_value(&attrs)?);
                }
            }
            b"GRD" => {
                if let Some(task) = self.task.as_mut() {
                    task.grid = Some(parse_grid(&attrs)?);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"TZN" => {
                if let (Some(task), Some(zone)) = (self.task.as_mut(), self.zone.take()) {
                    task.zones.push(zone);
                }
            }
            b"TSK" => {
                if let Some(task) = self.task.take() {
                    self.tasks.push(task);
                }
            }
            _ => {}
        }
    }
}

fn parse_task(attrs: &Attributes) -> CodecResult<RawTask> {
    Ok(RawTask {
        id: attrs.required("TSK", "A")?.to_string(),
        description: attrs.get("B").unwrap_or_default().to_string(),
        owners: OwnerChain {
            customer: attrs.get("C").map(str::to_string),
            farm: attrs.get("D").map(str::to_string),
            field: attrs.get("E").map(str::to_string),
        },
        status: attrs.parse("TSK", "G")?,
        loss_of_signal_code: attrs.parse_optional_code("TSK", "I")?,
        out_of_field_code: attrs.parse_optional_code("TSK", "J")?,
        zones: Vec::new(),
        grid: None,
    })
}

fn parse_value(attrs: &Attributes) -> CodecResult<RawValue> {
    let ddi = match attrs.get("A") {
        Some(hex) => Some(u16::from_str_radix(hex, 16).map_err(|_| {
            CodecError::InvalidAttribute {
                element: "PDV",
                attribute: "A",
                value: hex.to_string(),
            }
        })?),
        None => None,
    };

    Ok(RawValue {
        ddi,
        value: attrs.parse("PDV", "B")?,
        product_id: attrs.required("PDV", "C")?.to_string(),
        presentation: attrs.get("E").map(str::to_string),
    })
}

fn parse_grid(attrs: &Attributes) -> CodecResult<GridDefinition> {
    Ok(GridDefinition {
        origin: GeoPoint::new(attrs.parse("GRD", "A")?, attrs.parse("GRD", "B")?),
        cell_north: attrs.parse("GRD", "C")?,
        cell_east: attrs.parse("GRD", "D")?,
        columns: attrs.parse("GRD", "E")?,
        rows: attrs.parse("GRD", "F")?,
        file_name: attrs.required("GRD", "G")?.to_string(),
        file_length: attrs.parse("GRD", "H")?,
        grid_type: attrs.parse("GRD", "I")?,
        default_code: attrs
            .parse_optional_code("GRD", "J")?
            .unwrap_or(ZoneCode::Default),
    })
}

fn parse_presentation(attrs: &Attributes) -> CodecResult<ValuePresentation> {
    Ok(ValuePresentation {
        id: attrs.required("VPN", "A")?.to_string(),
        offset: attrs.parse("VPN", "B")?,
        scale: attrs.parse("VPN", "C")?,
        decimals: attrs.parse("VPN", "D")?,
        unit: attrs.get("E").unwrap_or_default().to_string(),
    })
}

/// Unescaped attributes of one element.
struct Attributes(Vec<(Vec<u8>, String)>);

impl Attributes {
    fn collect(element: &BytesStart<'_>) -> CodecResult<Self> {
        let mut values = Vec::new();
        for attr in element.attributes() {
            let attr = attr?;
            values.push((attr.key.as_ref().to_vec(), attr.unescape_value()?.into_owned()));
        }
        Ok(Self(values))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name.as_slice() == key.as_bytes())
            .map(|(_, value)| value.as_str())
    }

    fn required(&self, element: &'static str, key: &'static str) -> CodecResult<&str> {
        self.get(key).ok_or(CodecError::MissingAttribute {
            element,
            attribute: key,
        })
    }

    fn parse<T: FromStr>(&self, element: &'static str, key: &'static str) -> CodecResult<T> {
        let value = self.required(element, key)?;
        value.parse().map_err(|_| CodecError::InvalidAttribute {
            element,
            attribute: key,
            value: value.to_string(),
        })
    }

    fn parse_code(&self, element: &'static str, key: &'static str) -> CodecResult<ZoneCode> {
        let value: usize = self.parse(element, key)?;
        ZoneCode::from_value(value).ok_or_else(|| CodecError::InvalidAttribute {
            element,
            attribute: key,
            value: value.to_string(),
        })
    }

    fn parse_optional_code(
        &self,
        element: &'static str,
        key: &'static str,
    ) -> CodecResult<Option<ZoneCode>> {
        match self.get(key) {
            Some(_) => self.parse_code(element, key).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r#"
        <VPN A="VPN1" B="0" C="0.01" D="2" E="l/ha"/>
        <TSK A="TSK1" B="Corn" E="PFD1" G="1" I="253">
            <TZN A="1" B="Default"><PDV A="0001" B="0" C="PDT1" E="VPN1"/></TZN>
            <TZN A="253" B="Loss of GPS"><PDV A="0001" B="900" C="PDT1" E="VPN1"/></TZN>
            <TZN A="2" B="Zone 2"><PDV A="0001" B="500" C="PDT1" E="VPN1"/></TZN>
            <TZN A="3" B="Empty"/>
            <GRD A="42" B="-93.5" C="0.0001" D="0.00015" E="2" F="2" G="GRD00001" H="4" I="1" J="1"/>
        </TSK>"#;

    #[test]
    fn test_read_fragment() {
        let data = TaskDataReader::default().read(FRAGMENT).unwrap();
        assert_eq!(data.presentations.len(), 1);
        assert_eq!(data.tasks.len(), 1);

        let task = data.task("TSK1").unwrap();
        assert_eq!(task.description, "Corn");
        assert_eq!(task.owners.field.as_deref(), Some("PFD1"));
        assert!(task.owners.farm.is_none());
        assert_eq!(task.loss_of_signal_code, Some(ZoneCode::LossOfSignal));
        assert!(task.out_of_field_code.is_none());
        assert_eq!(task.zones.len(), 4);
        assert!(task.zones.get(ZoneCode::Ordinary(1)).unwrap().is_empty());

        let zone = task.zones.get(ZoneCode::Ordinary(0)).unwrap();
        let variable = zone.variable("PDT1").unwrap();
        assert_eq!(variable.value, 500.0);
        assert_eq!(variable.unit.canonical().unwrap().code, "mm3/m2");
        assert_eq!(variable.unit.user_code(), Some("l/ha"));

        assert_eq!(task.grid.columns, 2);
        assert_eq!(task.grid.binary_name(), "GRD00001.BIN");
    }

    #[test]
    fn test_duplicate_zone_code_is_rejected() {
        let xml = r#"<TSK A="TSK1" G="1">
            <TZN A="1" B="Default"/>
            <TZN A="1" B="Again"/>
            <GRD A="42" B="-93.5" C="0.0001" D="0.0001" E="1" F="1" G="GRD00001" H="1" I="1" J="1"/>
        </TSK>"#;
        let err = TaskDataReader::default().read(xml).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidAttribute {
                element: "TZN",
                attribute: "A",
                ref value,
            } if value == "1"
        ));
    }

    #[test]
    fn test_user_value() {
        let reader = TaskDataReader::default();
        let data = reader.read(FRAGMENT).unwrap();
        let zone = data.tasks[0].zones.get(ZoneCode::LossOfSignal).unwrap();
        let value = reader.user_value(zone.variable("PDT1").unwrap());
        assert!((value - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_cells() {
        let data = TaskDataReader::default().read(FRAGMENT).unwrap();
        let task = &data.tasks[0];
        let cells = decode_cells(task, &[253, 2, 1, 1]).unwrap();
        let names: Vec<&str> = cells.iter().map(|zone| zone.name.as_str()).collect();
        assert_eq!(names, vec!["Loss of GPS", "Zone 2", "Default", "Default"]);
    }

    #[test]
    fn test_decode_cells_unknown_code() {
        let data = TaskDataReader::default().read(FRAGMENT).unwrap();
        let err = decode_cells(&data.tasks[0], &[254, 2, 1, 1]).unwrap_err();
        assert!(matches!(err, CodecError::Grid(_)));
    }

    #[test]
    fn test_raw_value_without_ddi() {
        let xml = r#"<VPN A="VPN7" B="0" C="1" D="0" E="bags"/>
            <TSK A="TSK9" G="1"><TZN A="1" B="Default"><PDV B="4" C="PDT1" E="VPN7"/></TZN>
            <GRD A="0" B="0" C="1" D="1" E="1" F="1" G="GRD00009" H="1" I="1" J="1"/></TSK>"#;
        let data = TaskDataReader::default().read(xml).unwrap();
        let zone = data.tasks[0].zones.get(ZoneCode::Default).unwrap();
        assert_eq!(
            zone.variable("PDT1").unwrap().unit,
            VariableUnit::Raw {
                user: Some("bags".to_string())
            }
        );
    }

    #[test]
    fn test_missing_grid() {
        let xml = r#"<TSK A="TSK1" G="1"><TZN A="1" B="Default"/></TSK>"#;
        let err = TaskDataReader::default().read(xml).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingElement {
                parent: "TSK",
                element: "GRD"
            }
        ));
    }

    #[test]
    fn test_unknown_presentation() {
        let xml = r#"<TSK A="TSK1" G="1"><TZN A="1" B="Default"><PDV B="4" C="PDT1" E="VPN404"/></TZN>
            <GRD A="0" B="0" C="1" D="1" E="1" F="1" G="GRD00001" H="1" I="1" J="1"/></TSK>"#;
        let err = TaskDataReader::default().read(xml).unwrap_err();
        assert!(matches!(err, CodecError::UnknownPresentation(id) if id == "VPN404"));
    }

    #[test]
    fn test_invalid_zone_code() {
        let xml = r#"<TSK A="TSK1" G="1"><TZN A="0" B="Bad"/></TSK>"#;
        let err = TaskDataReader::default().read(xml).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidAttribute {
                element: "TZN",
                attribute: "A",
                ..
            }
        ));
    }
}
