//! XML serialization of tasks and value presentations.
//!
//! Element and attribute names follow ISO 11783-10: single upper-case
//! letters, optional attributes left out entirely.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use grid_codec::{DataVariable, ZoneEntry};
use unit_system::UnitRegistry;

use crate::error::CodecResult;
use crate::presentation::{ValuePresentation, ValuePresentations};
use crate::task::{GridDefinition, Task};

/// Serializes task data elements into XML fragments.
pub struct TaskDataWriter<'a> {
    registry: &'a UnitRegistry,
    presentations: &'a ValuePresentations,
    vpn_decimals: u8,
}

impl<'a> TaskDataWriter<'a> {
    pub fn new(
        registry: &'a UnitRegistry,
        presentations: &'a ValuePresentations,
        vpn_decimals: u8,
    ) -> Self {
        Self {
            registry,
            presentations,
            vpn_decimals,
        }
    }

    /// `TSK` element with its `TZN` and `GRD` children.
    pub fn task_xml(&self, task: &Task) -> CodecResult<String> {
        let mut writer = Writer::new(Vec::new());

        let mut tsk = BytesStart::new("TSK");
        tsk.push_attribute(("A", task.id.as_str()));
        tsk.push_attribute(("B", task.description.as_str()));
        if let Some(customer) = &task.owners.customer {
            tsk.push_attribute(("C", customer.as_str()));
        }
        if let Some(farm) = &task.owners.farm {
            tsk.push_attribute(("D", farm.as_str()));
        }
        if let Some(field) = &task.owners.field {
            tsk.push_attribute(("E", field.as_str()));
        }
        tsk.push_attribute(("G", task.status.to_string().as_str()));
        if let Some(code) = task.loss_of_signal_code {
            tsk.push_attribute(("I", code.value().to_string().as_str()));
        }
        if let Some(code) = task.out_of_field_code {
            tsk.push_attribute(("J", code.value().to_string().as_str()));
        }
        writer.write_event(Event::Start(tsk))?;

        for entry in &task.zones {
            self.write_zone(&mut writer, entry)?;
        }
        write_grid(&mut writer, &task.grid)?;

        writer.write_event(Event::End(BytesEnd::new("TSK")))?;
        Ok(into_string(writer))
    }

    /// `VPN` elements, one after another.
    pub fn presentations_xml(&self, presentations: &[ValuePresentation]) -> CodecResult<String> {
        let mut writer = Writer::new(Vec::new());
        for vpn in presentations {
            let mut element = BytesStart::new("VPN");
            element.push_attribute(("A", vpn.id.as_str()));
            element.push_attribute(("B", format_number(vpn.offset).as_str()));
            element.push_attribute(("C", format_number(vpn.scale).as_str()));
            element.push_attribute(("D", vpn.decimals.to_string().as_str()));
            element.push_attribute(("E", vpn.unit.as_str()));
            writer.write_event(Event::Empty(element))?;
        }
        Ok(into_string(writer))
    }

    fn write_zone(&self, writer: &mut Writer<Vec<u8>>, entry: &ZoneEntry) -> CodecResult<()> {
        let mut tzn = BytesStart::new("TZN");
        tzn.push_attribute(("A", entry.code.value().to_string().as_str()));
        tzn.push_attribute(("B", entry.zone.name.as_str()));

        if entry.zone.is_empty() {
            writer.write_event(Event::Empty(tzn))?;
            return Ok(());
        }

        writer.write_event(Event::Start(tzn))?;
        for variable in &entry.zone.variables {
            writer.write_event(Event::Empty(self.variable_element(variable)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("TZN")))?;
        Ok(())
    }

    fn variable_element(&self, variable: &DataVariable) -> BytesStart<'static> {
        let mut pdv = BytesStart::new("PDV");
        if let Some(ddi) = variable
            .unit
            .canonical()
            .and_then(|unit| self.registry.ddi_of(unit))
        {
            pdv.push_attribute(("A", format!("{:04X}", ddi).as_str()));
        }
        pdv.push_attribute(("B", format_number(variable.value).as_str()));
        pdv.push_attribute(("C", variable.product_id.as_str()));
        if let Some(vpn) = self.presentations.id_for(&variable.unit, self.vpn_decimals) {
            pdv.push_attribute(("E", vpn));
        }
        pdv
    }
}

fn write_grid(writer: &mut Writer<Vec<u8>>, grid: &GridDefinition) -> CodecResult<()> {
    let mut grd = BytesStart::new("GRD");
    grd.push_attribute(("A", format_number(grid.origin.latitude).as_str()));
    grd.push_attribute(("B", format_number(grid.origin.longitude).as_str()));
    grd.push_attribute(("C", format_number(grid.cell_north).as_str()));
    grd.push_attribute(("D", format_number(grid.cell_east).as_str()));
    grd.push_attribute(("E", grid.columns.to_string().as_str()));
    grd.push_attribute(("F", grid.rows.to_string().as_str()));
    grd.push_attribute(("G", grid.file_name.as_str()));
    grd.push_attribute(("H", grid.file_length.to_string().as_str()));
    grd.push_attribute(("I", grid.grid_type.to_string().as_str()));
    grd.push_attribute(("J", grid.default_code.value().to_string().as_str()));
    writer.write_event(Event::Empty(grd))?;
    Ok(())
}

/// Shortest text that parses back to the same `f64`.
pub(crate) fn format_number(value: f64) -> String {
    format!("{}", value)
}

fn into_string(writer: Writer<Vec<u8>>) -> String {
    // every byte written came from a &str
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}
