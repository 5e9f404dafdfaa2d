//! Prescriptions → task data → zones, through the public API only.

use grid_codec::{CodeWidth, VariableUnit, ZoneCode};
use isoxml_common::{InMemoryCatalog, Prescription, Quantity, SequentialIds, ValidationError};
use isoxml_protocol::{
    decode_cells, CodecConfig, CodecError, DirectorySink, MemorySink, PrescriptionCodec,
    TaskDataDocument, TaskDataReader, TaskSummary,
};
use test_utils::{
    assert_relative_eq, create_unique_raster, ids, init_test_logging, prescription_with_raster,
    prescription_without_origin, read_crate_test_file, sample_catalog, signal_lost_prescription,
    two_by_two_prescription, two_product_prescription,
};

fn codec() -> PrescriptionCodec {
    PrescriptionCodec::new(CodecConfig::default()).unwrap()
}

fn in_canonical_units(mut prescription: Prescription) -> Prescription {
    prescription.rate_unit = Some("mm3/m2".to_string());
    prescription.loss_of_signal_rate = Some(Quantity::new(9.0, "mm3/m2"));
    prescription.out_of_field_rate = Some(Quantity::new(3.0, "mm3/m2"));
    prescription
}

fn encode_one(prescription: &Prescription) -> (MemorySink, TaskSummary) {
    let catalog = sample_catalog();
    let mut document = TaskDataDocument::new(MemorySink::new(), SequentialIds::new());
    let summary = codec()
        .encode_prescription(prescription, &catalog, &mut document)
        .unwrap();
    (document.into_sink(), summary)
}

fn fixture_catalog() -> InMemoryCatalog {
    let json = read_crate_test_file("isoxml-protocol", "catalog.json").unwrap();
    InMemoryCatalog::from_json(&json).unwrap()
}

#[test]
fn test_two_by_two_without_flagged_cells() {
    init_test_logging();
    let (sink, summary) = encode_one(&in_canonical_units(two_by_two_prescription()));

    assert_eq!(summary.zones, 2);
    assert_eq!(summary.code_width, CodeWidth::One);
    assert_eq!(sink.binary(&summary.grid_file).unwrap().as_ref(), &[2, 2, 1, 1]);

    let xml = sink.xml();
    assert!(xml.contains(r#"<TZN A="1" B="Default"><PDV A="0001" B="0" C="PDT1"/></TZN>"#));
    assert!(xml.contains(r#"<TZN A="2" B="Zone 2"><PDV A="0001" B="5" C="PDT1"/></TZN>"#));
    let tsk_tag = &xml[..xml.find('>').unwrap()];
    assert!(!tsk_tag.contains(" I="));
    assert!(!tsk_tag.contains(" J="));
    assert!(!xml.contains(r#"<TZN A="253""#));
}

#[test]
fn test_two_by_two_with_signal_lost_cell() {
    let (sink, summary) = encode_one(&in_canonical_units(signal_lost_prescription()));

    assert_eq!(summary.zones, 3);
    assert_eq!(
        sink.binary(&summary.grid_file).unwrap().as_ref(),
        &[253, 2, 1, 1]
    );

    let xml = sink.xml();
    let tsk_tag = &xml[..xml.find('>').unwrap()];
    assert!(tsk_tag.contains(r#" I="253""#));
    assert!(!tsk_tag.contains(" J="));
    assert!(xml.contains(
        r#"<TZN A="253" B="Loss of GPS"><PDV A="0001" B="9" C="PDT1"/></TZN>"#
    ));

    let default_at = xml.find(r#"<TZN A="1""#).unwrap();
    let loss_at = xml.find(r#"<TZN A="253""#).unwrap();
    let zone_at = xml.find(r#"<TZN A="2""#).unwrap();
    assert!(default_at < loss_at && loss_at < zone_at);
}

#[test]
fn test_owner_chain_attributes() {
    let (sink, _) = encode_one(&two_by_two_prescription());
    assert!(sink
        .xml()
        .contains(r#"C="CTR1" D="FRM1" E="PFD1" G="1""#));

    let mut orphan = two_by_two_prescription();
    orphan.field_id = ids::ORPHAN_FIELD;
    let (sink, _) = encode_one(&orphan);
    let xml = sink.xml();
    let tsk_tag = &xml[xml.find("<TSK").unwrap()..];
    let tsk_tag = &tsk_tag[..tsk_tag.find('>').unwrap()];
    assert!(tsk_tag.contains(r#"E="PFD2""#));
    assert!(!tsk_tag.contains(" D="));
    assert!(!tsk_tag.contains(" C="));
}

#[test]
fn test_user_units_get_value_presentations() {
    let (sink, _) = encode_one(&signal_lost_prescription());
    let xml = sink.xml();

    let vpn_at = xml.find("<VPN").unwrap();
    assert!(vpn_at < xml.find("<TSK").unwrap());
    assert!(xml.contains(r#"<VPN A="VPN1" B="0" C="0.01" D="2" E="l/ha"/>"#));
    assert!(xml.contains(r#"<PDV A="0001" B="500" C="PDT1" E="VPN1"/>"#));
    assert!(xml.contains(r#"<PDV A="0001" B="900" C="PDT1" E="VPN1"/>"#));
}

#[test]
fn test_round_trip_reproduces_cells() {
    let catalog = fixture_catalog();
    let codec = codec();
    let mut document = TaskDataDocument::new(MemorySink::new(), SequentialIds::new());
    let report = codec.encode_all(&catalog, &mut document).unwrap();
    assert_eq!(report.encoded.len(), 2);
    let sink = document.into_sink();

    let reader = TaskDataReader::default();
    let data = reader.read(sink.xml()).unwrap();
    assert_eq!(data.tasks.len(), 2);

    let encoded = catalog
        .prescriptions
        .iter()
        .filter(|p| p.is_valid())
        .zip(&report.encoded);
    for (prescription, summary) in encoded {
        let prepared = codec.prepare(prescription, &catalog).unwrap();
        let task = data.task(&summary.task_id).unwrap();
        assert_eq!(task.zones, prepared.reduction.zones);

        let binary = sink.binary(&summary.grid_file).unwrap();
        let cells = decode_cells(task, binary).unwrap();
        let expected = prepared
            .reduction
            .zones
            .resolve_grid(&prepared.reduction.grid)
            .unwrap();
        assert_eq!(cells, expected);
    }
}

#[test]
fn test_user_values_survive_round_trip() {
    let catalog = fixture_catalog();
    let mut document = TaskDataDocument::new(MemorySink::new(), SequentialIds::new());
    codec().encode_all(&catalog, &mut document).unwrap();
    let sink = document.into_sink();

    let reader = TaskDataReader::default();
    let data = reader.read(sink.xml()).unwrap();

    // prescription 3: 4 and 2.5 gal/ac
    let task = data.task("TSK2").unwrap();
    assert_eq!(task.description, "Seed and starter");
    let zone = task.zones.get(ZoneCode::Ordinary(1)).unwrap();
    let first = zone.variable("PDT1").unwrap();
    assert_eq!(first.unit.user_code(), Some("gal/ac"));
    assert_relative_eq!(reader.user_value(first), 4.0, 1e-9);
    assert_relative_eq!(reader.user_value(zone.variable("PDT2").unwrap()), 2.5, 1e-9);

    // the first cell has no PDT2 rate, so its zone has no PDT2 variable
    let partial = task.zones.get(ZoneCode::Ordinary(0)).unwrap();
    assert!(partial.variable("PDT2").is_none());
}

#[test]
fn test_batch_report_and_layout() {
    let catalog = fixture_catalog();
    let mut document = TaskDataDocument::new(MemorySink::new(), SequentialIds::new());
    let report = codec().encode_all(&catalog, &mut document).unwrap();

    assert_eq!(report.total(), 3);
    assert!(!report.is_complete());
    assert_eq!(
        report.skipped,
        vec![(2, ValidationError::MissingOrigin)]
    );
    assert!(report.failed.is_empty());

    let first = &report.encoded[0];
    assert_eq!(first.task_id, "TSK1");
    assert_eq!(first.grid_file, "GRD00001.BIN");
    assert_eq!(first.zones, 5);
    assert_eq!(report.encoded[1].grid_file, "GRD00002.BIN");

    let sink = document.into_sink();
    assert_eq!(sink.binary_count(), 2);
    assert_eq!(
        sink.binary("GRD00001.BIN").unwrap().as_ref(),
        &[253, 2, 3, 1, 254, 3]
    );

    // every presentation is written ahead of the first task
    let xml = sink.xml();
    let last_vpn = xml.rfind("<VPN").unwrap();
    assert!(last_vpn < xml.find("<TSK").unwrap());
    assert_eq!(document_vpn_count(xml), 2);
}

#[test]
fn test_two_products_share_one_grid() {
    let catalog = sample_catalog()
        .with_prescription(two_product_prescription())
        .with_prescription(prescription_without_origin());
    let mut document = TaskDataDocument::new(MemorySink::new(), SequentialIds::new());
    let report = codec().encode_all(&catalog, &mut document).unwrap();

    assert_eq!(report.skipped, vec![(4, ValidationError::MissingOrigin)]);
    assert_eq!(report.encoded.len(), 1);
    assert_eq!(report.encoded[0].zones, 3);

    let sink = document.into_sink();
    assert_eq!(
        sink.binary(&report.encoded[0].grid_file).unwrap().as_ref(),
        &[2, 3, 2, 1]
    );
    assert_eq!(document_vpn_count(sink.xml()), 1);

    let reader = TaskDataReader::default();
    let data = reader.read(sink.xml()).unwrap();
    let task = data.task(&report.encoded[0].task_id).unwrap();
    let zone = task.zones.get(ZoneCode::Ordinary(1)).unwrap();
    assert_eq!(zone.variables.len(), 2);
    assert_relative_eq!(reader.user_value(zone.variable("PDT1").unwrap()), 5.0, 1e-9);
    assert_relative_eq!(reader.user_value(zone.variable("PDT2").unwrap()), 2.0, 1e-9);
}

fn document_vpn_count(xml: &str) -> usize {
    xml.matches("<VPN ").count()
}

#[test]
fn test_overflow_fails_only_that_prescription() {
    let narrow = CodecConfig::default().with_max_code_width(CodeWidth::One);
    let codec = PrescriptionCodec::new(narrow).unwrap();
    let catalog = sample_catalog()
        .with_prescription(prescription_with_raster(7, create_unique_raster(20, 20)))
        .with_prescription(two_by_two_prescription());

    let mut document = TaskDataDocument::new(MemorySink::new(), SequentialIds::new());
    let report = codec.encode_all(&catalog, &mut document).unwrap();

    assert_eq!(report.encoded.len(), 1);
    assert_eq!(report.encoded[0].prescription_id, 1);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0],
        (
            7,
            CodecError::EncodingOverflow {
                ceiling: CodeWidth::One,
                ..
            }
        )
    ));

    let sink = document.into_sink();
    assert_eq!(sink.binary_count(), 1);
    assert_eq!(sink.xml().matches("<TSK ").count(), 1);
}

#[test]
fn test_parallel_and_serial_output_match() {
    let catalog = fixture_catalog();

    let mut outputs = Vec::new();
    for parallel in [true, false] {
        let codec = PrescriptionCodec::new(CodecConfig::default().with_parallel(parallel)).unwrap();
        let mut document = TaskDataDocument::new(MemorySink::new(), SequentialIds::new());
        codec.encode_all(&catalog, &mut document).unwrap();
        outputs.push(document.into_sink());
    }

    assert_eq!(outputs[0].xml(), outputs[1].xml());
    let first: Vec<_> = outputs[0].binaries().collect();
    let second: Vec<_> = outputs[1].binaries().collect();
    assert_eq!(first, second);
}

#[test]
fn test_directory_sink_document() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = fixture_catalog();
    let sink = DirectorySink::create(dir.path()).unwrap();
    let mut document = TaskDataDocument::new(sink, SequentialIds::new());
    let report = codec().encode_all(&catalog, &mut document).unwrap();
    let path = document.into_sink().finish().unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    let data = TaskDataReader::default().read(&xml).unwrap();
    assert_eq!(data.tasks.len(), report.encoded.len());
    assert_eq!(data.presentations.len(), 2);

    for task in &data.tasks {
        let binary = std::fs::read(dir.path().join(task.grid.binary_name())).unwrap();
        assert_eq!(binary.len(), task.grid.file_length);
        let cells = decode_cells(task, &binary).unwrap();
        assert_eq!(cells.len(), task.grid.columns * task.grid.rows);
    }
}

#[test]
fn test_mismatched_overlay_unit_stays_raw() {
    let mut prescription = two_by_two_prescription();
    if let Some(cell) = prescription
        .rates
        .as_mut()
        .and_then(|raster| raster.get_mut(1, 1))
    {
        cell.condition.out_of_field = true;
    }
    prescription.out_of_field_rate = Some(Quantity::new(3.0, "kg/ha"));
    let (sink, _) = encode_one(&prescription);

    let data = TaskDataReader::default().read(sink.xml()).unwrap();
    let zone = data.tasks[0].zones.get(ZoneCode::OutOfField).unwrap();
    let variable = zone.variable("PDT1").unwrap();
    assert_eq!(variable.value, 3.0);
    assert_eq!(
        variable.unit,
        VariableUnit::Raw {
            user: Some("kg/ha".to_string())
        }
    );
    assert!(sink.xml().contains(r#"<PDV B="3" C="PDT1" E="VPN2"/>"#));
}
