//! Common test fixtures for prescription encoding tests.
//!
//! This module provides pre-defined catalogs and prescriptions that cover the
//! usual encoding scenarios.

use isoxml_common::{
    CellCondition, GeoPoint, InMemoryCatalog, Prescription, Quantity, RasterCell, RateRaster,
    ReferenceId,
};

/// Reference ids shared by the fixture catalog.
pub mod ids {
    use super::ReferenceId;

    pub const CUSTOMER: ReferenceId = 10;
    pub const FARM: ReferenceId = 20;
    pub const FIELD: ReferenceId = 30;
    /// A field whose farm is not in the catalog.
    pub const ORPHAN_FIELD: ReferenceId = 31;
    pub const PRODUCT: ReferenceId = 40;
    pub const SECOND_PRODUCT: ReferenceId = 41;
}

/// Common field origins.
pub mod origins {
    use super::GeoPoint;

    /// Central Iowa.
    pub const IOWA: GeoPoint = GeoPoint {
        latitude: 42.0,
        longitude: -93.5,
    };
}

/// Catalog with a complete customer → farm → field chain, an orphan field and
/// two products.
pub fn sample_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_customer(ids::CUSTOMER, "CTR1")
        .with_farm(ids::FARM, "FRM1", Some(ids::CUSTOMER))
        .with_field(ids::FIELD, "PFD1", Some(ids::FARM))
        .with_field(ids::ORPHAN_FIELD, "PFD2", Some(999))
        .with_product(ids::PRODUCT, "PDT1")
        .with_product(ids::SECOND_PRODUCT, "PDT2")
}

/// A prescription with every required attribute set, using 10 m square cells.
pub fn prescription_with_raster(id: ReferenceId, raster: RateRaster) -> Prescription {
    let mut prescription = Prescription::new(id, format!("Prescription {}", id), ids::FIELD);
    prescription.origin = Some(origins::IOWA);
    prescription.cell_width = Some(Quantity::new(10.0, "m"));
    prescription.cell_height = Some(Quantity::new(10.0, "m"));
    prescription.rates = Some(raster);
    prescription.rate_unit = Some("l/ha".to_string());
    prescription.product_ids = vec![ids::PRODUCT];
    prescription
}

/// The 2×2 raster `[[5, 5], [0, 0]]` with a loss-of-signal rate of 9 and an
/// out-of-field rate of 3, neither of which marks any cell.
pub fn two_by_two_prescription() -> Prescription {
    let raster = RateRaster::from_rows(&[vec![5.0, 5.0], vec![0.0, 0.0]]);
    let mut prescription = prescription_with_raster(1, raster);
    prescription.loss_of_signal_rate = Some(Quantity::new(9.0, "l/ha"));
    prescription.out_of_field_rate = Some(Quantity::new(3.0, "l/ha"));
    prescription
}

/// Same raster as [`two_by_two_prescription`] with cell (0, 0) marked as
/// having lost signal.
pub fn signal_lost_prescription() -> Prescription {
    let mut prescription = two_by_two_prescription();
    if let Some(cell) = prescription
        .rates
        .as_mut()
        .and_then(|raster| raster.get_mut(0, 0))
    {
        cell.condition = CellCondition::signal_lost();
    }
    prescription
}

/// A two-product prescription; each cell carries one rate per product.
pub fn two_product_prescription() -> Prescription {
    let cells = vec![
        RasterCell::with_rates(&[5.0, 1.0]),
        RasterCell::with_rates(&[5.0, 2.0]),
        RasterCell::with_rates(&[5.0, 1.0]),
        RasterCell::with_rates(&[0.0, 0.0]),
    ];
    let mut prescription = prescription_with_raster(3, RateRaster::new(2, 2, cells));
    prescription.product_ids = vec![ids::PRODUCT, ids::SECOND_PRODUCT];
    prescription
}

/// A prescription missing its origin, which fails validation.
pub fn prescription_without_origin() -> Prescription {
    let mut prescription = two_by_two_prescription();
    prescription.id = 4;
    prescription.origin = None;
    prescription
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoxml_common::{Catalog, OwnerChain};

    #[test]
    fn test_sample_catalog_chain() {
        let catalog = sample_catalog();
        let chain = OwnerChain::resolve(&catalog, ids::FIELD);
        assert_eq!(chain.field.as_deref(), Some("PFD1"));
        assert_eq!(chain.farm.as_deref(), Some("FRM1"));
        assert_eq!(chain.customer.as_deref(), Some("CTR1"));

        let orphan = OwnerChain::resolve(&catalog, ids::ORPHAN_FIELD);
        assert_eq!(orphan.field.as_deref(), Some("PFD2"));
        assert!(orphan.farm.is_none());
        assert!(orphan.customer.is_none());
        assert_eq!(catalog.product_iso_id(ids::PRODUCT).as_deref(), Some("PDT1"));
    }

    #[test]
    fn test_fixture_prescriptions_validate() {
        assert!(two_by_two_prescription().is_valid());
        assert!(signal_lost_prescription().is_valid());
        assert!(two_product_prescription().is_valid());
        assert!(!prescription_without_origin().is_valid());
    }
}
