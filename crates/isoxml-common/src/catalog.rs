//! Catalog lookups used while encoding prescriptions.
//!
//! The catalog owns the prescriptions and the reference lists (fields, farms,
//! customers, products). The encoder only needs to turn internal numeric ids
//! into ISO text ids and to follow the field → farm → customer chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::prescription::Prescription;

/// Internal numeric reference id used by the catalog.
pub type ReferenceId = u32;

/// Read-only lookup services over a catalog.
///
/// Every lookup returns `None` for "not found"; none of them fail.
pub trait Catalog: Send + Sync {
    fn prescriptions(&self) -> &[Prescription];

    fn field_iso_id(&self, field: ReferenceId) -> Option<String>;
    fn farm_iso_id(&self, farm: ReferenceId) -> Option<String>;
    fn customer_iso_id(&self, customer: ReferenceId) -> Option<String>;
    fn product_iso_id(&self, product: ReferenceId) -> Option<String>;

    /// Farm a field belongs to.
    fn farm_of_field(&self, field: ReferenceId) -> Option<ReferenceId>;
    /// Customer (grower) a farm belongs to.
    fn customer_of_farm(&self, farm: ReferenceId) -> Option<ReferenceId>;
}

/// ISO ids resolved along the field → farm → customer chain.
///
/// A link is only looked up when the previous one resolved, so a field
/// without a farm never yields a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerChain {
    pub field: Option<String>,
    pub farm: Option<String>,
    pub customer: Option<String>,
}

impl OwnerChain {
    /// Walk the chain starting at `field`, stopping at the first absent link.
    pub fn resolve<C: Catalog + ?Sized>(catalog: &C, field: ReferenceId) -> Self {
        let field_iso = non_empty(catalog.field_iso_id(field));

        let farm = field_iso
            .as_ref()
            .and_then(|_| catalog.farm_of_field(field))
            .and_then(|farm| non_empty(catalog.farm_iso_id(farm)).map(|iso| (farm, iso)));

        let customer = farm
            .as_ref()
            .and_then(|(farm, _)| catalog.customer_of_farm(*farm))
            .and_then(|customer| non_empty(catalog.customer_iso_id(customer)));

        Self {
            field: field_iso,
            farm: farm.map(|(_, iso)| iso),
            customer,
        }
    }
}

/// Resolve a product id, treating an empty string as absent.
pub fn resolve_product<C: Catalog + ?Sized>(catalog: &C, product: ReferenceId) -> Option<String> {
    non_empty(catalog.product_iso_id(product))
}

fn non_empty(id: Option<String>) -> Option<String> {
    id.filter(|s| !s.is_empty())
}

/// A field entry of the in-memory catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    pub iso_id: String,
    #[serde(default)]
    pub farm: Option<ReferenceId>,
}

/// A farm entry of the in-memory catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmEntry {
    pub iso_id: String,
    #[serde(default)]
    pub customer: Option<ReferenceId>,
}

/// Simple catalog backed by ordered maps, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
    #[serde(default)]
    pub fields: BTreeMap<ReferenceId, FieldEntry>,
    #[serde(default)]
    pub farms: BTreeMap<ReferenceId, FarmEntry>,
    #[serde(default)]
    pub customers: BTreeMap<ReferenceId, String>,
    #[serde(default)]
    pub products: BTreeMap<ReferenceId, String>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_field(
        mut self,
        id: ReferenceId,
        iso_id: impl Into<String>,
        farm: Option<ReferenceId>,
    ) -> Self {
        self.fields.insert(
            id,
            FieldEntry {
                iso_id: iso_id.into(),
                farm,
            },
        );
        self
    }

    pub fn with_farm(
        mut self,
        id: ReferenceId,
        iso_id: impl Into<String>,
        customer: Option<ReferenceId>,
    ) -> Self {
        self.farms.insert(
            id,
            FarmEntry {
                iso_id: iso_id.into(),
                customer,
            },
        );
        self
    }

    pub fn with_customer(mut self, id: ReferenceId, iso_id: impl Into<String>) -> Self {
        self.customers.insert(id, iso_id.into());
        self
    }

    pub fn with_product(mut self, id: ReferenceId, iso_id: impl Into<String>) -> Self {
        self.products.insert(id, iso_id.into());
        self
    }

    pub fn with_prescription(mut self, prescription: Prescription) -> Self {
        self.prescriptions.push(prescription);
        self
    }
}

impl Catalog for InMemoryCatalog {
    fn prescriptions(&self) -> &[Prescription] {
        &self.prescriptions
    }

    fn field_iso_id(&self, field: ReferenceId) -> Option<String> {
        self.fields.get(&field).map(|f| f.iso_id.clone())
    }

    fn farm_iso_id(&self, farm: ReferenceId) -> Option<String> {
        self.farms.get(&farm).map(|f| f.iso_id.clone())
    }

    fn customer_iso_id(&self, customer: ReferenceId) -> Option<String> {
        self.customers.get(&customer).cloned()
    }

    fn product_iso_id(&self, product: ReferenceId) -> Option<String> {
        self.products.get(&product).cloned()
    }

    fn farm_of_field(&self, field: ReferenceId) -> Option<ReferenceId> {
        self.fields.get(&field).and_then(|f| f.farm)
    }

    fn customer_of_farm(&self, farm: ReferenceId) -> Option<ReferenceId> {
        self.farms.get(&farm).and_then(|f| f.customer)
    }
}
