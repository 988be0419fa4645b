//! In-memory product catalog and vendor directory.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bazaar_core::error::DomainError;
use bazaar_shipping::application::ports::{CatalogProduct, ProductCatalog, VendorDirectory};
use bazaar_shipping::domain::policy::VendorShippingPolicy;
use uuid::Uuid;

/// A product catalog backed by a map. Products can be withdrawn mid-test to
/// simulate a line whose product disappeared.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: Mutex<HashMap<Uuid, CatalogProduct>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `unit_price` is not a decimal or the mutex is poisoned.
    pub fn add_product(&self, vendor_id: Uuid, title: &str, unit_price: &str) -> CatalogProduct {
        let product = CatalogProduct {
            product_id: Uuid::new_v4(),
            vendor_id,
            title: title.to_owned(),
            unit_price: unit_price.parse().expect("unit price must be a decimal"),
        };
        self.products
            .lock()
            .unwrap()
            .insert(product.product_id, product.clone());
        product
    }

    /// Removes a product.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn withdraw(&self, product_id: Uuid) {
        self.products.lock().unwrap().remove(&product_id);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn resolve(&self, product_id: Uuid) -> Result<Option<CatalogProduct>, DomainError> {
        Ok(self.products.lock().unwrap().get(&product_id).cloned())
    }
}

/// A vendor directory backed by maps.
#[derive(Debug, Default)]
pub struct InMemoryVendorDirectory {
    policies: Mutex<HashMap<Uuid, VendorShippingPolicy>>,
    return_addresses: Mutex<HashMap<Uuid, String>>,
}

impl InMemoryVendorDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a vendor's shipping policy.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_policy(&self, vendor_id: Uuid, policy: VendorShippingPolicy) {
        self.policies.lock().unwrap().insert(vendor_id, policy);
    }

    /// Sets a vendor's return address.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_return_address(&self, vendor_id: Uuid, address: &str) {
        self.return_addresses
            .lock()
            .unwrap()
            .insert(vendor_id, address.to_owned());
    }
}

#[async_trait]
impl VendorDirectory for InMemoryVendorDirectory {
    async fn shipping_policy(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<VendorShippingPolicy>, DomainError> {
        Ok(self.policies.lock().unwrap().get(&vendor_id).cloned())
    }

    async fn return_address(&self, vendor_id: Uuid) -> Result<Option<String>, DomainError> {
        Ok(self.return_addresses.lock().unwrap().get(&vendor_id).cloned())
    }
}
