//! Collaborator contracts consumed by the Shipping Quotes context.

use async_trait::async_trait;
use bazaar_core::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::policy::VendorShippingPolicy;

/// A live product as seen by the catalog collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Product identifier.
    pub product_id: Uuid,
    /// Vendor selling the product.
    pub vendor_id: Uuid,
    /// Display title.
    pub title: String,
    /// Current unit price.
    pub unit_price: Decimal,
}

/// Read-only product lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns the product if it is live and has a known vendor.
    async fn resolve(&self, product_id: Uuid) -> Result<Option<CatalogProduct>, DomainError>;
}

/// Read-only vendor lookup.
#[async_trait]
pub trait VendorDirectory: Send + Sync {
    /// Returns the vendor's shipping policy, if the vendor configured one.
    async fn shipping_policy(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<VendorShippingPolicy>, DomainError>;

    /// Returns the address buyers should use to return goods to the vendor.
    async fn return_address(&self, vendor_id: Uuid) -> Result<Option<String>, DomainError>;
}
