//! `PostgreSQL` catalog and vendor directory adapters.
//!
//! Both are read-only views over tables owned by the catalog service.

use async_trait::async_trait;
use bazaar_core::error::DomainError;
use bazaar_shipping::application::ports::{CatalogProduct, ProductCatalog, VendorDirectory};
use bazaar_shipping::domain::policy::VendorShippingPolicy;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn infrastructure(context: &str, e: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("{context}: {e}"))
}

/// Resolves live products from the `products` table.
#[derive(Debug, Clone)]
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    /// Creates a new `PgProductCatalog`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn resolve(&self, product_id: Uuid) -> Result<Option<CatalogProduct>, DomainError> {
        let row = sqlx::query(
            "SELECT product_id, vendor_id, title, unit_price \
             FROM products WHERE product_id = $1 AND active",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to resolve product", &e))?;

        row.map(|row| -> Result<CatalogProduct, sqlx::Error> {
            Ok(CatalogProduct {
                product_id: row.try_get("product_id")?,
                vendor_id: row.try_get("vendor_id")?,
                title: row.try_get("title")?,
                unit_price: row.try_get("unit_price")?,
            })
        })
        .transpose()
        .map_err(|e| infrastructure("failed to decode product row", &e))
    }
}

/// Reads shipping policies and return addresses from the `vendors` table.
#[derive(Debug, Clone)]
pub struct PgVendorDirectory {
    pool: PgPool,
}

impl PgVendorDirectory {
    /// Creates a new `PgVendorDirectory`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VendorDirectory for PgVendorDirectory {
    async fn shipping_policy(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<VendorShippingPolicy>, DomainError> {
        let policy: Option<Option<Json<VendorShippingPolicy>>> =
            sqlx::query_scalar("SELECT shipping_policy FROM vendors WHERE vendor_id = $1")
                .bind(vendor_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| infrastructure("failed to load shipping policy", &e))?;
        Ok(policy.flatten().map(|Json(policy)| policy))
    }

    async fn return_address(&self, vendor_id: Uuid) -> Result<Option<String>, DomainError> {
        let address: Option<Option<String>> =
            sqlx::query_scalar("SELECT return_address FROM vendors WHERE vendor_id = $1")
                .bind(vendor_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| infrastructure("failed to load return address", &e))?;
        Ok(address.flatten())
    }
}
