//! Quote handlers for the Shipping Quotes context.
//!
//! Resolves requested items through the catalog, snapshots the vendors'
//! shipping policies, then prices the snapshot with the pure quote function.

use std::collections::BTreeSet;

use bazaar_core::error::DomainError;
use uuid::Uuid;

use super::ports::{ProductCatalog, VendorDirectory};
use super::resolution::{LineResolution, resolve_lines};
use crate::domain::commands::QuoteShipping;
use crate::domain::grouping::ResolvedLine;
use crate::domain::quote::{PolicySnapshot, ShippingQuote, quote};

/// Settings shared by every quote computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSettings {
    /// ISO currency code of all prices.
    pub currency: String,
    /// What to do with lines whose product cannot be resolved.
    pub line_resolution: LineResolution,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            currency: "RON".to_owned(),
            line_resolution: LineResolution::BestEffort,
        }
    }
}

/// A quote plus the products that were dropped during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteResult {
    /// The priced quote.
    pub quote: ShippingQuote,
    /// Products dropped under best-effort resolution.
    pub dropped_product_ids: Vec<Uuid>,
}

/// Reads the shipping policy of every vendor present in `lines`.
///
/// # Errors
///
/// Returns the directory's error if a lookup fails.
pub async fn load_policy_snapshot(
    lines: &[ResolvedLine],
    vendors: &dyn VendorDirectory,
) -> Result<PolicySnapshot, DomainError> {
    let vendor_ids: BTreeSet<Uuid> = lines.iter().map(|line| line.vendor_id).collect();
    let mut snapshot = PolicySnapshot::new();
    for vendor_id in vendor_ids {
        if let Some(policy) = vendors.shipping_policy(vendor_id).await? {
            snapshot.insert(vendor_id, policy);
        }
    }
    Ok(snapshot)
}

/// Handles the `QuoteShipping` command: resolves items, snapshots policies
/// and prices every vendor group.
///
/// # Errors
///
/// Returns `DomainError` if resolution or a collaborator lookup fails.
pub async fn handle_quote_shipping(
    command: &QuoteShipping,
    catalog: &dyn ProductCatalog,
    vendors: &dyn VendorDirectory,
    settings: &QuoteSettings,
) -> Result<QuoteResult, DomainError> {
    let resolved = resolve_lines(&command.items, catalog, settings.line_resolution).await?;
    let policies = load_policy_snapshot(&resolved.lines, vendors).await?;

    let quote = quote(
        &resolved.lines,
        &command.destination,
        command.is_pickup,
        &policies,
        &settings.currency,
    );

    Ok(QuoteResult {
        quote,
        dropped_product_ids: resolved.dropped_product_ids,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::application::ports::CatalogProduct;
    use crate::application::resolution::RequestedLine;
    use crate::domain::policy::{Destination, ShipmentMethod, VendorShippingPolicy};

    struct MapCatalog(HashMap<Uuid, CatalogProduct>);

    #[async_trait]
    impl ProductCatalog for MapCatalog {
        async fn resolve(&self, product_id: Uuid) -> Result<Option<CatalogProduct>, DomainError> {
            Ok(self.0.get(&product_id).cloned())
        }
    }

    #[derive(Default)]
    struct MapVendors {
        policies: HashMap<Uuid, VendorShippingPolicy>,
        lookups: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl VendorDirectory for MapVendors {
        async fn shipping_policy(
            &self,
            vendor_id: Uuid,
        ) -> Result<Option<VendorShippingPolicy>, DomainError> {
            self.lookups.lock().unwrap().push(vendor_id);
            Ok(self.policies.get(&vendor_id).cloned())
        }

        async fn return_address(&self, _vendor_id: Uuid) -> Result<Option<String>, DomainError> {
            Ok(None)
        }
    }

    fn amount(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(vendor_id: Uuid, price: &str) -> CatalogProduct {
        CatalogProduct {
            product_id: Uuid::new_v4(),
            vendor_id,
            title: "Linen tote".into(),
            unit_price: amount(price),
        }
    }

    #[tokio::test]
    async fn test_handle_quote_shipping_prices_each_vendor() {
        // Arrange
        let vendor_a = Uuid::new_v4();
        let vendor_b = Uuid::new_v4();
        let a = product(vendor_a, "50");
        let b = product(vendor_b, "20");
        let catalog = MapCatalog(HashMap::from([
            (a.product_id, a.clone()),
            (b.product_id, b.clone()),
        ]));
        let vendors = MapVendors {
            policies: HashMap::from([
                (
                    vendor_a,
                    VendorShippingPolicy {
                        base_cost: Some(amount("15")),
                        free_over: Some(amount("100")),
                        ..VendorShippingPolicy::default()
                    },
                ),
                (
                    vendor_b,
                    VendorShippingPolicy {
                        base_cost: Some(amount("10")),
                        per_item: Some(amount("2")),
                        pickup_available: true,
                        ..VendorShippingPolicy::default()
                    },
                ),
            ]),
            ..MapVendors::default()
        };
        let command = QuoteShipping {
            correlation_id: Uuid::new_v4(),
            items: vec![
                RequestedLine { product_id: a.product_id, qty: 2 },
                RequestedLine { product_id: b.product_id, qty: 1 },
            ],
            destination: Destination {
                country: Some("RO".into()),
                county: "Cluj".into(),
                locker_id: None,
            },
            is_pickup: true,
        };

        // Act
        let result = handle_quote_shipping(&command, &catalog, &vendors, &QuoteSettings::default())
            .await
            .unwrap();

        // Assert
        let quote = result.quote;
        assert_eq!(quote.by_seller.len(), 2);
        let b_quote = quote.by_seller.iter().find(|v| v.vendor_id == vendor_b).unwrap();
        assert_eq!(b_quote.shipping.method, ShipmentMethod::Pickup);
        assert_eq!(quote.shipping_total, Decimal::ZERO);
        assert_eq!(quote.merchandise, amount("120"));
        assert!(result.dropped_product_ids.is_empty());
    }

    #[tokio::test]
    async fn test_load_policy_snapshot_looks_up_each_vendor_once() {
        let vendor = Uuid::new_v4();
        let vendors = MapVendors::default();
        let lines = vec![
            ResolvedLine {
                product_id: Uuid::new_v4(),
                vendor_id: vendor,
                title: "a".into(),
                unit_price: amount("1"),
                qty: 1,
            },
            ResolvedLine {
                product_id: Uuid::new_v4(),
                vendor_id: vendor,
                title: "b".into(),
                unit_price: amount("2"),
                qty: 1,
            },
        ];

        let snapshot = load_policy_snapshot(&lines, &vendors).await.unwrap();

        assert_eq!(vendors.lookups.lock().unwrap().as_slice(), &[vendor]);
        assert_eq!(snapshot.policy_for(vendor), &VendorShippingPolicy::default());
    }

    #[tokio::test]
    async fn test_handle_quote_shipping_reports_dropped_products() {
        let vanished = Uuid::new_v4();
        let catalog = MapCatalog(HashMap::new());
        let vendors = MapVendors::default();
        let command = QuoteShipping {
            correlation_id: Uuid::new_v4(),
            items: vec![RequestedLine { product_id: vanished, qty: 1 }],
            destination: Destination::default(),
            is_pickup: false,
        };

        let result = handle_quote_shipping(&command, &catalog, &vendors, &QuoteSettings::default())
            .await
            .unwrap();

        assert!(result.quote.is_empty());
        assert_eq!(result.dropped_product_ids, vec![vanished]);
    }
}
