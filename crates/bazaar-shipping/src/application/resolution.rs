//! Resolving requested lines against the product catalog.

use std::fmt;
use std::str::FromStr;

use bazaar_core::error::DomainError;
use bazaar_core::money::round_money;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::ports::ProductCatalog;
use crate::domain::grouping::ResolvedLine;

/// What to do with a line whose product is gone or has no vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineResolution {
    /// Drop the line and continue with the rest ("best-effort line
    /// resolution"). Dropped product ids are reported to the caller.
    #[default]
    BestEffort,
    /// Fail the whole operation with `DomainError::LineUnresolvable`.
    Strict,
}

impl fmt::Display for LineResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestEffort => f.write_str("best_effort"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for LineResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown line resolution rule: {other}")),
        }
    }
}

/// A product and quantity as requested by the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    /// Catalog product reference.
    pub product_id: Uuid,
    /// Quantity; must be at least one.
    pub qty: u32,
}

/// Outcome of resolving requested lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLines {
    /// Lines that resolved, in request order.
    pub lines: Vec<ResolvedLine>,
    /// Products that could not be resolved and were dropped.
    pub dropped_product_ids: Vec<Uuid>,
}

/// Resolves each requested line through the catalog. Unit prices are taken
/// from the catalog, rounded to two decimals, never from the client.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a zero quantity,
/// `DomainError::LineUnresolvable` under `LineResolution::Strict`, or the
/// catalog's error if the lookup itself fails.
pub async fn resolve_lines(
    requested: &[RequestedLine],
    catalog: &dyn ProductCatalog,
    rule: LineResolution,
) -> Result<ResolvedLines, DomainError> {
    let mut resolved = ResolvedLines::default();

    for line in requested {
        if line.qty == 0 {
            return Err(DomainError::Validation(format!(
                "quantity for product {} must be at least 1",
                line.product_id
            )));
        }

        match catalog.resolve(line.product_id).await? {
            Some(product) => resolved.lines.push(ResolvedLine {
                product_id: product.product_id,
                vendor_id: product.vendor_id,
                title: product.title,
                unit_price: round_money(product.unit_price),
                qty: line.qty,
            }),
            None if rule == LineResolution::Strict => {
                return Err(DomainError::LineUnresolvable(line.product_id));
            }
            None => {
                warn!(product_id = %line.product_id, "dropping unresolvable cart line");
                resolved.dropped_product_ids.push(line.product_id);
            }
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::application::ports::CatalogProduct;

    struct MapCatalog(HashMap<Uuid, CatalogProduct>);

    #[async_trait]
    impl ProductCatalog for MapCatalog {
        async fn resolve(&self, product_id: Uuid) -> Result<Option<CatalogProduct>, DomainError> {
            Ok(self.0.get(&product_id).cloned())
        }
    }

    fn catalog_with(product_id: Uuid, vendor_id: Uuid, price: &str) -> MapCatalog {
        let product = CatalogProduct {
            product_id,
            vendor_id,
            title: "Ceramic mug".into(),
            unit_price: price.parse().unwrap(),
        };
        MapCatalog(HashMap::from([(product_id, product)]))
    }

    #[tokio::test]
    async fn test_best_effort_drops_unresolvable_lines() {
        // Arrange
        let live = Uuid::new_v4();
        let vanished = Uuid::new_v4();
        let vendor = Uuid::new_v4();
        let catalog = catalog_with(live, vendor, "24.90");
        let requested = [
            RequestedLine { product_id: vanished, qty: 1 },
            RequestedLine { product_id: live, qty: 2 },
        ];

        // Act
        let resolved = resolve_lines(&requested, &catalog, LineResolution::BestEffort)
            .await
            .unwrap();

        // Assert
        assert_eq!(resolved.lines.len(), 1);
        assert_eq!(resolved.lines[0].product_id, live);
        assert_eq!(resolved.lines[0].vendor_id, vendor);
        assert_eq!(resolved.lines[0].qty, 2);
        assert_eq!(resolved.dropped_product_ids, vec![vanished]);
    }

    #[tokio::test]
    async fn test_strict_rejects_unresolvable_lines() {
        let vanished = Uuid::new_v4();
        let catalog = MapCatalog(HashMap::new());

        let result = resolve_lines(
            &[RequestedLine { product_id: vanished, qty: 1 }],
            &catalog,
            LineResolution::Strict,
        )
        .await;

        match result.unwrap_err() {
            DomainError::LineUnresolvable(id) => assert_eq!(id, vanished),
            other => panic!("expected LineUnresolvable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let product = Uuid::new_v4();
        let catalog = catalog_with(product, Uuid::new_v4(), "1");

        let result = resolve_lines(
            &[RequestedLine { product_id: product, qty: 0 }],
            &catalog,
            LineResolution::BestEffort,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_catalog_prices_are_rounded_to_cents() {
        let product = Uuid::new_v4();
        let catalog = catalog_with(product, Uuid::new_v4(), "19.999");

        let resolved = resolve_lines(
            &[RequestedLine { product_id: product, qty: 1 }],
            &catalog,
            LineResolution::BestEffort,
        )
        .await
        .unwrap();

        assert_eq!(resolved.lines[0].unit_price, "20.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_line_resolution_parses_config_values() {
        assert_eq!("best_effort".parse::<LineResolution>(), Ok(LineResolution::BestEffort));
        assert_eq!(" STRICT ".parse::<LineResolution>(), Ok(LineResolution::Strict));
        assert!("lenient".parse::<LineResolution>().is_err());
    }
}
