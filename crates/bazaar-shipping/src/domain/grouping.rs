//! Groups resolved cart lines by vendor.

use std::collections::BTreeMap;

use bazaar_core::money::{line_total, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cart line resolved against the catalog at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLine {
    /// Catalog product reference.
    pub product_id: Uuid,
    /// Vendor selling the product.
    pub vendor_id: Uuid,
    /// Product title at resolution time.
    pub title: String,
    /// Unit price at resolution time.
    pub unit_price: Decimal,
    /// Quantity ordered.
    pub qty: u32,
}

/// All lines sold by one vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorGroup {
    /// The vendor.
    pub vendor_id: Uuid,
    /// Lines in cart order.
    pub lines: Vec<ResolvedLine>,
    /// Sum of `unit_price * qty`, rounded once for the group.
    pub subtotal: Decimal,
    /// Total quantity across the group's lines.
    pub item_count: u32,
}

/// Groups lines by vendor, ordered by vendor id. Zero-quantity lines are
/// skipped.
#[must_use]
pub fn group_by_vendor(lines: &[ResolvedLine]) -> Vec<VendorGroup> {
    let mut by_vendor: BTreeMap<Uuid, Vec<ResolvedLine>> = BTreeMap::new();
    for line in lines.iter().filter(|line| line.qty > 0) {
        by_vendor
            .entry(line.vendor_id)
            .or_default()
            .push(line.clone());
    }

    by_vendor
        .into_iter()
        .map(|(vendor_id, lines)| {
            let raw: Decimal = lines
                .iter()
                .map(|line| line_total(line.unit_price, line.qty))
                .sum();
            let item_count = lines
                .iter()
                .map(|line| line.qty)
                .fold(0u32, u32::saturating_add);
            VendorGroup {
                vendor_id,
                lines,
                subtotal: round_money(raw),
                item_count,
            }
        })
        .collect()
}
