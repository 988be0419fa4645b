//! Shipping quote composition.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::grouping::{ResolvedLine, group_by_vendor};
use super::policy::{Destination, VendorShippingPolicy};
use super::pricing::{ShippingCharge, price_shipping};

/// Vendor shipping policies captured before pricing starts.
///
/// Pricing reads only from this snapshot, so a quote is a pure function of
/// its inputs. Vendors missing from the snapshot are priced with the default
/// (empty) policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySnapshot {
    policies: HashMap<Uuid, VendorShippingPolicy>,
    fallback: VendorShippingPolicy,
}

impl PolicySnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the policy for a vendor.
    pub fn insert(&mut self, vendor_id: Uuid, policy: VendorShippingPolicy) {
        self.policies.insert(vendor_id, policy);
    }

    /// Returns the vendor's policy, or the default policy when unknown.
    #[must_use]
    pub fn policy_for(&self, vendor_id: Uuid) -> &VendorShippingPolicy {
        self.policies.get(&vendor_id).unwrap_or(&self.fallback)
    }
}

impl FromIterator<(Uuid, VendorShippingPolicy)> for PolicySnapshot {
    fn from_iter<T: IntoIterator<Item = (Uuid, VendorShippingPolicy)>>(iter: T) -> Self {
        Self {
            policies: iter.into_iter().collect(),
            fallback: VendorShippingPolicy::default(),
        }
    }
}

/// The priced shipment for one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorQuote {
    /// The vendor.
    pub vendor_id: Uuid,
    /// Merchandise subtotal for the vendor, rounded once.
    pub subtotal: Decimal,
    /// Total quantity.
    pub item_count: u32,
    /// Shipping method and cost.
    pub shipping: ShippingCharge,
    /// Lines priced in this group.
    #[serde(skip)]
    pub lines: Vec<ResolvedLine>,
}

/// Per-seller shipping quote with aggregate totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
    /// One entry per vendor, ordered by vendor id.
    pub by_seller: Vec<VendorQuote>,
    /// Sum of the vendor subtotals.
    pub merchandise: Decimal,
    /// Sum of the vendor shipping costs.
    pub shipping_total: Decimal,
    /// ISO currency code.
    pub currency: String,
}

impl ShippingQuote {
    /// Merchandise plus shipping.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.merchandise + self.shipping_total
    }

    /// Returns `true` when no vendor group was priced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_seller.is_empty()
    }
}

/// Groups `lines` by vendor and prices each group under its policy.
///
/// Each vendor's subtotal and shipping cost are rounded once; the totals are
/// plain sums of those rounded parts.
#[must_use]
pub fn quote(
    lines: &[ResolvedLine],
    destination: &Destination,
    is_pickup: bool,
    policies: &PolicySnapshot,
    currency: &str,
) -> ShippingQuote {
    let by_seller: Vec<VendorQuote> = group_by_vendor(lines)
        .into_iter()
        .map(|group| {
            let shipping = price_shipping(
                group.subtotal,
                group.item_count,
                policies.policy_for(group.vendor_id),
                is_pickup,
                destination,
            );
            VendorQuote {
                vendor_id: group.vendor_id,
                subtotal: group.subtotal,
                item_count: group.item_count,
                shipping,
                lines: group.lines,
            }
        })
        .collect();

    let merchandise = by_seller.iter().map(|v| v.subtotal).sum();
    let shipping_total = by_seller.iter().map(|v| v.shipping.cost).sum();

    ShippingQuote {
        by_seller,
        merchandise,
        shipping_total,
        currency: currency.to_owned(),
    }
}
