//! Shipping price for one vendor group.

use bazaar_core::money::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::policy::{Destination, ShipmentMethod, VendorShippingPolicy};

/// Shipping method and cost for one vendor's shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingCharge {
    /// How the shipment will travel.
    pub method: ShipmentMethod,
    /// Shipping cost, rounded to two decimals.
    pub cost: Decimal,
}

/// Prices one vendor group.
///
/// Rules, first match wins:
/// 1. pickup requested and allowed: free, `PICKUP`;
/// 2. subtotal at or above the free threshold: free;
/// 3. otherwise `base_cost + per_item * (item_count - 1)`.
///
/// Non-pickup shipments use `LOCKER` when the destination names a locker,
/// `COURIER` otherwise.
#[must_use]
pub fn price_shipping(
    subtotal: Decimal,
    item_count: u32,
    policy: &VendorShippingPolicy,
    is_pickup: bool,
    destination: &Destination,
) -> ShippingCharge {
    let effective = policy.resolve_for(destination);

    if is_pickup && effective.pickup_available {
        return ShippingCharge {
            method: ShipmentMethod::Pickup,
            cost: Decimal::ZERO,
        };
    }

    let method = if destination.locker_id.is_some() {
        ShipmentMethod::Locker
    } else {
        ShipmentMethod::Courier
    };

    if effective.free_over.is_some_and(|threshold| subtotal >= threshold) {
        return ShippingCharge {
            method,
            cost: Decimal::ZERO,
        };
    }

    let extra_items = Decimal::from(item_count.saturating_sub(1));
    ShippingCharge {
        method,
        cost: round_money(effective.base_cost + effective.per_item * extra_items),
    }
}
