//! Vendor shipping policies and destination-zone resolution.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a shipment reaches the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentMethod {
    /// Door-to-door courier delivery.
    Courier,
    /// Delivery to a parcel locker.
    Locker,
    /// Buyer collects from the vendor.
    Pickup,
}

impl ShipmentMethod {
    /// Returns the wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Courier => "COURIER",
            Self::Locker => "LOCKER",
            Self::Pickup => "PICKUP",
        }
    }
}

/// Where a shipment is headed, as far as pricing is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// ISO country code; `None` means the marketplace's home country.
    #[serde(default)]
    pub country: Option<String>,
    /// County (administrative region).
    #[serde(default)]
    pub county: String,
    /// Parcel-locker identifier when the buyer chose locker delivery.
    #[serde(default)]
    pub locker_id: Option<String>,
}

/// A destination-specific override of a vendor's base policy.
///
/// A zone matches when every field it defines (`country`, `county`) equals
/// the destination's value; a zone defining neither never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneOverride {
    /// Country the zone applies to.
    pub country: Option<String>,
    /// County the zone applies to.
    pub county: Option<String>,
    /// Overrides `base_cost`.
    pub base_cost: Option<Decimal>,
    /// Overrides `per_item`.
    pub per_item: Option<Decimal>,
    /// Overrides `free_over`.
    pub free_over: Option<Decimal>,
    /// Overrides `pickup_available`.
    pub pickup_available: Option<bool>,
}

impl ZoneOverride {
    fn matches(&self, destination: &Destination) -> bool {
        if self.country.is_none() && self.county.is_none() {
            return false;
        }
        let country_ok = self
            .country
            .as_deref()
            .is_none_or(|c| same_place(Some(c), destination.country.as_deref()));
        let county_ok = self
            .county
            .as_deref()
            .is_none_or(|c| same_place(Some(c), Some(destination.county.as_str())));
        country_ok && county_ok
    }
}

fn same_place(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

/// A vendor's shipping configuration. Read-only input owned by the vendor
/// collaborator; missing amounts contribute zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorShippingPolicy {
    /// Flat cost of the first item.
    pub base_cost: Option<Decimal>,
    /// Cost of every additional item.
    pub per_item: Option<Decimal>,
    /// Subtotal at or above which shipping is free.
    pub free_over: Option<Decimal>,
    /// Whether the buyer may collect the order in person.
    pub pickup_available: bool,
    /// Destination overrides, evaluated in order; the first match wins.
    pub zones: Vec<ZoneOverride>,
}

/// A policy with zone overrides merged in and defaults filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectivePolicy {
    /// Flat cost of the first item.
    pub base_cost: Decimal,
    /// Cost of every additional item.
    pub per_item: Decimal,
    /// Free-shipping threshold, if any.
    pub free_over: Option<Decimal>,
    /// Whether pickup is allowed.
    pub pickup_available: bool,
}

impl VendorShippingPolicy {
    /// Resolves the policy for `destination`, merging the first matching
    /// zone's fields over the base values.
    #[must_use]
    pub fn resolve_for(&self, destination: &Destination) -> EffectivePolicy {
        let zone = self.zones.iter().find(|zone| zone.matches(destination));
        EffectivePolicy {
            base_cost: zone
                .and_then(|z| z.base_cost)
                .or(self.base_cost)
                .unwrap_or(Decimal::ZERO),
            per_item: zone
                .and_then(|z| z.per_item)
                .or(self.per_item)
                .unwrap_or(Decimal::ZERO),
            free_over: zone.and_then(|z| z.free_over).or(self.free_over),
            pickup_available: zone
                .and_then(|z| z.pickup_available)
                .unwrap_or(self.pickup_available),
        }
    }
}
