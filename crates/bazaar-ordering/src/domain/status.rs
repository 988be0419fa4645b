//! Shipment lifecycle, order status and the derived buyer-facing status.

use std::fmt;
use std::str::FromStr;

use bazaar_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a shipment is in its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Order received, vendor has not started.
    Pending,
    /// Vendor is packing.
    Preparing,
    /// Packed and waiting for the carrier.
    ReadyForPickup,
    /// Carrier pickup booked.
    PickupScheduled,
    /// Air waybill issued.
    Awb,
    /// With the carrier.
    InTransit,
    /// Handed to the buyer. Terminal.
    Delivered,
    /// Sent back or cancelled. Terminal.
    Returned,
}

impl ShipmentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::Pending,
        Self::Preparing,
        Self::ReadyForPickup,
        Self::PickupScheduled,
        Self::Awb,
        Self::InTransit,
        Self::Delivered,
        Self::Returned,
    ];

    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Preparing => "PREPARING",
            Self::ReadyForPickup => "READY_FOR_PICKUP",
            Self::PickupScheduled => "PICKUP_SCHEDULED",
            Self::Awb => "AWB",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Returned => "RETURNED",
        }
    }

    /// `DELIVERED` and `RETURNED` are terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Returned)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::Validation(format!("unknown shipment status: {wanted}")))
    }
}

/// Outcome of a permitted status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status changes; an event must be recorded.
    Change,
    /// The shipment already has the requested status.
    NoOp,
}

/// Checks a shipment status change. Any non-terminal status may move to any
/// other; nothing leaves a terminal status.
///
/// # Errors
///
/// Returns `DomainError::InvalidTransition` when `from` is terminal and
/// differs from `to`.
pub fn check_transition(
    shipment_id: Uuid,
    from: ShipmentStatus,
    to: ShipmentStatus,
) -> Result<Transition, DomainError> {
    if from == to {
        return Ok(Transition::NoOp);
    }
    if from.is_terminal() {
        return Err(DomainError::InvalidTransition {
            shipment_id,
            from: from.as_str().to_owned(),
            to: to.as_str().to_owned(),
        });
    }
    Ok(Transition::Change)
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting payment or fulfilment.
    #[default]
    Pending,
    /// Payment confirmed.
    Paid,
    /// Cancelled by the buyer or an admin.
    Cancelled,
    /// Every shipment reached a terminal status.
    Fulfilled,
}

impl OrderStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
            Self::Fulfilled => "FULFILLED",
        }
    }

    /// Cancelled and fulfilled orders accept no further lifecycle changes.
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Cancelled | Self::Fulfilled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single status shown to buyers and sellers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiStatus {
    /// Nothing has happened yet.
    Pending,
    /// At least one vendor is preparing goods.
    Processing,
    /// At least one shipment is with the carrier.
    Shipped,
    /// Everything arrived.
    Delivered,
    /// At least one shipment came back.
    Returned,
    /// The order was cancelled.
    Canceled,
}

#[derive(Debug, Clone, Copy)]
enum Quantifier {
    All,
    Any,
}

#[derive(Debug)]
struct PrecedenceRule {
    quantifier: Quantifier,
    statuses: &'static [ShipmentStatus],
    yields: UiStatus,
}

impl PrecedenceRule {
    fn matches(&self, shipments: &[ShipmentStatus]) -> bool {
        let hit = |status: &ShipmentStatus| self.statuses.contains(status);
        match self.quantifier {
            Quantifier::All => shipments.iter().all(hit),
            Quantifier::Any => shipments.iter().any(hit),
        }
    }
}

/// Evaluated top to bottom against a non-empty shipment set; the first match
/// wins.
const SHIPMENT_RULES: &[PrecedenceRule] = &[
    PrecedenceRule {
        quantifier: Quantifier::All,
        statuses: &[ShipmentStatus::Delivered],
        yields: UiStatus::Delivered,
    },
    PrecedenceRule {
        quantifier: Quantifier::Any,
        statuses: &[ShipmentStatus::Returned],
        yields: UiStatus::Returned,
    },
    PrecedenceRule {
        quantifier: Quantifier::Any,
        statuses: &[
            ShipmentStatus::InTransit,
            ShipmentStatus::Awb,
            ShipmentStatus::PickupScheduled,
        ],
        yields: UiStatus::Shipped,
    },
    PrecedenceRule {
        quantifier: Quantifier::Any,
        statuses: &[ShipmentStatus::Preparing, ShipmentStatus::ReadyForPickup],
        yields: UiStatus::Processing,
    },
    PrecedenceRule {
        quantifier: Quantifier::Any,
        statuses: &[ShipmentStatus::Pending],
        yields: UiStatus::Pending,
    },
];

fn from_order_status(status: OrderStatus) -> UiStatus {
    match status {
        OrderStatus::Pending => UiStatus::Pending,
        OrderStatus::Paid => UiStatus::Processing,
        OrderStatus::Cancelled => UiStatus::Canceled,
        OrderStatus::Fulfilled => UiStatus::Delivered,
    }
}

/// Derives the buyer-facing status from the order status and its shipments.
#[must_use]
pub fn derive_ui_status(order_status: OrderStatus, shipments: &[ShipmentStatus]) -> UiStatus {
    if order_status == OrderStatus::Cancelled {
        return UiStatus::Canceled;
    }
    if shipments.is_empty() {
        return from_order_status(order_status);
    }
    SHIPMENT_RULES
        .iter()
        .find(|rule| rule.matches(shipments))
        .map_or_else(|| from_order_status(order_status), |rule| rule.yields)
}
