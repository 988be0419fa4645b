//! Domain events for the Ordering & Fulfillment context.

use bazaar_core::event::{DomainEvent, EventMetadata};
use bazaar_shipping::domain::policy::ShipmentMethod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::address::{CustomerType, PaymentMethod, ShippingAddress};
use super::cancellation::VendorCancelReason;
use super::status::ShipmentStatus;

/// Event type identifier for [`OrderPlaced`].
pub const ORDER_PLACED_EVENT_TYPE: &str = "ordering.order_placed";
/// Event type identifier for [`PaymentConfirmed`].
pub const PAYMENT_CONFIRMED_EVENT_TYPE: &str = "ordering.payment_confirmed";
/// Event type identifier for [`ShipmentStatusChanged`].
pub const SHIPMENT_STATUS_CHANGED_EVENT_TYPE: &str = "ordering.shipment_status_changed";
/// Event type identifier for [`PickupScheduled`].
pub const PICKUP_SCHEDULED_EVENT_TYPE: &str = "ordering.pickup_scheduled";
/// Event type identifier for [`InvoiceIssued`].
pub const INVOICE_ISSUED_EVENT_TYPE: &str = "ordering.invoice_issued";
/// Event type identifier for [`ShipmentCancelledByVendor`].
pub const SHIPMENT_CANCELLED_BY_VENDOR_EVENT_TYPE: &str = "ordering.shipment_cancelled_by_vendor";
/// Event type identifier for [`OrderCancelled`].
pub const ORDER_CANCELLED_EVENT_TYPE: &str = "ordering.order_cancelled";
/// Event type identifier for [`OrderFulfilled`].
pub const ORDER_FULFILLED_EVENT_TYPE: &str = "ordering.order_fulfilled";

/// Snapshot of a purchased line, frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    /// Catalog product reference.
    pub product_id: Uuid,
    /// Title at order time.
    pub title: String,
    /// Quantity, at least one.
    pub qty: u32,
    /// Unit price at order time.
    pub unit_price: Decimal,
}

/// A vendor's shipment as created at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedShipment {
    /// Shipment identifier.
    pub shipment_id: Uuid,
    /// Vendor fulfilling the shipment.
    pub vendor_id: Uuid,
    /// Delivery method.
    pub method: ShipmentMethod,
    /// Shipping price charged for this shipment.
    pub price: Decimal,
    /// Merchandise subtotal of this shipment, rounded once.
    pub subtotal: Decimal,
    /// Purchased lines.
    pub items: Vec<ShipmentItem>,
}

/// Simulated carrier metadata recorded when a pickup is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierInfo {
    /// Air waybill number.
    pub awb: String,
    /// Printable label.
    pub label_url: String,
    /// Public tracking page.
    pub tracking_url: String,
    /// Start of the pickup window.
    pub pickup_window_start: DateTime<Utc>,
    /// End of the pickup window.
    pub pickup_window_end: DateTime<Utc>,
}

/// Emitted once when checkout materializes an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlaced {
    /// The order identifier.
    pub order_id: Uuid,
    /// The buyer, if known.
    pub buyer_id: Option<Uuid>,
    /// The cart the order was placed from.
    pub cart_id: Uuid,
    /// ISO currency code.
    pub currency: String,
    /// Sum of the shipment subtotals.
    pub subtotal: Decimal,
    /// Sum of the shipment prices.
    pub shipping_total: Decimal,
    /// `subtotal + shipping_total`.
    pub total: Decimal,
    /// How the buyer pays.
    pub payment_method: PaymentMethod,
    /// Natural person or legal entity.
    pub customer_type: CustomerType,
    /// Validated delivery address.
    pub shipping_address: ShippingAddress,
    /// One shipment per vendor, ordered by vendor id.
    pub shipments: Vec<PlacedShipment>,
}

/// Emitted when the payment collaborator confirms payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmed {
    /// The order identifier.
    pub order_id: Uuid,
    /// Gateway reference, if supplied.
    pub payment_reference: Option<String>,
}

/// Emitted when a vendor or admin moves a shipment to a new status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentStatusChanged {
    /// The order identifier.
    pub order_id: Uuid,
    /// The shipment identifier.
    pub shipment_id: Uuid,
    /// The vendor owning the shipment.
    pub vendor_id: Uuid,
    /// Previous status.
    pub from: ShipmentStatus,
    /// New status.
    pub to: ShipmentStatus,
}

/// Emitted when a carrier pickup is booked for a shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupScheduled {
    /// The order identifier.
    pub order_id: Uuid,
    /// The shipment identifier.
    pub shipment_id: Uuid,
    /// The vendor owning the shipment.
    pub vendor_id: Uuid,
    /// Status before scheduling.
    pub from: ShipmentStatus,
    /// Carrier metadata.
    pub carrier: CarrierInfo,
}

/// Emitted when a vendor attaches an invoice to a shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceIssued {
    /// The order identifier.
    pub order_id: Uuid,
    /// The shipment identifier.
    pub shipment_id: Uuid,
    /// The vendor owning the shipment.
    pub vendor_id: Uuid,
    /// Invoice number.
    pub invoice_number: String,
    /// Where the invoice can be downloaded.
    pub invoice_url: String,
}

/// Emitted when a vendor cancels their own shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCancelledByVendor {
    /// The order identifier.
    pub order_id: Uuid,
    /// The shipment identifier.
    pub shipment_id: Uuid,
    /// The vendor owning the shipment.
    pub vendor_id: Uuid,
    /// Status before cancellation.
    pub from: ShipmentStatus,
    /// Reason from the taxonomy.
    pub reason: VendorCancelReason,
    /// Vendor's note.
    pub note: Option<String>,
}

/// Emitted when the buyer or an admin cancels the whole order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelled {
    /// The order identifier.
    pub order_id: Uuid,
    /// Who cancelled, as `role` or `role:id`.
    pub cancelled_by: String,
    /// Shipments moved to `RETURNED` by this cancellation.
    pub returned_shipment_ids: Vec<Uuid>,
    /// Vendors of those shipments.
    pub affected_vendor_ids: Vec<Uuid>,
}

/// Emitted when every shipment of a live order is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFulfilled {
    /// The order identifier.
    pub order_id: Uuid,
}

/// Event payload variants for the Ordering & Fulfillment context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEventKind {
    /// Order and shipments created.
    OrderPlaced(OrderPlaced),
    /// Payment confirmed.
    PaymentConfirmed(PaymentConfirmed),
    /// Shipment status changed.
    ShipmentStatusChanged(ShipmentStatusChanged),
    /// Carrier pickup booked.
    PickupScheduled(PickupScheduled),
    /// Invoice attached.
    InvoiceIssued(InvoiceIssued),
    /// Shipment cancelled by its vendor.
    ShipmentCancelledByVendor(ShipmentCancelledByVendor),
    /// Order cancelled.
    OrderCancelled(OrderCancelled),
    /// Order fulfilled.
    OrderFulfilled(OrderFulfilled),
}

/// Domain event envelope for the Ordering & Fulfillment context.
#[derive(Debug, Clone)]
pub struct OrderEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: OrderEventKind,
}

impl OrderEventKind {
    /// Returns the event type identifier for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OrderPlaced(_) => ORDER_PLACED_EVENT_TYPE,
            Self::PaymentConfirmed(_) => PAYMENT_CONFIRMED_EVENT_TYPE,
            Self::ShipmentStatusChanged(_) => SHIPMENT_STATUS_CHANGED_EVENT_TYPE,
            Self::PickupScheduled(_) => PICKUP_SCHEDULED_EVENT_TYPE,
            Self::InvoiceIssued(_) => INVOICE_ISSUED_EVENT_TYPE,
            Self::ShipmentCancelledByVendor(_) => SHIPMENT_CANCELLED_BY_VENDOR_EVENT_TYPE,
            Self::OrderCancelled(_) => ORDER_CANCELLED_EVENT_TYPE,
            Self::OrderFulfilled(_) => ORDER_FULFILLED_EVENT_TYPE,
        }
    }
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).unwrap_or(serde_json::Value::Null)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
