//! Commands for the Ordering & Fulfillment context.

use bazaar_core::actor::Actor;
use bazaar_core::command::Command;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::address::{CustomerType, PaymentMethod, ShippingAddress};
use super::cancellation::VendorCancelReason;
use super::status::ShipmentStatus;

/// Command to convert a cart into an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The buyer, if signed in.
    pub buyer_id: Option<Uuid>,
    /// The cart to convert.
    pub cart_id: Uuid,
    /// Delivery address as submitted.
    pub address: ShippingAddress,
    /// How the buyer pays.
    pub payment_method: PaymentMethod,
    /// Customer type the buyer claimed.
    pub customer_type: CustomerType,
    /// Whether the buyer collects in person where vendors allow it.
    pub is_pickup: bool,
}

/// Command to start (or restart) card payment for an order.
#[derive(Debug, Clone)]
pub struct InitiatePayment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order identifier.
    pub order_id: Uuid,
    /// Who is asking.
    pub actor: Actor,
}

/// Command recording the payment collaborator's confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmPayment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order identifier.
    pub order_id: Uuid,
    /// Gateway reference, if any.
    pub payment_reference: Option<String>,
    /// Who is confirming.
    pub actor: Actor,
}

/// Command to move a shipment to a new status.
#[derive(Debug, Clone)]
pub struct UpdateShipmentStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order identifier.
    pub order_id: Uuid,
    /// The shipment identifier.
    pub shipment_id: Uuid,
    /// Requested status.
    pub status: ShipmentStatus,
    /// Who is acting.
    pub actor: Actor,
}

/// Command to book a carrier pickup.
#[derive(Debug, Clone)]
pub struct SchedulePickup {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order identifier.
    pub order_id: Uuid,
    /// The shipment identifier.
    pub shipment_id: Uuid,
    /// Start of the pickup window.
    pub window_start: DateTime<Utc>,
    /// End of the pickup window.
    pub window_end: DateTime<Utc>,
    /// Who is acting.
    pub actor: Actor,
}

/// Command to attach an invoice to a shipment.
#[derive(Debug, Clone)]
pub struct IssueInvoice {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order identifier.
    pub order_id: Uuid,
    /// The shipment identifier.
    pub shipment_id: Uuid,
    /// Invoice number.
    pub invoice_number: String,
    /// Invoice location.
    pub invoice_url: String,
    /// Who is acting.
    pub actor: Actor,
}

/// Command for a vendor to cancel their shipment.
#[derive(Debug, Clone)]
pub struct CancelShipment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order identifier.
    pub order_id: Uuid,
    /// The shipment identifier.
    pub shipment_id: Uuid,
    /// Reason from the taxonomy.
    pub reason: VendorCancelReason,
    /// Note; required for `other`.
    pub note: Option<String>,
    /// Who is acting.
    pub actor: Actor,
}

/// Command for the buyer or an admin to cancel an order.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order identifier.
    pub order_id: Uuid,
    /// Who is acting.
    pub actor: Actor,
}

impl Command for PlaceOrder {
    fn command_type(&self) -> &'static str {
        "ordering.place_order"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for InitiatePayment {
    fn command_type(&self) -> &'static str {
        "ordering.initiate_payment"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for ConfirmPayment {
    fn command_type(&self) -> &'static str {
        "ordering.confirm_payment"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for UpdateShipmentStatus {
    fn command_type(&self) -> &'static str {
        "ordering.update_shipment_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for SchedulePickup {
    fn command_type(&self) -> &'static str {
        "ordering.schedule_pickup"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for IssueInvoice {
    fn command_type(&self) -> &'static str {
        "ordering.issue_invoice"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for CancelShipment {
    fn command_type(&self) -> &'static str {
        "ordering.cancel_shipment"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for CancelOrder {
    fn command_type(&self) -> &'static str {
        "ordering.cancel_order"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
