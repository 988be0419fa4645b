//! Notification texts.

use bazaar_ordering::domain::cancellation::VendorCancelReason;
use bazaar_ordering::domain::status::ShipmentStatus;
use uuid::Uuid;

use crate::sinks::Notification;

/// Buyer-facing explanation of a vendor cancellation.
#[must_use]
pub fn vendor_cancel_message(reason: VendorCancelReason, note: Option<&str>) -> String {
    let base = match reason {
        VendorCancelReason::NoAnswer => {
            "The seller could not reach you to confirm the order, so the shipment was cancelled."
        }
        VendorCancelReason::ClientRequest => "The shipment was cancelled at your request.",
        VendorCancelReason::StockIssue => "The seller ran out of stock for this shipment.",
        VendorCancelReason::AddressIssue => {
            "The seller could not deliver to the address on the order."
        }
        VendorCancelReason::PaymentIssue => "The payment for this shipment could not be completed.",
        VendorCancelReason::Other => "The seller cancelled the shipment.",
    };
    match note {
        Some(note) if !note.trim().is_empty() => format!("{base} Seller note: {}", note.trim()),
        _ => base.to_owned(),
    }
}

/// Link to the buyer's order page.
#[must_use]
pub fn order_link(order_id: Uuid) -> String {
    format!("/orders/{order_id}")
}

/// Link to the vendor's view of an order.
#[must_use]
pub fn vendor_order_link(order_id: Uuid) -> String {
    format!("/orders/{order_id}/vendor-view")
}

fn notification(kind: &str, title: String, body: String, link: String) -> Notification {
    Notification {
        kind: kind.to_owned(),
        title,
        body,
        link: Some(link),
    }
}

pub(crate) fn vendor_new_order(order_id: Uuid, item_count: u32) -> Notification {
    notification(
        "order.new",
        "New order".to_owned(),
        format!("You have a new order with {item_count} item(s) to prepare."),
        vendor_order_link(order_id),
    )
}

pub(crate) fn buyer_order_placed(order_id: Uuid, shipment_count: usize) -> Notification {
    notification(
        "order.placed",
        "Order placed".to_owned(),
        format!("Your order was placed and will arrive in {shipment_count} shipment(s)."),
        order_link(order_id),
    )
}

pub(crate) fn buyer_payment_confirmed(order_id: Uuid) -> Notification {
    notification(
        "order.paid",
        "Payment received".to_owned(),
        "We received the payment for your order.".to_owned(),
        order_link(order_id),
    )
}

pub(crate) fn buyer_shipment_status(order_id: Uuid, status: ShipmentStatus) -> Notification {
    let body = match status {
        ShipmentStatus::Preparing => "The seller is preparing your shipment.".to_owned(),
        ShipmentStatus::ReadyForPickup => "Your shipment is packed and ready.".to_owned(),
        ShipmentStatus::InTransit => "Your shipment is on its way.".to_owned(),
        ShipmentStatus::Delivered => "Your shipment was delivered.".to_owned(),
        ShipmentStatus::Returned => "Your shipment was returned.".to_owned(),
        other => format!("Your shipment is now {other}."),
    };
    notification(
        "shipment.status_changed",
        "Shipment update".to_owned(),
        body,
        order_link(order_id),
    )
}

pub(crate) fn buyer_pickup_scheduled(order_id: Uuid, tracking_url: &str) -> Notification {
    notification(
        "shipment.pickup_scheduled",
        "Courier booked".to_owned(),
        format!("A courier will collect your shipment. Track it at {tracking_url}"),
        order_link(order_id),
    )
}

pub(crate) fn buyer_invoice_issued(order_id: Uuid, invoice_number: &str) -> Notification {
    notification(
        "shipment.invoice_issued",
        "Invoice available".to_owned(),
        format!("Invoice {invoice_number} is available for your shipment."),
        order_link(order_id),
    )
}

pub(crate) fn buyer_shipment_cancelled(order_id: Uuid, message: String) -> Notification {
    notification(
        "shipment.cancelled",
        "Shipment cancelled".to_owned(),
        message,
        order_link(order_id),
    )
}

pub(crate) fn vendor_order_cancelled(order_id: Uuid) -> Notification {
    notification(
        "order.cancelled",
        "Order cancelled".to_owned(),
        "The buyer's order was cancelled. Do not ship it.".to_owned(),
        vendor_order_link(order_id),
    )
}

pub(crate) fn buyer_order_fulfilled(order_id: Uuid) -> Notification {
    notification(
        "order.fulfilled",
        "Order complete".to_owned(),
        "Every shipment of your order is complete.".to_owned(),
        order_link(order_id),
    )
}
