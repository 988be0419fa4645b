//! Mapping from committed order events to side-effect intents.

use std::collections::BTreeMap;

use bazaar_core::error::DomainError;
use bazaar_core::repository::StoredEvent;
use bazaar_ordering::application::query_handlers::OrderView;
use bazaar_ordering::domain::events::OrderEventKind;
use bazaar_ordering::domain::status::ShipmentStatus;
use serde_json::json;
use uuid::Uuid;

use crate::ledger::SideEffectKey;
use crate::sinks::{EmailTemplate, Notification, RecipientKind};
use crate::templates;

/// One delivery the dispatcher should attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffectIntent {
    /// In-app notification.
    Notify {
        /// What the delivery is about.
        subject_id: Uuid,
        /// Recipient kind.
        recipient: RecipientKind,
        /// Recipient identifier.
        recipient_id: Uuid,
        /// What to deliver.
        notification: Notification,
    },
    /// Templated email.
    Email {
        /// What the delivery is about.
        subject_id: Uuid,
        /// Destination address.
        to: String,
        /// Template to render.
        template: EmailTemplate,
        /// Template data.
        data: serde_json::Value,
    },
}

impl SideEffectIntent {
    /// The dedupe key for this intent.
    #[must_use]
    pub fn key(&self) -> SideEffectKey {
        match self {
            Self::Notify {
                subject_id,
                recipient,
                recipient_id,
                notification,
            } => SideEffectKey {
                recipient: format!("{recipient}:{recipient_id}"),
                transition: notification.kind.clone(),
                subject_id: *subject_id,
            },
            Self::Email {
                subject_id,
                to,
                template,
                ..
            } => SideEffectKey {
                recipient: format!("email:{to}"),
                transition: template.as_str().to_owned(),
                subject_id: *subject_id,
            },
        }
    }
}

/// Subject of a shipment reaching `status`. Moving back and forth through
/// the same status notifies once.
#[must_use]
pub fn shipment_status_subject(shipment_id: Uuid, status: ShipmentStatus) -> Uuid {
    Uuid::new_v5(&shipment_id, status.as_str().as_bytes())
}

/// Subject of one invoice on a shipment. A corrected invoice with a new
/// number is a new subject.
#[must_use]
pub fn invoice_subject(shipment_id: Uuid, invoice_number: &str) -> Uuid {
    Uuid::new_v5(&shipment_id, invoice_number.as_bytes())
}

/// Maps one committed event to the deliveries it causes.
///
/// Every intent is keyed on the order or shipment it is about, never on the
/// stored event, so a retried command that commits a second identical event
/// maps to the same keys. Events from other streams (the cart cleared at
/// checkout) produce nothing. `return_addresses` is only consulted for
/// `OrderPlaced`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if an order event payload cannot be
/// decoded.
#[allow(clippy::too_many_lines)]
pub fn intents_for(
    event: &StoredEvent,
    order: &OrderView,
    return_addresses: &BTreeMap<Uuid, String>,
) -> Result<Vec<SideEffectIntent>, DomainError> {
    if event.aggregate_id != order.order_id {
        return Ok(Vec::new());
    }
    let kind: OrderEventKind = event.decode_payload()?;
    let order_id = order.order_id;
    let buyer_email = Some(order.shipping_address.email.as_str()).filter(|e| !e.is_empty());

    let mut intents = Vec::new();
    let notify_buyer =
        |intents: &mut Vec<SideEffectIntent>, subject_id: Uuid, notification: Notification| {
            if let Some(buyer_id) = order.buyer_id {
                intents.push(SideEffectIntent::Notify {
                    subject_id,
                    recipient: RecipientKind::Buyer,
                    recipient_id: buyer_id,
                    notification,
                });
            }
        };
    let email_buyer = |intents: &mut Vec<SideEffectIntent>,
                       subject_id: Uuid,
                       template: EmailTemplate,
                       data: serde_json::Value| {
        if let Some(to) = buyer_email {
            intents.push(SideEffectIntent::Email {
                subject_id,
                to: to.to_owned(),
                template,
                data,
            });
        }
    };

    match kind {
        OrderEventKind::OrderPlaced(placed) => {
            for shipment in &placed.shipments {
                let item_count = shipment
                    .items
                    .iter()
                    .map(|i| i.qty)
                    .fold(0u32, u32::saturating_add);
                intents.push(SideEffectIntent::Notify {
                    subject_id: order_id,
                    recipient: RecipientKind::Vendor,
                    recipient_id: shipment.vendor_id,
                    notification: templates::vendor_new_order(order_id, item_count),
                });
            }
            notify_buyer(
                &mut intents,
                order_id,
                templates::buyer_order_placed(order_id, placed.shipments.len()),
            );
            let shipments: Vec<_> = placed
                .shipments
                .iter()
                .map(|s| {
                    json!({
                        "shipment_id": s.shipment_id,
                        "vendor_id": s.vendor_id,
                        "method": s.method,
                        "shipping_price": s.price,
                        "subtotal": s.subtotal,
                        "items": s.items,
                        "return_address": return_addresses.get(&s.vendor_id),
                    })
                })
                .collect();
            email_buyer(
                &mut intents,
                order_id,
                EmailTemplate::OrderConfirmation,
                json!({
                    "order_id": order_id,
                    "name": placed.shipping_address.name,
                    "currency": placed.currency,
                    "subtotal": placed.subtotal,
                    "shipping_total": placed.shipping_total,
                    "total": placed.total,
                    "payment_method": placed.payment_method,
                    "shipments": shipments,
                }),
            );
        }
        OrderEventKind::PaymentConfirmed(_) => {
            notify_buyer(
                &mut intents,
                order_id,
                templates::buyer_payment_confirmed(order_id),
            );
        }
        OrderEventKind::ShipmentStatusChanged(changed) => {
            let subject_id = shipment_status_subject(changed.shipment_id, changed.to);
            notify_buyer(
                &mut intents,
                subject_id,
                templates::buyer_shipment_status(order_id, changed.to),
            );
            if matches!(
                changed.to,
                ShipmentStatus::InTransit | ShipmentStatus::Delivered
            ) {
                let tracking_url = order
                    .shipments
                    .iter()
                    .find(|s| s.shipment_id == changed.shipment_id)
                    .and_then(|s| s.carrier.as_ref())
                    .map(|c| c.tracking_url.clone());
                email_buyer(
                    &mut intents,
                    subject_id,
                    EmailTemplate::ShipmentStatus,
                    json!({
                        "order_id": order_id,
                        "shipment_id": changed.shipment_id,
                        "status": changed.to,
                        "tracking_url": tracking_url,
                    }),
                );
            }
        }
        OrderEventKind::PickupScheduled(scheduled) => {
            notify_buyer(
                &mut intents,
                scheduled.shipment_id,
                templates::buyer_pickup_scheduled(order_id, &scheduled.carrier.tracking_url),
            );
            email_buyer(
                &mut intents,
                scheduled.shipment_id,
                EmailTemplate::PickupScheduled,
                json!({
                    "order_id": order_id,
                    "shipment_id": scheduled.shipment_id,
                    "awb": scheduled.carrier.awb,
                    "tracking_url": scheduled.carrier.tracking_url,
                    "pickup_window_start": scheduled.carrier.pickup_window_start,
                    "pickup_window_end": scheduled.carrier.pickup_window_end,
                }),
            );
        }
        OrderEventKind::InvoiceIssued(issued) => {
            let subject_id = invoice_subject(issued.shipment_id, &issued.invoice_number);
            notify_buyer(
                &mut intents,
                subject_id,
                templates::buyer_invoice_issued(order_id, &issued.invoice_number),
            );
            email_buyer(
                &mut intents,
                subject_id,
                EmailTemplate::InvoiceIssued,
                json!({
                    "order_id": order_id,
                    "shipment_id": issued.shipment_id,
                    "invoice_number": issued.invoice_number,
                    "invoice_url": issued.invoice_url,
                }),
            );
        }
        OrderEventKind::ShipmentCancelledByVendor(cancelled) => {
            let message =
                templates::vendor_cancel_message(cancelled.reason, cancelled.note.as_deref());
            notify_buyer(
                &mut intents,
                cancelled.shipment_id,
                templates::buyer_shipment_cancelled(order_id, message.clone()),
            );
            email_buyer(
                &mut intents,
                cancelled.shipment_id,
                EmailTemplate::ShipmentCancelled,
                json!({
                    "order_id": order_id,
                    "shipment_id": cancelled.shipment_id,
                    "reason": cancelled.reason,
                    "message": message,
                }),
            );
        }
        OrderEventKind::OrderCancelled(cancelled) => {
            for vendor_id in &cancelled.affected_vendor_ids {
                intents.push(SideEffectIntent::Notify {
                    subject_id: order_id,
                    recipient: RecipientKind::Vendor,
                    recipient_id: *vendor_id,
                    notification: templates::vendor_order_cancelled(order_id),
                });
            }
            email_buyer(
                &mut intents,
                order_id,
                EmailTemplate::OrderCancelled,
                json!({
                    "order_id": order_id,
                    "total": order.total,
                    "currency": order.currency,
                }),
            );
        }
        OrderEventKind::OrderFulfilled(_) => {
            notify_buyer(
                &mut intents,
                order_id,
                templates::buyer_order_fulfilled(order_id),
            );
        }
    }

    Ok(intents)
}
