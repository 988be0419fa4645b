//! Query handlers for the Ordering & Fulfillment context.
//!
//! Views are always built from freshly loaded state; the UI status is
//! derived on every read.

use bazaar_core::actor::Actor;
use bazaar_core::aggregate::AggregateRoot;
use bazaar_core::error::DomainError;
use bazaar_core::money::VatBreakdown;
use bazaar_core::repository::EventRepository;
use bazaar_shipping::domain::policy::ShipmentMethod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::command_handlers::load_order;
use crate::domain::address::{CustomerType, PaymentMethod, ShippingAddress};
use crate::domain::aggregates::{Invoice, Order, Shipment};
use crate::domain::cancellation::VendorCancellation;
use crate::domain::events::{CarrierInfo, ShipmentItem};
use crate::domain::status::{OrderStatus, ShipmentStatus, UiStatus, derive_ui_status};

/// Read-only view of a shipment.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentView {
    /// Shipment identifier.
    pub shipment_id: Uuid,
    /// Vendor fulfilling the shipment.
    pub vendor_id: Uuid,
    /// Delivery method.
    pub method: ShipmentMethod,
    /// Shipping price.
    pub price: Decimal,
    /// Merchandise subtotal.
    pub subtotal: Decimal,
    /// Current status.
    pub status: ShipmentStatus,
    /// Purchased lines.
    pub items: Vec<ShipmentItem>,
    /// Carrier metadata once a pickup is scheduled.
    pub carrier: Option<CarrierInfo>,
    /// Invoice once issued.
    pub invoice: Option<Invoice>,
    /// Vendor's cancellation reason.
    pub vendor_cancellation: Option<VendorCancellation>,
}

impl From<&Shipment> for ShipmentView {
    fn from(shipment: &Shipment) -> Self {
        Self {
            shipment_id: shipment.id,
            vendor_id: shipment.vendor_id,
            method: shipment.method,
            price: shipment.price,
            subtotal: shipment.subtotal,
            status: shipment.status,
            items: shipment.items.clone(),
            carrier: shipment.carrier.clone(),
            invoice: shipment.invoice.clone(),
            vendor_cancellation: shipment.vendor_cancellation.clone(),
        }
    }
}

/// Buyer-facing view of an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    /// The order identifier.
    pub order_id: Uuid,
    /// The buyer, if known.
    pub buyer_id: Option<Uuid>,
    /// Stored order status.
    pub status: OrderStatus,
    /// Derived buyer-facing status.
    pub ui_status: UiStatus,
    /// ISO currency code.
    pub currency: String,
    /// Merchandise subtotal.
    pub subtotal: Decimal,
    /// Shipping total.
    pub shipping_total: Decimal,
    /// Grand total.
    pub total: Decimal,
    /// VAT contained in the total.
    pub vat: VatBreakdown,
    /// How the buyer pays.
    pub payment_method: PaymentMethod,
    /// Natural person or legal entity.
    pub customer_type: CustomerType,
    /// Delivery address.
    pub shipping_address: ShippingAddress,
    /// When the order was placed.
    pub placed_at: Option<DateTime<Utc>>,
    /// Shipments, ordered by vendor id.
    pub shipments: Vec<ShipmentView>,
    /// Current version (event count).
    pub version: i64,
}

/// Seller-facing view: only the vendor's own shipments.
#[derive(Debug, Clone, Serialize)]
pub struct VendorOrderView {
    /// The order identifier.
    pub order_id: Uuid,
    /// The vendor the view is for.
    pub vendor_id: Uuid,
    /// Stored order status.
    pub order_status: OrderStatus,
    /// Status derived from the vendor's shipments.
    pub ui_status: UiStatus,
    /// ISO currency code.
    pub currency: String,
    /// Where to deliver.
    pub shipping_address: ShippingAddress,
    /// The vendor's shipments.
    pub shipments: Vec<ShipmentView>,
}

/// Builds the buyer-facing view of an order.
#[must_use]
pub fn order_view(order: &Order, vat_rate_percent: Decimal) -> OrderView {
    OrderView {
        order_id: order.id,
        buyer_id: order.buyer_id,
        status: order.status,
        ui_status: derive_ui_status(order.status, &order.shipment_statuses()),
        currency: order.currency.clone(),
        subtotal: order.subtotal,
        shipping_total: order.shipping_total,
        total: order.total,
        vat: VatBreakdown::split(order.total, vat_rate_percent),
        payment_method: order.payment_method,
        customer_type: order.customer_type,
        shipping_address: order.shipping_address.clone(),
        placed_at: order.placed_at,
        shipments: order.shipments.iter().map(ShipmentView::from).collect(),
        version: order.version(),
    }
}

/// Retrieves the buyer-facing view of an order.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the order does not exist and
/// `DomainError::Forbidden` if `actor` is neither its buyer nor an admin.
pub async fn get_order_by_id(
    order_id: Uuid,
    actor: &Actor,
    vat_rate_percent: Decimal,
    repo: &dyn EventRepository,
) -> Result<OrderView, DomainError> {
    let order = load_order(order_id, repo).await?;
    if !order.acts_for_buyer(actor) {
        return Err(DomainError::Forbidden(format!(
            "order {order_id} belongs to another buyer"
        )));
    }
    Ok(order_view(&order, vat_rate_percent))
}

/// Retrieves a vendor's view of an order.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` unless `actor` is a vendor, and
/// `DomainError::AggregateNotFound` if the order has no shipment of theirs.
pub async fn get_vendor_order_view(
    order_id: Uuid,
    actor: &Actor,
    repo: &dyn EventRepository,
) -> Result<VendorOrderView, DomainError> {
    let Actor::Vendor(vendor_id) = *actor else {
        return Err(DomainError::Forbidden(
            "the seller view is only available to vendors".to_owned(),
        ));
    };
    let order = load_order(order_id, repo).await?;
    let shipments: Vec<ShipmentView> = order
        .shipments
        .iter()
        .filter(|s| s.vendor_id == vendor_id)
        .map(ShipmentView::from)
        .collect();
    if shipments.is_empty() {
        return Err(DomainError::AggregateNotFound(order_id));
    }
    let statuses: Vec<ShipmentStatus> = shipments.iter().map(|s| s.status).collect();

    Ok(VendorOrderView {
        order_id,
        vendor_id,
        order_status: order.status,
        ui_status: derive_ui_status(order.status, &statuses),
        currency: order.currency.clone(),
        shipping_address: order.shipping_address.clone(),
        shipments,
    })
}
