//! Aggregate roots for the Ordering & Fulfillment context.
//!
//! An order owns its shipments as child entities, so every change to a
//! shipment is serialized through the order's event stream.

use bazaar_core::actor::Actor;
use bazaar_core::aggregate::AggregateRoot;
use bazaar_core::clock::Clock;
use bazaar_core::error::DomainError;
use bazaar_core::event::EventMetadata;
use bazaar_core::rng::DeterministicRng;
use bazaar_shipping::domain::policy::ShipmentMethod;
use bazaar_shipping::domain::quote::ShippingQuote;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::address::{CustomerType, PaymentMethod, ShippingAddress};
use super::cancellation::{VendorCancellation, ensure_cancellable};
use super::events::{
    CarrierInfo, InvoiceIssued, OrderCancelled, OrderEvent, OrderEventKind, OrderFulfilled,
    OrderPlaced, PaymentConfirmed, PickupScheduled, PlacedShipment, ShipmentCancelledByVendor,
    ShipmentItem, ShipmentStatusChanged,
};
use super::status::{OrderStatus, ShipmentStatus, Transition, check_transition};

/// Base URL of the simulated carrier.
pub const CARRIER_BASE_URL: &str = "https://carrier.example.test";

const AWB_MIN: u32 = 1_000_000_000;

/// Invoice attached to a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    /// Invoice number.
    pub number: String,
    /// Download location.
    pub url: String,
}

/// One vendor's fulfilment unit.
#[derive(Debug, Clone)]
pub struct Shipment {
    /// Shipment identifier.
    pub id: Uuid,
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
    /// Carrier metadata, present once a pickup was scheduled.
    pub carrier: Option<CarrierInfo>,
    /// Invoice, once issued.
    pub invoice: Option<Invoice>,
    /// Vendor's cancellation reason, if the vendor cancelled.
    pub vendor_cancellation: Option<VendorCancellation>,
}

impl Shipment {
    fn from_placed(placed: &PlacedShipment) -> Self {
        Self {
            id: placed.shipment_id,
            vendor_id: placed.vendor_id,
            method: placed.method,
            price: placed.price,
            subtotal: placed.subtotal,
            status: ShipmentStatus::Pending,
            items: placed.items.clone(),
            carrier: None,
            invoice: None,
            vendor_cancellation: None,
        }
    }
}

/// Everything checkout knows about an order besides its priced lines.
#[derive(Debug, Clone)]
pub struct PlacementDetails {
    /// The buyer, if known.
    pub buyer_id: Option<Uuid>,
    /// The cart being converted.
    pub cart_id: Uuid,
    /// How the buyer pays.
    pub payment_method: PaymentMethod,
    /// Validated delivery address.
    pub shipping_address: ShippingAddress,
}

/// Pickup window requested by a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl PickupWindow {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless `end` is after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::Validation(
                "pickup window end must be after its start".to_owned(),
            ));
        }
        Ok(Self { start, end })
    }
}

/// The aggregate root for an order.
#[derive(Debug)]
pub struct Order {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) placed: bool,
    pub(crate) buyer_id: Option<Uuid>,
    pub(crate) cart_id: Uuid,
    pub(crate) status: OrderStatus,
    pub(crate) currency: String,
    pub(crate) subtotal: Decimal,
    pub(crate) shipping_total: Decimal,
    pub(crate) total: Decimal,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) customer_type: CustomerType,
    pub(crate) shipping_address: ShippingAddress,
    pub(crate) placed_at: Option<DateTime<Utc>>,
    pub(crate) shipments: Vec<Shipment>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<OrderEvent>,
}

impl Order {
    /// Creates an order that has not been placed yet.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            placed: false,
            buyer_id: None,
            cart_id: Uuid::nil(),
            status: OrderStatus::Pending,
            currency: String::new(),
            subtotal: Decimal::ZERO,
            shipping_total: Decimal::ZERO,
            total: Decimal::ZERO,
            payment_method: PaymentMethod::Cod,
            customer_type: CustomerType::PF,
            shipping_address: ShippingAddress::default(),
            placed_at: None,
            shipments: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns `true` once `OrderPlaced` has been applied.
    #[must_use]
    pub fn is_placed(&self) -> bool {
        self.placed
    }

    /// The buyer, if known.
    #[must_use]
    pub fn buyer_id(&self) -> Option<Uuid> {
        self.buyer_id
    }

    /// Current order status.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Grand total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// ISO currency code.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// How the buyer pays.
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Delivery address.
    #[must_use]
    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    /// Shipments, ordered by vendor id.
    #[must_use]
    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    /// Statuses of every shipment.
    #[must_use]
    pub fn shipment_statuses(&self) -> Vec<ShipmentStatus> {
        self.shipments.iter().map(|s| s.status).collect()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: OrderEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = OrderEvent {
            metadata: EventMetadata::for_command(
                kind.event_type(),
                self.id,
                self.next_sequence_number(),
                correlation_id,
                clock.now(),
            ),
            kind,
        };
        self.uncommitted_events.push(event);
    }

    fn ensure_placed(&self) -> Result<(), DomainError> {
        if self.placed {
            Ok(())
        } else {
            Err(DomainError::AggregateNotFound(self.id))
        }
    }

    fn shipment(&self, shipment_id: Uuid) -> Result<&Shipment, DomainError> {
        self.shipments
            .iter()
            .find(|s| s.id == shipment_id)
            .ok_or(DomainError::AggregateNotFound(shipment_id))
    }

    /// Looks up a shipment and checks that `actor` may act on it.
    fn authorized_shipment(
        &self,
        shipment_id: Uuid,
        actor: &Actor,
    ) -> Result<&Shipment, DomainError> {
        self.ensure_placed()?;
        let shipment = self.shipment(shipment_id)?;
        match actor {
            Actor::Admin => Ok(shipment),
            Actor::Vendor(vendor_id) if *vendor_id == shipment.vendor_id => Ok(shipment),
            Actor::Vendor(_) => Err(DomainError::Forbidden(format!(
                "shipment {shipment_id} belongs to another vendor"
            ))),
            Actor::Buyer(_) | Actor::Guest => Err(DomainError::Forbidden(
                "only the shipment's vendor or an admin may change it".to_owned(),
            )),
        }
    }

    /// Whether `actor` speaks for the buyer side of the order: the buyer, an
    /// admin, or a guest when the order has no buyer.
    #[must_use]
    pub fn acts_for_buyer(&self, actor: &Actor) -> bool {
        match actor {
            Actor::Admin => true,
            Actor::Buyer(buyer_id) => self.buyer_id == Some(*buyer_id),
            Actor::Guest => self.buyer_id.is_none(),
            Actor::Vendor(_) => false,
        }
    }

    /// Whether moving `shipment_id` to `status` leaves every shipment
    /// terminal while the order is still open.
    fn completes_with(&self, shipment_id: Uuid, status: ShipmentStatus) -> bool {
        !self.status.is_closed()
            && self.shipments.iter().all(|s| {
                if s.id == shipment_id {
                    status.is_terminal()
                } else {
                    s.status.is_terminal()
                }
            })
    }

    fn record_fulfilment_if_complete(
        &mut self,
        shipment_id: Uuid,
        status: ShipmentStatus,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        if self.completes_with(shipment_id, status) {
            self.record(
                OrderEventKind::OrderFulfilled(OrderFulfilled { order_id: self.id }),
                correlation_id,
                clock,
            );
        }
    }

    /// Places the order from an authoritative quote, producing `OrderPlaced`
    /// with one `PENDING` shipment per vendor group.
    ///
    /// Shipment ids are derived from the order id and vendor id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CartEmpty` if the quote has no vendor groups, or
    /// `DomainError::Validation` if the order was already placed.
    pub fn place(
        &mut self,
        details: PlacementDetails,
        quote: &ShippingQuote,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.placed {
            return Err(DomainError::Validation(format!(
                "order {} has already been placed",
                self.id
            )));
        }
        if quote.is_empty() {
            return Err(DomainError::CartEmpty(details.cart_id));
        }

        let shipments = quote
            .by_seller
            .iter()
            .map(|group| PlacedShipment {
                shipment_id: Uuid::new_v5(&self.id, group.vendor_id.as_bytes()),
                vendor_id: group.vendor_id,
                method: group.shipping.method,
                price: group.shipping.cost,
                subtotal: group.subtotal,
                items: group
                    .lines
                    .iter()
                    .map(|line| ShipmentItem {
                        product_id: line.product_id,
                        title: line.title.clone(),
                        qty: line.qty,
                        unit_price: line.unit_price,
                    })
                    .collect(),
            })
            .collect();

        let customer_type = details.shipping_address.customer_type();
        self.record(
            OrderEventKind::OrderPlaced(OrderPlaced {
                order_id: self.id,
                buyer_id: details.buyer_id,
                cart_id: details.cart_id,
                currency: quote.currency.clone(),
                subtotal: quote.merchandise,
                shipping_total: quote.shipping_total,
                total: quote.grand_total(),
                payment_method: details.payment_method,
                customer_type,
                shipping_address: details.shipping_address,
                shipments,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Confirms payment, moving the order from `PENDING` to `PAID`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` unless `actor` is an admin, or
    /// `DomainError::Validation` if the order is not `PENDING`.
    pub fn confirm_payment(
        &mut self,
        payment_reference: Option<String>,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_placed()?;
        if !actor.is_admin() {
            return Err(DomainError::Forbidden(
                "only the payment collaborator may confirm payments".to_owned(),
            ));
        }
        if self.status != OrderStatus::Pending {
            return Err(DomainError::Validation(format!(
                "order {} is {}; only PENDING orders can be paid",
                self.id, self.status
            )));
        }
        self.record(
            OrderEventKind::PaymentConfirmed(PaymentConfirmed {
                order_id: self.id,
                payment_reference,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Moves a shipment to `to`. Completing the last open shipment also
    /// records `OrderFulfilled`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` if `actor` may not act on the
    /// shipment, `DomainError::AggregateNotFound` for an unknown shipment, or
    /// `DomainError::InvalidTransition` when leaving a terminal status.
    pub fn change_shipment_status(
        &mut self,
        shipment_id: Uuid,
        to: ShipmentStatus,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Transition, DomainError> {
        let shipment = self.authorized_shipment(shipment_id, actor)?;
        let from = shipment.status;
        let vendor_id = shipment.vendor_id;
        if check_transition(shipment_id, from, to)? == Transition::NoOp {
            return Ok(Transition::NoOp);
        }

        self.record(
            OrderEventKind::ShipmentStatusChanged(ShipmentStatusChanged {
                order_id: self.id,
                shipment_id,
                vendor_id,
                from,
                to,
            }),
            correlation_id,
            clock,
        );
        self.record_fulfilment_if_complete(shipment_id, to, correlation_id, clock);
        Ok(Transition::Change)
    }

    /// Books a simulated carrier pickup, moving the shipment to
    /// `PICKUP_SCHEDULED` with a fresh AWB. A shipment whose pickup is
    /// already scheduled keeps its AWB and nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden`, `DomainError::AggregateNotFound` or
    /// `DomainError::InvalidTransition` as for status changes.
    pub fn schedule_pickup(
        &mut self,
        shipment_id: Uuid,
        window: PickupWindow,
        actor: &Actor,
        rng: &mut dyn DeterministicRng,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let shipment = self.authorized_shipment(shipment_id, actor)?;
        let from = shipment.status;
        let vendor_id = shipment.vendor_id;
        if from == ShipmentStatus::PickupScheduled {
            return Ok(());
        }
        if from.is_terminal() {
            return Err(DomainError::InvalidTransition {
                shipment_id,
                from: from.as_str().to_owned(),
                to: ShipmentStatus::PickupScheduled.as_str().to_owned(),
            });
        }

        let awb = format!("BZ{}", rng.next_u32_range(AWB_MIN, u32::MAX));
        let carrier = CarrierInfo {
            label_url: format!("{CARRIER_BASE_URL}/labels/{awb}.pdf"),
            tracking_url: format!("{CARRIER_BASE_URL}/track/{awb}"),
            awb,
            pickup_window_start: window.start,
            pickup_window_end: window.end,
        };
        self.record(
            OrderEventKind::PickupScheduled(PickupScheduled {
                order_id: self.id,
                shipment_id,
                vendor_id,
                from,
                carrier,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Attaches an invoice to a shipment. Issuing the invoice the shipment
    /// already carries records nothing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for blank fields or a `RETURNED`
    /// shipment, and `DomainError::Forbidden` or
    /// `DomainError::AggregateNotFound` as for status changes.
    pub fn issue_invoice(
        &mut self,
        shipment_id: Uuid,
        invoice_number: &str,
        invoice_url: &str,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let shipment = self.authorized_shipment(shipment_id, actor)?;
        let vendor_id = shipment.vendor_id;
        if shipment.status == ShipmentStatus::Returned {
            return Err(DomainError::Validation(format!(
                "shipment {shipment_id} was returned and cannot be invoiced"
            )));
        }
        let invoice_number = invoice_number.trim();
        let invoice_url = invoice_url.trim();
        if invoice_number.is_empty() || invoice_url.is_empty() {
            return Err(DomainError::Validation(
                "invoice number and url are required".to_owned(),
            ));
        }
        let already_issued = shipment
            .invoice
            .as_ref()
            .is_some_and(|i| i.number == invoice_number && i.url == invoice_url);
        if already_issued {
            return Ok(());
        }

        self.record(
            OrderEventKind::InvoiceIssued(InvoiceIssued {
                order_id: self.id,
                shipment_id,
                vendor_id,
                invoice_number: invoice_number.to_owned(),
                invoice_url: invoice_url.to_owned(),
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Cancels one shipment on behalf of its vendor, moving it to
    /// `RETURNED`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if the shipment is already
    /// terminal, and `DomainError::Forbidden` or
    /// `DomainError::AggregateNotFound` as for status changes.
    pub fn cancel_shipment_by_vendor(
        &mut self,
        shipment_id: Uuid,
        cancellation: VendorCancellation,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let shipment = self.authorized_shipment(shipment_id, actor)?;
        let from = shipment.status;
        let vendor_id = shipment.vendor_id;
        if from.is_terminal() {
            return Err(DomainError::InvalidTransition {
                shipment_id,
                from: from.as_str().to_owned(),
                to: ShipmentStatus::Returned.as_str().to_owned(),
            });
        }

        self.record(
            OrderEventKind::ShipmentCancelledByVendor(ShipmentCancelledByVendor {
                order_id: self.id,
                shipment_id,
                vendor_id,
                from,
                reason: cancellation.reason,
                note: cancellation.note,
            }),
            correlation_id,
            clock,
        );
        self.record_fulfilment_if_complete(
            shipment_id,
            ShipmentStatus::Returned,
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Cancels the whole order. Every shipment still open moves to
    /// `RETURNED`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` unless `actor` acts for the buyer
    /// (see [`Order::acts_for_buyer`]), and `DomainError::NotCancellable` if any shipment has
    /// progressed or the order is closed.
    pub fn cancel(
        &mut self,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_placed()?;
        if !self.acts_for_buyer(actor) {
            return Err(DomainError::Forbidden(
                "only the buyer of the order or an admin may cancel it".to_owned(),
            ));
        }
        ensure_cancellable(self.id, self.status, &self.shipment_statuses())?;

        let (returned_shipment_ids, affected_vendor_ids) = self
            .shipments
            .iter()
            .filter(|s| !s.status.is_terminal())
            .map(|s| (s.id, s.vendor_id))
            .unzip();
        self.record(
            OrderEventKind::OrderCancelled(OrderCancelled {
                order_id: self.id,
                cancelled_by: actor.to_string(),
                returned_shipment_ids,
                affected_vendor_ids,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    fn shipment_mut(&mut self, shipment_id: Uuid) -> Option<&mut Shipment> {
        self.shipments.iter_mut().find(|s| s.id == shipment_id)
    }
}

impl AggregateRoot for Order {
    type Event = OrderEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            OrderEventKind::OrderPlaced(payload) => {
                self.placed = true;
                self.buyer_id = payload.buyer_id;
                self.cart_id = payload.cart_id;
                self.status = OrderStatus::Pending;
                self.currency.clone_from(&payload.currency);
                self.subtotal = payload.subtotal;
                self.shipping_total = payload.shipping_total;
                self.total = payload.total;
                self.payment_method = payload.payment_method;
                self.customer_type = payload.customer_type;
                self.shipping_address = payload.shipping_address.clone();
                self.placed_at = Some(event.metadata.occurred_at);
                self.shipments = payload.shipments.iter().map(Shipment::from_placed).collect();
            }
            OrderEventKind::PaymentConfirmed(_) => {
                self.status = OrderStatus::Paid;
            }
            OrderEventKind::ShipmentStatusChanged(payload) => {
                if let Some(shipment) = self.shipment_mut(payload.shipment_id) {
                    shipment.status = payload.to;
                }
            }
            OrderEventKind::PickupScheduled(payload) => {
                if let Some(shipment) = self.shipment_mut(payload.shipment_id) {
                    shipment.status = ShipmentStatus::PickupScheduled;
                    shipment.carrier = Some(payload.carrier.clone());
                }
            }
            OrderEventKind::InvoiceIssued(payload) => {
                if let Some(shipment) = self.shipment_mut(payload.shipment_id) {
                    shipment.invoice = Some(Invoice {
                        number: payload.invoice_number.clone(),
                        url: payload.invoice_url.clone(),
                    });
                }
            }
            OrderEventKind::ShipmentCancelledByVendor(payload) => {
                if let Some(shipment) = self.shipment_mut(payload.shipment_id) {
                    shipment.status = ShipmentStatus::Returned;
                    shipment.vendor_cancellation = Some(VendorCancellation {
                        reason: payload.reason,
                        note: payload.note.clone(),
                    });
                }
            }
            OrderEventKind::OrderCancelled(payload) => {
                self.status = OrderStatus::Cancelled;
                for shipment_id in &payload.returned_shipment_ids {
                    if let Some(shipment) = self.shipment_mut(*shipment_id) {
                        shipment.status = ShipmentStatus::Returned;
                    }
                }
            }
            OrderEventKind::OrderFulfilled(_) => {
                self.status = OrderStatus::Fulfilled;
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
