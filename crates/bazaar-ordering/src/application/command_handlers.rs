//! Command handlers for the Ordering & Fulfillment context.
//!
//! Handlers validate input, load the order (and, for checkout, the cart),
//! execute the domain method and append the resulting events. Appends that
//! lose an optimistic-concurrency race are retried against freshly loaded
//! state a bounded number of times.

use std::sync::Mutex;

use bazaar_cart::application::command_handlers::load_cart;
use bazaar_core::aggregate::AggregateRoot;
use bazaar_core::clock::Clock;
use bazaar_core::error::DomainError;
use bazaar_core::repository::{EventRepository, StoredEvent, StreamAppend};
use bazaar_core::rng::DeterministicRng;
use bazaar_shipping::application::ports::{ProductCatalog, VendorDirectory};
use bazaar_shipping::application::quote_handlers::{QuoteSettings, load_policy_snapshot};
use bazaar_shipping::application::resolution::{RequestedLine, resolve_lines};
use bazaar_shipping::domain::quote::quote;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ports::{PaymentInitiator, PaymentRedirect, PaymentRequest};
use crate::domain::address::PaymentMethod;
use crate::domain::aggregates::{Order, PickupWindow, PlacementDetails};
use crate::domain::cancellation::VendorCancellation;
use crate::domain::commands::{
    CancelOrder, CancelShipment, ConfirmPayment, InitiatePayment, IssueInvoice, PlaceOrder,
    SchedulePickup, UpdateShipmentStatus,
};
use crate::domain::events::{OrderEvent, OrderEventKind};
use crate::domain::status::OrderStatus;

/// How many times a write is attempted before a conflict is surfaced.
pub const MAX_CONFLICT_ATTEMPTS: u32 = 3;

/// Result of a successfully handled order command.
#[derive(Debug)]
pub struct OrderCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted; empty for a no-op.
    pub stored_events: Vec<StoredEvent>,
    /// The order with the new events applied.
    pub order: Order,
}

/// Result of a successful checkout.
#[derive(Debug)]
pub struct PlaceOrderResult {
    /// The new order.
    pub order_id: Uuid,
    /// Events written to the order and cart streams.
    pub stored_events: Vec<StoredEvent>,
    /// Cart products dropped under best-effort resolution.
    pub dropped_product_ids: Vec<Uuid>,
    /// The committed order.
    pub order: Order,
}

/// Reconstitutes an `Order` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(order_id: Uuid, existing_events: &[StoredEvent]) -> Result<Order, DomainError> {
    let mut order = Order::new(order_id);
    for stored in existing_events {
        let kind: OrderEventKind = stored.decode_payload()?;
        order.apply(&OrderEvent {
            metadata: stored.metadata(),
            kind,
        });
    }
    Ok(order)
}

/// Loads an order by id.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the order has no events.
pub async fn load_order(order_id: Uuid, repo: &dyn EventRepository) -> Result<Order, DomainError> {
    let existing_events = repo.load_events(order_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(order_id));
    }
    reconstitute(order_id, &existing_events)
}

/// Loads the order, lets `decide` record events on it and appends them. On
/// a version conflict the order is reloaded and `decide` runs again, so the
/// decision is always made against the state it is written on.
async fn execute_on_order<F>(
    order_id: Uuid,
    repo: &dyn EventRepository,
    mut decide: F,
) -> Result<OrderCommandResult, DomainError>
where
    F: FnMut(&mut Order) -> Result<(), DomainError> + Send,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut order = load_order(order_id, repo).await?;
        decide(&mut order)?;

        let append = StreamAppend::pending(&order);
        if append.is_empty() {
            return Ok(OrderCommandResult {
                aggregate_id: order_id,
                stored_events: Vec::new(),
                order,
            });
        }

        match repo
            .append_events(order_id, append.expected_version, &append.events)
            .await
        {
            Ok(()) => {
                order.commit_uncommitted_events();
                return Ok(OrderCommandResult {
                    aggregate_id: order_id,
                    stored_events: append.events,
                    order,
                });
            }
            Err(e) if e.is_conflict() && attempt < MAX_CONFLICT_ATTEMPTS => {
                debug!(%order_id, attempt, "order changed concurrently, reloading");
            }
            Err(e) => return Err(e),
        }
    }
}

/// Handles the `PlaceOrder` command: validates the address, resolves the
/// cart through the catalog, prices it under a fresh policy snapshot and
/// appends `OrderPlaced` and `CartCleared` in one atomic write.
///
/// When the cart stream moved underneath (a concurrent checkout), the cart
/// is reloaded; a cart emptied by the winner yields `CartEmpty`.
///
/// # Errors
///
/// Returns the address validation errors before anything is loaded,
/// `DomainError::CartEmpty` for an empty or fully unresolvable cart,
/// `DomainError::LineUnresolvable` under strict resolution, or repository
/// errors.
pub async fn handle_place_order(
    command: &PlaceOrder,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    catalog: &dyn ProductCatalog,
    vendors: &dyn VendorDirectory,
    settings: &QuoteSettings,
) -> Result<PlaceOrderResult, DomainError> {
    let address = command.address.clone().validate(command.customer_type)?;
    let destination = address.destination();
    let order_id = Uuid::new_v4();

    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut cart = load_cart(command.cart_id, repo).await?;
        if cart.is_empty() {
            return Err(DomainError::CartEmpty(command.cart_id));
        }

        let requested: Vec<RequestedLine> = cart
            .lines()
            .iter()
            .map(|line| RequestedLine {
                product_id: line.product_id,
                qty: line.qty,
            })
            .collect();
        let resolved = resolve_lines(&requested, catalog, settings.line_resolution).await?;
        if resolved.lines.is_empty() {
            return Err(DomainError::CartEmpty(command.cart_id));
        }
        let policies = load_policy_snapshot(&resolved.lines, vendors).await?;
        let quote = quote(
            &resolved.lines,
            &destination,
            command.is_pickup,
            &policies,
            &settings.currency,
        );

        let mut order = Order::new(order_id);
        order.place(
            PlacementDetails {
                buyer_id: command.buyer_id,
                cart_id: command.cart_id,
                payment_method: command.payment_method,
                shipping_address: address.clone(),
            },
            &quote,
            command.correlation_id,
            clock,
        )?;
        cart.clear(order_id, command.correlation_id, clock)?;

        let appends = [StreamAppend::pending(&order), StreamAppend::pending(&cart)];
        match repo.append_streams(&appends).await {
            Ok(()) => {
                order.commit_uncommitted_events();
                info!(
                    %order_id,
                    cart_id = %command.cart_id,
                    shipments = order.shipments().len(),
                    total = %order.total(),
                    "order placed"
                );
                return Ok(PlaceOrderResult {
                    order_id,
                    stored_events: appends.into_iter().flat_map(|a| a.events).collect(),
                    dropped_product_ids: resolved.dropped_product_ids,
                    order,
                });
            }
            Err(e) if e.is_conflict() && attempt < MAX_CONFLICT_ATTEMPTS => {
                debug!(
                    cart_id = %command.cart_id,
                    attempt,
                    "cart changed during checkout, reloading"
                );
            }
            Err(e) => return Err(e),
        }
    }
}

/// Handles the `InitiatePayment` command: asks the payment collaborator for
/// a redirect for a pending card order. Nothing is written; a failure
/// leaves the order `PENDING` and can be retried.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` for a foreign actor,
/// `DomainError::Validation` for a non-card or non-pending order, and
/// `DomainError::PaymentInitFailed` (carrying the order id) if the
/// collaborator fails.
pub async fn handle_initiate_payment(
    command: &InitiatePayment,
    repo: &dyn EventRepository,
    payments: &dyn PaymentInitiator,
) -> Result<PaymentRedirect, DomainError> {
    let order = load_order(command.order_id, repo).await?;
    if !order.acts_for_buyer(&command.actor) {
        return Err(DomainError::Forbidden(
            "only the buyer of the order or an admin may pay for it".to_owned(),
        ));
    }
    if order.payment_method() != PaymentMethod::Card {
        return Err(DomainError::Validation(format!(
            "order {} is paid {}",
            command.order_id,
            order.payment_method()
        )));
    }
    if order.status() != OrderStatus::Pending {
        return Err(DomainError::Validation(format!(
            "order {} is {}; only PENDING orders can be paid",
            command.order_id,
            order.status()
        )));
    }

    initiate_payment_for(&order, payments).await
}

/// Asks the payment collaborator for a redirect for an order already in
/// hand, without reloading it. Checkout uses this right after the order is
/// committed.
///
/// # Errors
///
/// Returns `DomainError::PaymentInitFailed` (carrying the order id) if the
/// collaborator fails. No other error is returned.
pub async fn initiate_payment_for(
    order: &Order,
    payments: &dyn PaymentInitiator,
) -> Result<PaymentRedirect, DomainError> {
    let order_id = order.aggregate_id();
    let request = PaymentRequest {
        order_id,
        amount: order.total(),
        currency: order.currency().to_owned(),
        buyer_email: order.shipping_address().email.clone(),
        description: format!("Bazaar order {order_id}"),
    };
    payments.initiate_payment(&request).await.map_err(|e| {
        warn!(%order_id, error = %e, "payment initiation failed");
        DomainError::PaymentInitFailed {
            order_id,
            reason: e.to_string(),
        }
    })
}

/// Handles the `ConfirmPayment` command.
///
/// # Errors
///
/// Returns `DomainError` if the order is missing, the actor is not an admin,
/// the order is not `PENDING`, or persistence fails.
pub async fn handle_confirm_payment(
    command: &ConfirmPayment,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<OrderCommandResult, DomainError> {
    execute_on_order(command.order_id, repo, |order| {
        order.confirm_payment(
            command.payment_reference.clone(),
            &command.actor,
            command.correlation_id,
            clock,
        )
    })
    .await
}

/// Handles the `UpdateShipmentStatus` command. Setting the current status
/// again succeeds without writing anything.
///
/// # Errors
///
/// Returns `DomainError` if the order or shipment is missing, the actor may
/// not act on the shipment, the transition leaves a terminal status, or
/// persistence fails.
pub async fn handle_update_shipment_status(
    command: &UpdateShipmentStatus,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<OrderCommandResult, DomainError> {
    execute_on_order(command.order_id, repo, |order| {
        order
            .change_shipment_status(
                command.shipment_id,
                command.status,
                &command.actor,
                command.correlation_id,
                clock,
            )
            .map(|_| ())
    })
    .await
}

/// Handles the `SchedulePickup` command.
///
/// The `Mutex` is locked only around the synchronous domain method call to
/// avoid holding a `MutexGuard` across await points.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty window, and otherwise the
/// same errors as a status change.
pub async fn handle_schedule_pickup(
    command: &SchedulePickup,
    clock: &dyn Clock,
    rng: &Mutex<dyn DeterministicRng + Send>,
    repo: &dyn EventRepository,
) -> Result<OrderCommandResult, DomainError> {
    let window = PickupWindow::new(command.window_start, command.window_end)?;
    execute_on_order(command.order_id, repo, |order| {
        let mut rng_guard = rng
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
        order.schedule_pickup(
            command.shipment_id,
            window,
            &command.actor,
            &mut *rng_guard,
            command.correlation_id,
            clock,
        )
    })
    .await
}

/// Handles the `IssueInvoice` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for blank fields or a returned
/// shipment, and otherwise the same errors as a status change.
pub async fn handle_issue_invoice(
    command: &IssueInvoice,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<OrderCommandResult, DomainError> {
    execute_on_order(command.order_id, repo, |order| {
        order.issue_invoice(
            command.shipment_id,
            &command.invoice_number,
            &command.invoice_url,
            &command.actor,
            command.correlation_id,
            clock,
        )
    })
    .await
}

/// Handles the `CancelShipment` command (vendor-initiated cancellation).
///
/// # Errors
///
/// Returns `DomainError::Validation` for a missing note on `other`, and
/// otherwise the same errors as a status change.
pub async fn handle_cancel_shipment(
    command: &CancelShipment,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<OrderCommandResult, DomainError> {
    let cancellation = VendorCancellation::new(command.reason, command.note.clone())?;
    execute_on_order(command.order_id, repo, |order| {
        order.cancel_shipment_by_vendor(
            command.shipment_id,
            cancellation.clone(),
            &command.actor,
            command.correlation_id,
            clock,
        )
    })
    .await
}

/// Handles the `CancelOrder` command. A concurrent shipment change forces a
/// reload, so a shipment that just advanced makes the order
/// `NotCancellable`.
///
/// # Errors
///
/// Returns `DomainError::Forbidden`, `DomainError::NotCancellable` or
/// repository errors.
pub async fn handle_cancel_order(
    command: &CancelOrder,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<OrderCommandResult, DomainError> {
    execute_on_order(command.order_id, repo, |order| {
        order.cancel(&command.actor, command.correlation_id, clock)
    })
    .await
}
