//! Routes for quoting and placing orders.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use bazaar_core::actor::Actor;
use bazaar_core::error::DomainError;
use bazaar_ordering::application::command_handlers;
use bazaar_ordering::application::ports::PaymentRedirect;
use bazaar_ordering::domain::address::{CustomerType, PaymentMethod, ShippingAddress};
use bazaar_ordering::domain::commands::PlaceOrder;
use bazaar_shipping::application::quote_handlers::handle_quote_shipping;
use bazaar_shipping::application::resolution::RequestedLine;
use bazaar_shipping::domain::commands::QuoteShipping;
use bazaar_shipping::domain::policy::Destination;
use bazaar_shipping::domain::quote::ShippingQuote;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dispatch_side_effects;
use crate::actor::RequestActor;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /quote.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    /// Requested products.
    pub items: Vec<RequestedLine>,
    /// Where the order would ship.
    pub address: Destination,
    /// Whether the buyer wants to collect in person.
    #[serde(default)]
    pub is_pickup: bool,
}

/// Response body for POST /quote.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    /// The quote.
    #[serde(flatten)]
    pub quote: ShippingQuote,
    /// Requested products that could not be resolved.
    pub dropped_product_ids: Vec<Uuid>,
}

/// Request body for POST /place.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    /// The cart to check out.
    pub cart_id: Uuid,
    /// Delivery address.
    pub address: ShippingAddress,
    /// `CARD` or `COD`.
    pub payment_method: String,
    /// `PF` or `PJ`.
    #[serde(default)]
    pub customer_type: CustomerType,
    /// Whether the buyer collects in person.
    #[serde(default)]
    pub is_pickup: bool,
}

/// Response body for POST /place.
#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    /// Always `true`.
    pub ok: bool,
    /// The new order.
    pub order_id: Uuid,
    /// Where to send the buyer for card payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRedirect>,
    /// Cart products dropped because they are no longer sold.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_product_ids: Vec<Uuid>,
}

/// POST /quote
#[instrument(skip(state, request), fields(items = request.items.len()))]
async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let command = QuoteShipping {
        correlation_id: Uuid::new_v4(),
        items: request.items,
        destination: request.address,
        is_pickup: request.is_pickup,
    };

    info!(correlation_id = %command.correlation_id, "handling quote_shipping command");

    let result = handle_quote_shipping(
        &command,
        &*state.collaborators.catalog,
        &*state.collaborators.vendors,
        &state.settings.quote,
    )
    .await?;

    Ok(Json(QuoteResponse {
        quote: result.quote,
        dropped_product_ids: result.dropped_product_ids,
    }))
}

/// POST /place
#[instrument(skip(state, request), fields(cart_id = %request.cart_id, actor = %actor))]
async fn place(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>, ApiError> {
    let buyer_id = match actor {
        Actor::Buyer(id) => Some(id),
        Actor::Guest => None,
        Actor::Vendor(_) | Actor::Admin => {
            return Err(DomainError::Forbidden("only buyers can check out".to_owned()).into());
        }
    };
    let payment_method: PaymentMethod = request.payment_method.parse()?;
    let command = PlaceOrder {
        correlation_id: Uuid::new_v4(),
        buyer_id,
        cart_id: request.cart_id,
        address: request.address,
        payment_method,
        customer_type: request.customer_type,
        is_pickup: request.is_pickup,
    };

    info!(correlation_id = %command.correlation_id, "handling place_order command");

    let result = command_handlers::handle_place_order(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        &*state.collaborators.catalog,
        &*state.collaborators.vendors,
        &state.settings.quote,
    )
    .await?;
    dispatch_side_effects(&state, &result.order, result.stored_events);

    // The order is committed: initiate from the order in hand so every
    // failure past this point still carries the order id.
    let payment = if payment_method == PaymentMethod::Card {
        Some(
            command_handlers::initiate_payment_for(
                &result.order,
                &*state.collaborators.payments,
            )
            .await?,
        )
    } else {
        None
    };

    Ok(Json(PlaceOrderResponse {
        ok: true,
        order_id: result.order_id,
        payment,
        dropped_product_ids: result.dropped_product_ids,
    }))
}

/// Returns the router for checkout.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(quote))
        .route("/place", post(place))
}
