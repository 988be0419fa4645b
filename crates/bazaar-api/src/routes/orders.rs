//! Routes for reading, paying and cancelling orders.

use axum::extract::{Path, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use bazaar_ordering::application::command_handlers::{self, OrderCommandResult};
use bazaar_ordering::application::ports::PaymentRedirect;
use bazaar_ordering::application::query_handlers::{
    self, OrderView, VendorOrderView, order_view,
};
use bazaar_ordering::domain::commands;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dispatch_side_effects;
use crate::actor::RequestActor;
use crate::error::ApiError;
use crate::state::AppState;

/// Response body returned after an order command is handled.
#[derive(Debug, Serialize)]
pub struct OrderCommandResponse {
    /// Always `true`.
    pub ok: bool,
    /// IDs of the domain events produced; empty when nothing changed.
    pub event_ids: Vec<Uuid>,
    /// The order after the command.
    pub order: OrderView,
}

impl OrderCommandResponse {
    /// Dispatches side effects for `result` and builds the response.
    pub(crate) fn committed(state: &AppState, result: OrderCommandResult) -> Self {
        let event_ids = result.stored_events.iter().map(|e| e.event_id).collect();
        let order = order_view(&result.order, state.settings.vat_rate_percent);
        dispatch_side_effects(state, &result.order, result.stored_events);
        Self {
            ok: true,
            event_ids,
            order,
        }
    }
}

/// Request body for POST /{order_id}/payment/confirm.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmPaymentRequest {
    /// Gateway reference for the captured payment.
    #[serde(default)]
    pub payment_reference: Option<String>,
}

/// GET /{order_id}
async fn get_order(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderView>, ApiError> {
    let view = query_handlers::get_order_by_id(
        order_id,
        &actor,
        state.settings.vat_rate_percent,
        &*state.event_repository,
    )
    .await?;
    Ok(Json(view))
}

/// GET /{order_id}/vendor-view
async fn get_vendor_view(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(order_id): Path<Uuid>,
) -> Result<Json<VendorOrderView>, ApiError> {
    let view =
        query_handlers::get_vendor_order_view(order_id, &actor, &*state.event_repository).await?;
    Ok(Json(view))
}

/// POST /{order_id}/cancel
#[instrument(skip(state), fields(actor = %actor))]
async fn cancel_order(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderCommandResponse>, ApiError> {
    let command = commands::CancelOrder {
        correlation_id: Uuid::new_v4(),
        order_id,
        actor,
    };

    info!(correlation_id = %command.correlation_id, "handling cancel_order command");

    let result = command_handlers::handle_cancel_order(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(OrderCommandResponse::committed(&state, result)))
}

/// POST /{order_id}/payment
#[instrument(skip(state), fields(actor = %actor))]
async fn initiate_payment(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(order_id): Path<Uuid>,
) -> Result<Json<PaymentRedirect>, ApiError> {
    let command = commands::InitiatePayment {
        correlation_id: Uuid::new_v4(),
        order_id,
        actor,
    };

    info!(correlation_id = %command.correlation_id, "handling initiate_payment command");

    let redirect = command_handlers::handle_initiate_payment(
        &command,
        &*state.event_repository,
        &*state.collaborators.payments,
    )
    .await?;

    Ok(Json(redirect))
}

/// POST /{order_id}/payment/confirm
#[instrument(skip(state, request), fields(actor = %actor))]
async fn confirm_payment(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(order_id): Path<Uuid>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<OrderCommandResponse>, ApiError> {
    let command = commands::ConfirmPayment {
        correlation_id: Uuid::new_v4(),
        order_id,
        payment_reference: request.payment_reference,
        actor,
    };

    info!(correlation_id = %command.correlation_id, "handling confirm_payment command");

    let result = command_handlers::handle_confirm_payment(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(OrderCommandResponse::committed(&state, result)))
}

/// Returns the router for orders.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{order_id}", get(get_order))
        .route("/{order_id}/vendor-view", get(get_vendor_view))
        .route("/{order_id}/cancel", post(cancel_order))
        .route("/{order_id}/payment", post(initiate_payment))
        .route("/{order_id}/payment/confirm", post(confirm_payment))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use bazaar_notifications::sinks::RecipientKind;
    use bazaar_ordering::domain::address::PaymentMethod;
    use bazaar_test_support::UnavailablePaymentInitiator;
    use serde_json::json;

    use super::*;
    use crate::routes::test_state::{
        seed_order, send, wait_for_notifications, world, world_with_payments,
    };

    #[tokio::test]
    async fn test_get_order_returns_view_for_its_buyer() {
        // Arrange
        let world = world();
        let buyer_id = Uuid::new_v4();
        let seeded = seed_order(&world, Some(buyer_id), PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        // Act
        let (status, json) = send(
            app,
            "GET",
            &format!("/{}", seeded.order_id),
            Some(("buyer", buyer_id)),
            None,
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["order_id"], seeded.order_id.to_string());
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["shipments"].as_array().unwrap().len(), 1);
        assert_eq!(json["version"], 1);
    }

    #[tokio::test]
    async fn test_get_order_hides_it_from_other_buyers() {
        let world = world();
        let seeded = seed_order(&world, Some(Uuid::new_v4()), PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        let (status, json) = send(
            app,
            "GET",
            &format!("/{}", seeded.order_id),
            Some(("buyer", Uuid::new_v4())),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_get_unknown_order_returns_404() {
        let world = world();
        let app = router().with_state(world.state.clone());

        let (status, _) = send(app, "GET", &format!("/{}", Uuid::new_v4()), None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_vendor_view_lists_only_the_vendors_shipment() {
        // Arrange
        let world = world();
        let seeded = seed_order(&world, None, PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        // Act
        let (status, json) = send(
            app,
            "GET",
            &format!("/{}/vendor-view", seeded.order_id),
            Some(("vendor", seeded.vendor_id)),
            None,
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["vendor_id"], seeded.vendor_id.to_string());
        assert_eq!(
            json["shipments"][0]["shipment_id"],
            seeded.shipment_id.to_string()
        );
    }

    #[tokio::test]
    async fn test_vendor_view_without_a_shipment_returns_404() {
        let world = world();
        let seeded = seed_order(&world, None, PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        let (status, _) = send(
            app,
            "GET",
            &format!("/{}/vendor-view", seeded.order_id),
            Some(("vendor", Uuid::new_v4())),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_pending_order_notifies_the_vendor() {
        // Arrange
        let world = world();
        let buyer_id = Uuid::new_v4();
        let seeded = seed_order(&world, Some(buyer_id), PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        // Act
        let (status, json) = send(
            app,
            "POST",
            &format!("/{}/cancel", seeded.order_id),
            Some(("buyer", buyer_id)),
            None,
        )
        .await;
        wait_for_notifications(&world, 1).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
        assert_eq!(json["order"]["status"], "CANCELLED");
        assert_eq!(json["order"]["shipments"][0]["status"], "RETURNED");
        assert_eq!(json["event_ids"].as_array().unwrap().len(), 1);
        let sent = world.notifications.sent();
        assert!(sent.iter().any(|(kind, id, n)| {
            *kind == RecipientKind::Vendor
                && *id == seeded.vendor_id
                && n.kind == "order.cancelled"
        }));
    }

    #[tokio::test]
    async fn test_cancel_after_shipment_progressed_returns_409() {
        // Arrange
        let world = world();
        let buyer_id = Uuid::new_v4();
        let seeded = seed_order(&world, Some(buyer_id), PaymentMethod::Cod).await;
        let app = router()
            .merge(super::super::shipments::router())
            .with_state(world.state.clone());
        let (status, _) = send(
            app.clone(),
            "POST",
            &format!("/{}/shipments/{}/status", seeded.order_id, seeded.shipment_id),
            Some(("vendor", seeded.vendor_id)),
            Some(json!({"status": "PREPARING"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Act
        let (status, json) = send(
            app,
            "POST",
            &format!("/{}/cancel", seeded.order_id),
            Some(("buyer", buyer_id)),
            None,
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "not_cancellable");
        assert_eq!(world.repo.stream(seeded.order_id).len(), 2);
    }

    #[tokio::test]
    async fn test_vendor_cannot_cancel_the_whole_order() {
        let world = world();
        let seeded = seed_order(&world, None, PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        let (status, _) = send(
            app,
            "POST",
            &format!("/{}/cancel", seeded.order_id),
            Some(("vendor", seeded.vendor_id)),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_guest_cancels_own_guest_order() {
        // Arrange
        let world = world();
        let seeded = seed_order(&world, None, PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        // Act
        let (status, json) = send(
            app,
            "POST",
            &format!("/{}/cancel", seeded.order_id),
            None,
            None,
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["order"]["status"], "CANCELLED");
    }

    #[tokio::test]
    async fn test_guest_cannot_cancel_a_buyers_order() {
        let world = world();
        let seeded = seed_order(&world, Some(Uuid::new_v4()), PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        let (status, _) = send(
            app,
            "POST",
            &format!("/{}/cancel", seeded.order_id),
            None,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(world.repo.stream(seeded.order_id).len(), 1);
    }

    #[tokio::test]
    async fn test_initiate_payment_returns_redirect_for_guest_order() {
        // Arrange
        let world = world();
        let seeded = seed_order(&world, None, PaymentMethod::Card).await;
        let app = router().with_state(world.state.clone());

        // Act
        let (status, json) = send(
            app,
            "POST",
            &format!("/{}/payment", seeded.order_id),
            None,
            None,
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["redirect_url"],
            format!("https://pay.example.test/session/{}", seeded.order_id)
        );
        assert_eq!(world.payments.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_initiate_payment_with_gateway_down_returns_502() {
        let world = world_with_payments(Some(Arc::new(UnavailablePaymentInitiator)));
        let seeded = seed_order(&world, None, PaymentMethod::Card).await;
        let app = router().with_state(world.state.clone());

        let (status, json) = send(
            app,
            "POST",
            &format!("/{}/payment", seeded.order_id),
            None,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["order_id"], seeded.order_id.to_string());
    }

    #[tokio::test]
    async fn test_admin_confirms_payment() {
        // Arrange
        let world = world();
        let buyer_id = Uuid::new_v4();
        let seeded = seed_order(&world, Some(buyer_id), PaymentMethod::Card).await;
        let app = router().with_state(world.state.clone());

        // Act
        let (status, json) = send(
            app,
            "POST",
            &format!("/{}/payment/confirm", seeded.order_id),
            Some(("admin", Uuid::new_v4())),
            Some(json!({"payment_reference": "pay_123"})),
        )
        .await;
        wait_for_notifications(&world, 1).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["order"]["status"], "PAID");
        let sent = world.notifications.sent();
        assert!(
            sent.iter()
                .any(|(_, id, n)| *id == buyer_id && n.kind == "order.paid")
        );
    }

    #[tokio::test]
    async fn test_buyer_cannot_confirm_payment() {
        let world = world();
        let buyer_id = Uuid::new_v4();
        let seeded = seed_order(&world, Some(buyer_id), PaymentMethod::Cod).await;
        let app = router().with_state(world.state.clone());

        let (status, _) = send(
            app,
            "POST",
            &format!("/{}/payment/confirm", seeded.order_id),
            Some(("buyer", buyer_id)),
            Some(json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
