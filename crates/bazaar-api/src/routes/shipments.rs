//! Routes for vendor-side shipment handling.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::post};
use bazaar_ordering::application::command_handlers;
use bazaar_ordering::domain::cancellation::VendorCancelReason;
use bazaar_ordering::domain::commands;
use bazaar_ordering::domain::status::ShipmentStatus;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::orders::OrderCommandResponse;
use crate::actor::RequestActor;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{order_id}/shipments/{shipment_id}/status.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Target status, e.g. `IN_TRANSIT`.
    pub status: String,
}

/// Request body for POST .../schedule-pickup.
#[derive(Debug, Deserialize)]
pub struct SchedulePickupRequest {
    /// Earliest pickup time.
    pub window_start: DateTime<Utc>,
    /// Latest pickup time.
    pub window_end: DateTime<Utc>,
}

/// Request body for POST .../invoice.
#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    /// Invoice number.
    pub invoice_number: String,
    /// Where the invoice document lives.
    pub invoice_url: String,
}

/// Request body for POST .../cancel.
#[derive(Debug, Deserialize)]
pub struct CancelShipmentRequest {
    /// Reason from the taxonomy.
    pub reason: VendorCancelReason,
    /// Free text; required for `other`.
    #[serde(default)]
    pub note: Option<String>,
}

type ShipmentPath = Path<(Uuid, Uuid)>;

/// POST /{order_id}/shipments/{shipment_id}/status
#[instrument(skip(state, request), fields(actor = %actor, status = %request.status))]
async fn update_status(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path((order_id, shipment_id)): ShipmentPath,
    Json(request): Json<StatusRequest>,
) -> Result<Json<OrderCommandResponse>, ApiError> {
    let status: ShipmentStatus = request.status.parse()?;
    let command = commands::UpdateShipmentStatus {
        correlation_id: Uuid::new_v4(),
        order_id,
        shipment_id,
        status,
        actor,
    };

    info!(correlation_id = %command.correlation_id, "handling update_shipment_status command");

    let result = command_handlers::handle_update_shipment_status(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(OrderCommandResponse::committed(&state, result)))
}

/// POST /{order_id}/shipments/{shipment_id}/schedule-pickup
#[instrument(skip(state, request), fields(actor = %actor))]
async fn schedule_pickup(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path((order_id, shipment_id)): ShipmentPath,
    Json(request): Json<SchedulePickupRequest>,
) -> Result<Json<OrderCommandResponse>, ApiError> {
    let command = commands::SchedulePickup {
        correlation_id: Uuid::new_v4(),
        order_id,
        shipment_id,
        window_start: request.window_start,
        window_end: request.window_end,
        actor,
    };

    info!(correlation_id = %command.correlation_id, "handling schedule_pickup command");

    let result = command_handlers::handle_schedule_pickup(
        &command,
        state.clock.as_ref(),
        &state.rng,
        &*state.event_repository,
    )
    .await?;

    Ok(Json(OrderCommandResponse::committed(&state, result)))
}

/// POST /{order_id}/shipments/{shipment_id}/invoice
#[instrument(skip(state, request), fields(actor = %actor))]
async fn issue_invoice(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path((order_id, shipment_id)): ShipmentPath,
    Json(request): Json<InvoiceRequest>,
) -> Result<Json<OrderCommandResponse>, ApiError> {
    let command = commands::IssueInvoice {
        correlation_id: Uuid::new_v4(),
        order_id,
        shipment_id,
        invoice_number: request.invoice_number,
        invoice_url: request.invoice_url,
        actor,
    };

    info!(correlation_id = %command.correlation_id, "handling issue_invoice command");

    let result = command_handlers::handle_issue_invoice(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(OrderCommandResponse::committed(&state, result)))
}

/// POST /{order_id}/shipments/{shipment_id}/cancel
#[instrument(skip(state, request), fields(actor = %actor, reason = %request.reason))]
async fn cancel_shipment(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path((order_id, shipment_id)): ShipmentPath,
    Json(request): Json<CancelShipmentRequest>,
) -> Result<Json<OrderCommandResponse>, ApiError> {
    let command = commands::CancelShipment {
        correlation_id: Uuid::new_v4(),
        order_id,
        shipment_id,
        reason: request.reason,
        note: request.note,
        actor,
    };

    info!(correlation_id = %command.correlation_id, "handling cancel_shipment command");

    let result = command_handlers::handle_cancel_shipment(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(OrderCommandResponse::committed(&state, result)))
}

/// Returns the router for shipments, nested under an order.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{order_id}/shipments/{shipment_id}/status", post(update_status))
        .route(
            "/{order_id}/shipments/{shipment_id}/schedule-pickup",
            post(schedule_pickup),
        )
        .route("/{order_id}/shipments/{shipment_id}/invoice", post(issue_invoice))
        .route("/{order_id}/shipments/{shipment_id}/cancel", post(cancel_shipment))
}
