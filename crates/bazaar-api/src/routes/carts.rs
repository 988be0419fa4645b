//! Routes for the Cart bounded context.

use axum::extract::{Path, State};
use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use bazaar_cart::application::query_handlers::{self, CartView};
use bazaar_cart::application::command_handlers;
use bazaar_cart::domain::commands;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{cart_id}/lines.
#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    /// The product to add.
    pub product_id: Uuid,
    /// How many.
    pub qty: u32,
}

/// Response body returned after a cart command is handled.
#[derive(Debug, Serialize)]
pub struct CartCommandResponse {
    /// The cart.
    pub cart_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// POST /{cart_id}/lines
#[instrument(skip(state, request), fields(product_id = %request.product_id))]
async fn add_line(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(request): Json<AddLineRequest>,
) -> Result<Json<CartCommandResponse>, ApiError> {
    let command = commands::AddCartLine {
        correlation_id: Uuid::new_v4(),
        cart_id,
        product_id: request.product_id,
        qty: request.qty,
    };

    info!(correlation_id = %command.correlation_id, "handling add_cart_line command");

    let result = command_handlers::handle_add_cart_line(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CartCommandResponse {
        cart_id: result.aggregate_id,
        event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// DELETE /{cart_id}/lines/{product_id}
#[instrument(skip(state))]
async fn remove_line(
    State(state): State<AppState>,
    Path((cart_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CartCommandResponse>, ApiError> {
    let command = commands::RemoveCartLine {
        correlation_id: Uuid::new_v4(),
        cart_id,
        product_id,
    };

    info!(correlation_id = %command.correlation_id, "handling remove_cart_line command");

    let result = command_handlers::handle_remove_cart_line(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CartCommandResponse {
        cart_id: result.aggregate_id,
        event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// GET /{cart_id}
async fn get_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<CartView>, ApiError> {
    let view = query_handlers::get_cart_by_id(cart_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// Returns the router for carts.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{cart_id}", get(get_cart))
        .route("/{cart_id}/lines", post(add_line))
        .route("/{cart_id}/lines/{product_id}", delete(remove_line))
}
