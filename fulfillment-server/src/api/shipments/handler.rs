//! Shipment API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

use super::super::{actor::actor_from_headers, convert::command_failure};
use crate::core::ServerState;
use shared::error::{ApiResponse, AppError, AppResult};
use shared::models::Shipment;
use shared::order::{
    FulfillmentCommand, FulfillmentCommandPayload, OrderStatus, ShipmentStatus,
};

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub status: ShipmentStatus,
}

#[derive(Debug, Deserialize, Default)]
pub struct FailureRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShipmentCommandResponse {
    pub order_id: String,
    pub order_status: Option<OrderStatus>,
}

/// Get shipment by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(shipment_id): Path<i64>,
) -> AppResult<Json<Shipment>> {
    let shipment = state
        .manager
        .get_shipment(shipment_id)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Shipment {shipment_id}")))?;
    Ok(Json(shipment))
}

/// Orders whose shipments still await a rider
pub async fn backlog(State(state): State<ServerState>) -> AppResult<Json<Vec<String>>> {
    let order_ids = state
        .manager
        .list_backlog()
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(order_ids))
}

/// Rider advances the shipment (picked up / in transit / out for delivery)
pub async fn progress(
    State(state): State<ServerState>,
    Path(shipment_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<ProgressRequest>,
) -> AppResult<ApiResponse<ShipmentCommandResponse>> {
    let actor = actor_from_headers(&headers)?;
    let response = state
        .execute(FulfillmentCommand::new(
            actor,
            FulfillmentCommandPayload::UpdateShipmentProgress {
                shipment_id,
                status: payload.status,
            },
        ))
        .await;
    if !response.success {
        return Err(command_failure(response));
    }
    Ok(ApiResponse::success(ShipmentCommandResponse {
        order_id: response.order_id.unwrap_or_default(),
        order_status: response.status,
    }))
}

/// Rider completes the delivery
pub async fn delivered(
    State(state): State<ServerState>,
    Path(shipment_id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<ApiResponse<ShipmentCommandResponse>> {
    let actor = actor_from_headers(&headers)?;
    let response = state
        .execute(FulfillmentCommand::new(
            actor,
            FulfillmentCommandPayload::MarkDelivered { shipment_id },
        ))
        .await;
    if !response.success {
        return Err(command_failure(response));
    }
    Ok(ApiResponse::success(ShipmentCommandResponse {
        order_id: response.order_id.unwrap_or_default(),
        order_status: response.status,
    }))
}

/// Rider reports a failed delivery attempt
pub async fn failed(
    State(state): State<ServerState>,
    Path(shipment_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<FailureRequest>,
) -> AppResult<ApiResponse<ShipmentCommandResponse>> {
    let actor = actor_from_headers(&headers)?;
    let response = state
        .execute(FulfillmentCommand::new(
            actor,
            FulfillmentCommandPayload::MarkDeliveryFailed {
                shipment_id,
                reason: payload.reason,
            },
        ))
        .await;
    if !response.success {
        return Err(command_failure(response));
    }
    Ok(ApiResponse::success(ShipmentCommandResponse {
        order_id: response.order_id.unwrap_or_default(),
        order_status: response.status,
    }))
}
