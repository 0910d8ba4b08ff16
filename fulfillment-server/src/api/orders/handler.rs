//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::super::{actor::actor_from_headers, convert::command_failure};
use crate::core::ServerState;
use shared::error::{AppError, AppResult, ApiResponse};
use shared::models::AddressSnapshot;
use shared::order::{
    FulfillmentCommand, FulfillmentCommandPayload, LineItemInput, OrderEvent, OrderSnapshot,
    OrderStatus,
};

// ========== DTOs ==========

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutAddress {
    #[validate(length(min = 1, max = 150))]
    pub full_name: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub street: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub province: String,
    pub postal_code: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CheckoutItem {
    pub variant_id: i64,
    #[validate(range(min = 1, max = 9999))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub buyer_id: i64,
    pub seller_id: i64,
    #[validate(nested)]
    pub address: CheckoutAddress,
    #[validate(length(min = 1, max = 100), nested)]
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub discount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
}

/// Lifecycle events a buyer or seller can request over the API
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionEvent {
    Confirm,
    StartProcessing,
    MarkReadyForPickup,
    ReleaseToRider,
    Cancel,
    RequestReturn,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub event: TransitionEvent,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub order_id: String,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub buyer_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

// ========== Handlers ==========

/// Place an order (checkout)
pub async fn checkout(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let actor = actor_from_headers(&headers)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let command_payload = FulfillmentCommandPayload::PlaceOrder {
        buyer_id: payload.buyer_id,
        seller_id: payload.seller_id,
        address: AddressSnapshot {
            full_name: payload.address.full_name,
            phone: payload.address.phone,
            street: payload.address.street,
            city: payload.address.city,
            province: payload.address.province,
            postal_code: payload.address.postal_code,
        },
        items: payload
            .items
            .into_iter()
            .map(|i| LineItemInput {
                variant_id: i.variant_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect(),
        shipping_fee: payload.shipping_fee,
        tax: payload.tax,
        discount: payload.discount,
    };

    // An optional client idempotency key protects retried checkouts
    // from double-reserving
    let cmd = match headers.get("x-command-id").and_then(|v| v.to_str().ok()) {
        Some(command_id) => FulfillmentCommand::with_id(command_id, actor, command_payload),
        None => FulfillmentCommand::new(actor, command_payload),
    };

    let response = state.execute(cmd).await;
    if !response.success {
        return Err(command_failure(response));
    }

    Ok(ApiResponse::success(CheckoutResponse {
        order_id: response.order_id.unwrap_or_default(),
        order_number: response.order_number.unwrap_or_default(),
        status: response.status.unwrap_or_default(),
    }))
}

/// Request a lifecycle transition
pub async fn transition(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<TransitionRequest>,
) -> AppResult<ApiResponse<TransitionResponse>> {
    let actor = actor_from_headers(&headers)?;

    let command_payload = match payload.event {
        TransitionEvent::Confirm => FulfillmentCommandPayload::ConfirmOrder {
            order_id: order_id.clone(),
        },
        TransitionEvent::StartProcessing => FulfillmentCommandPayload::StartProcessing {
            order_id: order_id.clone(),
        },
        TransitionEvent::MarkReadyForPickup => FulfillmentCommandPayload::MarkReadyForPickup {
            order_id: order_id.clone(),
        },
        TransitionEvent::ReleaseToRider => FulfillmentCommandPayload::ReleaseToRider {
            order_id: order_id.clone(),
        },
        TransitionEvent::Cancel => FulfillmentCommandPayload::CancelOrder {
            order_id: order_id.clone(),
            reason: payload.reason.clone(),
        },
        TransitionEvent::RequestReturn => FulfillmentCommandPayload::RequestReturn {
            order_id: order_id.clone(),
            reason: payload.reason.clone(),
        },
    };

    let response = state
        .execute(FulfillmentCommand::new(actor, command_payload))
        .await;
    if !response.success {
        return Err(command_failure(response));
    }

    Ok(ApiResponse::success(TransitionResponse {
        order_id,
        status: response.status,
    }))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<OrderSnapshot>> {
    let snapshot = state
        .manager
        .get_snapshot(&order_id)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;
    Ok(Json(snapshot))
}

/// Get the event stream for an order
pub async fn get_events(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<Vec<OrderEvent>>> {
    let events = state
        .manager
        .get_events_for_order(&order_id)
        .map_err(|e| AppError::database(e.to_string()))?;
    if events.is_empty() {
        return Err(AppError::not_found(format!("Order {order_id}")));
    }
    Ok(Json(events))
}

/// List open orders, optionally filtered by party or status
pub async fn list_open(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<OrderSnapshot>>> {
    let mut orders = state
        .manager
        .get_open_orders()
        .map_err(|e| AppError::database(e.to_string()))?;

    if let Some(buyer_id) = query.buyer_id {
        orders.retain(|o| o.buyer_id == buyer_id);
    }
    if let Some(seller_id) = query.seller_id {
        orders.retain(|o| o.seller_id == seller_id);
    }
    if let Some(status) = query.status {
        orders.retain(|o| o.status == status);
    }
    orders.sort_by_key(|o| o.created_at);

    Ok(Json(orders))
}
