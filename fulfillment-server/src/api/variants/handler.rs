//! Variant API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::super::actor::actor_from_headers;
use crate::core::ServerState;
use shared::error::{AppError, AppResult};
use shared::models::ProductVariant;
use shared::order::ActorRole;

#[derive(Debug, Deserialize, Validate)]
pub struct VariantCreateRequest {
    pub product_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub product_name: String,
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub on_hand: i64,
}

/// Seed or restock a variant (seller/admin)
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<VariantCreateRequest>,
) -> AppResult<Json<ProductVariant>> {
    let actor = actor_from_headers(&headers)?;
    if !matches!(actor.role, ActorRole::Seller | ActorRole::Admin) {
        return Err(AppError::not_authorized(
            "variant administration requires the seller or admin role",
        ));
    }
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    if payload.price < Decimal::ZERO {
        return Err(AppError::validation("price must be non-negative"));
    }

    let mut variant = ProductVariant::new(
        payload.product_id,
        payload.product_name,
        payload.sku,
        payload.price,
        payload.on_hand,
    );
    variant.size = payload.size;
    variant.color = payload.color;

    state
        .manager
        .upsert_variant(&variant)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(variant))
}

/// Get variant by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(variant_id): Path<i64>,
) -> AppResult<Json<ProductVariant>> {
    let variant = state
        .manager
        .get_variant(variant_id)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Variant {variant_id}")))?;
    Ok(Json(variant))
}
