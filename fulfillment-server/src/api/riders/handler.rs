//! Rider API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use validator::Validate;

use super::super::actor::actor_from_headers;
use crate::core::ServerState;
use shared::error::{AppError, AppResult};
use shared::models::{Rider, RiderStatus, VehicleType};
use shared::order::ActorRole;

#[derive(Debug, Deserialize, Validate)]
pub struct RiderCreateRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    pub vehicle_type: VehicleType,
    pub service_area: Option<String>,
    /// Defaults to PENDING; admins approve separately
    pub status: Option<RiderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

fn ensure_admin(headers: &HeaderMap) -> AppResult<()> {
    let actor = actor_from_headers(headers)?;
    if actor.role != ActorRole::Admin {
        return Err(AppError::not_authorized(
            "rider administration requires the admin role",
        ));
    }
    Ok(())
}

/// Register a rider
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<RiderCreateRequest>,
) -> AppResult<Json<Rider>> {
    ensure_admin(&headers)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let mut rider = Rider::new(payload.name, payload.vehicle_type);
    rider.service_area = payload.service_area;
    if let Some(status) = payload.status {
        rider.status = status;
    }

    state
        .manager
        .upsert_rider(&rider)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(rider))
}

/// List all riders
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Rider>>> {
    let riders = state
        .manager
        .list_riders()
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(riders))
}

/// Get rider by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(rider_id): Path<i64>,
) -> AppResult<Json<Rider>> {
    let rider = state
        .manager
        .get_rider(rider_id)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Rider {rider_id}")))?;
    Ok(Json(rider))
}

/// Flip a rider's availability.
///
/// Riders toggle their own flag; admins can toggle anyone's.
pub async fn set_availability(
    State(state): State<ServerState>,
    Path(rider_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<AvailabilityRequest>,
) -> AppResult<Json<Rider>> {
    let actor = actor_from_headers(&headers)?;
    let authorized = match actor.role {
        ActorRole::Admin => true,
        ActorRole::Rider => actor.id == rider_id,
        _ => false,
    };
    if !authorized {
        return Err(AppError::not_authorized(
            "only the rider or an admin can change availability",
        ));
    }

    let rider = state
        .manager
        .set_rider_availability(rider_id, payload.is_available)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Rider {rider_id}")))?;
    Ok(Json(rider))
}
