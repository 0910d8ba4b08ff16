//! Actor extraction from request headers

use axum::http::HeaderMap;
use shared::error::{AppError, AppResult};
use shared::order::{Actor, ActorRole};

const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Extract the acting party from `X-Actor-Id` / `X-Actor-Role`.
///
/// The surrounding application authenticates the user and forwards the
/// resolved identity; the engine never reads session state.
pub fn actor_from_headers(headers: &HeaderMap) -> AppResult<Actor> {
    let id: i64 = headers
        .get(ACTOR_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::validation("missing or invalid X-Actor-Id header"))?;

    let role_str = headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::validation("missing X-Actor-Role header"))?;

    let role = match role_str.to_ascii_uppercase().as_str() {
        "BUYER" => ActorRole::Buyer,
        "SELLER" => ActorRole::Seller,
        "RIDER" => ActorRole::Rider,
        "ADMIN" => ActorRole::Admin,
        other => {
            return Err(
                AppError::validation(format!("unknown actor role: {other}"))
                    .with_detail("role", other),
            );
        }
    };

    Ok(Actor::new(id, role))
}
