//! Extraction of the acting party from gateway-set headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bazaar_core::actor::Actor;
use bazaar_core::error::DomainError;
use uuid::Uuid;

use crate::error::ApiError;

/// Role header set by the upstream authentication gateway.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Identity header set by the upstream authentication gateway.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// The acting party of a request. Requests without a role header act as a
/// guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestActor(pub Actor);

/// Builds an actor from the raw header values.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an unknown role, or a buyer or
/// vendor role without a valid id.
pub fn parse_actor(role: Option<&str>, id: Option<&str>) -> Result<Actor, DomainError> {
    let Some(role) = role.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Actor::Guest);
    };
    let parse_id = || {
        id.map(str::trim)
            .ok_or_else(|| {
                DomainError::Validation(format!("{ACTOR_ID_HEADER} is required for role {role}"))
            })
            .and_then(|raw| {
                Uuid::parse_str(raw).map_err(|e| {
                    DomainError::Validation(format!("{ACTOR_ID_HEADER} is not a valid id: {e}"))
                })
            })
    };
    match role.to_ascii_lowercase().as_str() {
        "buyer" => Ok(Actor::Buyer(parse_id()?)),
        "vendor" => Ok(Actor::Vendor(parse_id()?)),
        "admin" => Ok(Actor::Admin),
        "guest" => Ok(Actor::Guest),
        other => Err(DomainError::Validation(format!("unknown actor role: {other}"))),
    }
}

impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .map(|value| {
                    value.to_str().map_err(|_| {
                        DomainError::Validation(format!("{name} must be visible ASCII"))
                    })
                })
                .transpose()
        };
        let role = header(ACTOR_ROLE_HEADER)?;
        let id = header(ACTOR_ID_HEADER)?;
        Ok(Self(parse_actor(role, id)?))
    }
}
