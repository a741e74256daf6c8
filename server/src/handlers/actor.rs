use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::models::Actor;
use crate::utils::error::AppError;

/// Set by the authentication gateway in front of this service.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match header(parts, ACTOR_ROLE_HEADER) {
            Some(role) if role.eq_ignore_ascii_case("admin") => Ok(Actor::Admin),
            Some(role) if role.eq_ignore_ascii_case("guest") => {
                let raw = header(parts, ACTOR_ID_HEADER)
                    .ok_or_else(|| AppError::AuthError("guest identity is missing".into()))?;
                let guest_id = Uuid::parse_str(raw)
                    .map_err(|_| AppError::AuthError(format!("'{raw}' is not a guest id")))?;
                Ok(Actor::Guest { guest_id })
            }
            Some(role) => Err(AppError::AuthError(format!("unknown role '{role}'"))),
            None => Err(AppError::AuthError("caller is not authenticated".into())),
        }
    }
}

/// Caller identity where anonymous access is allowed. No actor headers
/// means anonymous; headers that are present must still be valid.
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<Actor>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(ACTOR_ROLE_HEADER) && !parts.headers.contains_key(ACTOR_ID_HEADER) {
            return Ok(MaybeActor(None));
        }
        Actor::from_request_parts(parts, state).await.map(|actor| MaybeActor(Some(actor)))
    }
}

pub fn require_admin(actor: &Actor) -> Result<(), AppError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(crate::error::ReservationError::Forbidden(
            "this operation is restricted to administrators".into(),
        )
        .into())
    }
}
