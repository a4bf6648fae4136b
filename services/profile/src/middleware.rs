//! Bearer token authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde_json::Value;
use tracing::debug;

use crate::{error::ApiError, models::UserId, state::AppState};

/// Reported for every authentication failure
pub const NOT_AUTHENTICATED: &str = "not authenticated";

/// Identity of the caller, set by [`auth_middleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

/// Validate the bearer token and expose the user id to the handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let not_authenticated = || ApiError::Forbidden(NOT_AUTHENTICATED.to_string());

    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(not_authenticated)?;

    let payload = state
        .token_issuer
        .validate(bearer.token())
        .map_err(|_| not_authenticated())?;

    let user_id = user_id_from_payload(&payload).ok_or_else(|| {
        debug!("token payload carries no user id");
        not_authenticated()
    })?;

    req.extensions_mut().insert(AuthenticatedUser(user_id));

    Ok(next.run(req).await)
}

fn user_id_from_payload(payload: &Value) -> Option<UserId> {
    payload.as_object()?.get("id")?.as_i64()
}
