use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Raw bearer token pulled from the `Authorization` header.
///
/// Token-to-username resolution happens inside the handler while it
/// holds the exchange lock, so authentication and dispatch stay one
/// indivisible step.
pub struct Bearer(pub String);

impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;
        let value = header
            .to_str()
            .map_err(|_| ApiError::unauthorized("malformed Authorization header"))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("expected a bearer token"))?;
        if token.is_empty() {
            return Err(ApiError::unauthorized("empty bearer token"));
        }
        Ok(Bearer(token.to_string()))
    }
}
