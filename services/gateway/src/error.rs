use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use types::errors::ExchangeError;
use wire::{encode, Message, Value};

use crate::codec::CONTENT_TYPE;

/// HTTP-facing wrapper around the core error taxonomy.
///
/// Every kind owns exactly one status code; the body is a framed message
/// with `error` (the kind slug) and `message` (human readable).
#[derive(Debug)]
pub struct ApiError(pub ExchangeError);

impl From<ExchangeError> for ApiError {
    fn from(err: ExchangeError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self(ExchangeError::InvalidInput(message.into()))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(ExchangeError::Unauthorized(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            ExchangeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ExchangeError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ExchangeError::InsufficientCollateral => StatusCode::PAYMENT_REQUIRED,
            ExchangeError::Forbidden => StatusCode::FORBIDDEN,
            ExchangeError::NotFound(_) => StatusCode::NOT_FOUND,
            ExchangeError::SelfMatch => StatusCode::PRECONDITION_FAILED,
            ExchangeError::TooEarly => StatusCode::TOO_EARLY,
            ExchangeError::TooLate => StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
            ExchangeError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Message::v2()
            .with("error", Value::Str(self.0.kind().to_string()))
            .with("message", Value::Str(self.0.to_string()));

        match encode(&body) {
            Ok(bytes) => (
                self.status(),
                [(header::CONTENT_TYPE, CONTENT_TYPE)],
                bytes,
            )
                .into_response(),
            Err(err) => {
                tracing::error!(error = %err, "failed to encode error body");
                self.status().into_response()
            }
        }
    }
}
