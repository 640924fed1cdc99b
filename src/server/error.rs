//! HTTP rendering of [`FitgenError`].
//!
//! Every failed request gets the same JSON body:
//! `{"error": "...", "details": "...", "retry_after_secs": N}`, where the
//! last two fields are omitted when unknown. The status code comes from
//! [`ErrorKind::status_code`].

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::{ErrorKind, FitgenError};

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError(pub FitgenError);

impl From<FitgenError> for ApiError {
    fn from(err: FitgenError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(FitgenError::InvalidInput(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(FitgenError::InvalidInput(rejection.body_text()))
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

fn summary(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidInput => "invalid input",
        ErrorKind::Unauthorized => "upstream service rejected our credentials",
        ErrorKind::NotFound => "no usable model was found",
        ErrorKind::Overloaded => "upstream service is overloaded, please try again shortly",
        ErrorKind::RateLimited => "rate limited, please try again later",
        ErrorKind::MalformedUpstreamResponse => "could not understand the model output, please retry",
        ErrorKind::Unknown => "internal error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = StatusCode::from_u16(kind.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let retry_after_secs = self.0.retry_after().map(|d| d.as_secs().max(1));

        if status.is_server_error() {
            error!(kind = %kind, error = %self.0, "request failed");
        } else {
            warn!(kind = %kind, error = %self.0, "request rejected");
        }

        let body = ErrorBody {
            error: summary(kind).to_string(),
            details: Some(self.0.to_string()),
            retry_after_secs,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
