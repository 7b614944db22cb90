use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use retouch_core::error::{CoreError, GatewayError};

/// Response header naming the error kind, so HTTP clients can rebuild the
/// matching [`GatewayError`] variant.
pub const GATEWAY_ERROR_HEADER: HeaderName = HeaderName::from_static("x-gateway-error");

/// Response header carrying the provider's status code for
/// `upstream-rejected` errors, which may be reported under a different
/// HTTP status.
pub const UPSTREAM_STATUS_HEADER: HeaderName = HeaderName::from_static("x-upstream-status");

/// Application-level error type for HTTP handlers.
///
/// Error bodies are plain text: the browser client only needs a message,
/// and the kind travels in [`GATEWAY_ERROR_HEADER`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level validation or internal error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A provider failure, reported as `500`.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A provider failure whose upstream status code is forwarded to the
    /// client as-is.
    #[error("{0}")]
    Passthrough(GatewayError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, body) = match self {
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "bad-request", msg)
            }
            AppError::Core(CoreError::Internal(msg)) => {
                tracing::error!(error = %msg, "Internal core error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad-request", msg),
            AppError::Gateway(err) => {
                tracing::warn!(error = %err, "Gateway call failed");
                return gateway_error_response(StatusCode::INTERNAL_SERVER_ERROR, err);
            }
            AppError::Passthrough(err) => {
                tracing::warn!(error = %err, "Gateway call failed");
                return gateway_error_response(passthrough_status(&err), err);
            }
        };

        let mut response = (status, body).into_response();
        response
            .headers_mut()
            .insert(GATEWAY_ERROR_HEADER, HeaderValue::from_static(kind));
        response
    }
}

/// Plain-text response whose body is the provider's own message.
fn gateway_error_response(status: StatusCode, err: GatewayError) -> Response {
    let kind = err.kind();
    let (upstream_status, body) = match err {
        GatewayError::UpstreamRejected { status, body } => (Some(status), body),
        GatewayError::UpstreamError(msg)
        | GatewayError::Transport(msg)
        | GatewayError::InvalidResponse(msg) => (None, msg),
    };

    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(GATEWAY_ERROR_HEADER, HeaderValue::from_static(kind));
    if let Some(code) = upstream_status {
        headers.insert(UPSTREAM_STATUS_HEADER, HeaderValue::from(code));
    }
    response
}

/// Status to forward for a provider failure.
///
/// - `UpstreamRejected` keeps the provider's status when it is a valid
///   error status.
/// - Unreachable or undecodable providers map to `502 Bad Gateway`.
/// - Anything else maps to `500`.
fn passthrough_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::UpstreamRejected { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        GatewayError::Transport(_) | GatewayError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        GatewayError::UpstreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
