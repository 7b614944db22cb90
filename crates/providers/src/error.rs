use retouch_core::error::GatewayError;

/// Errors from the provider REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured API URL cannot carry a request path.
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),

    /// The provider returned an unexpected status code.
    #[error("Provider API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::ApiError { status, body } => {
                GatewayError::UpstreamRejected { status, body }
            }
            ProviderError::Request(e) if e.is_decode() => {
                GatewayError::InvalidResponse(e.to_string())
            }
            ProviderError::Request(e) => GatewayError::Transport(e.to_string()),
            err @ ProviderError::InvalidUrl(_) => GatewayError::Transport(err.to_string()),
        }
    }
}

/// Return the response unchanged if its status is `expected`, otherwise a
/// [`ProviderError::ApiError`] with the status and body text.
pub(crate) async fn expect_status(
    response: reqwest::Response,
    expected: reqwest::StatusCode,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status != expected {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::ApiError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
