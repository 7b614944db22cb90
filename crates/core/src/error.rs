/// Domain-level errors shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures reported by a [`JobGateway`](crate::gateway::JobGateway).
///
/// Provider messages are carried verbatim; the gateway never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The remote provider answered with a non-success status at creation
    /// or polling time.
    #[error("Upstream rejected the request ({status}): {body}")]
    UpstreamRejected {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider answered successfully but flagged an error on the job.
    #[error("Upstream job error: {0}")]
    UpstreamError(String),

    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("Gateway request failed: {0}")]
    Transport(String),

    /// The response arrived but could not be decoded.
    #[error("Unexpected upstream response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Stable machine-readable name of the variant.
    ///
    /// Sent over HTTP in the `x-gateway-error` header so remote clients can
    /// rebuild the same variant.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::UpstreamRejected { .. } => "upstream-rejected",
            GatewayError::UpstreamError(_) => "upstream-error",
            GatewayError::Transport(_) => "transport",
            GatewayError::InvalidResponse(_) => "invalid-response",
        }
    }
}
