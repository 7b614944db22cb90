//! [`JobGateway`] over HTTP, talking to a running `retouch-api` server.
//!
//! Errors are rebuilt from the server's `x-gateway-error` header so callers
//! see the same [`GatewayError`] variant the server-side gateway produced.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use retouch_core::error::GatewayError;
use retouch_core::gateway::JobGateway;
use retouch_core::job::{Artifact, JobHandle, JobSnapshot, ARTIFACT_CONTENT_TYPE};
use retouch_core::payload::{CleanupPayload, ImageBlob, InpaintPayload};

const GATEWAY_ERROR_HEADER: &str = "x-gateway-error";
const UPSTREAM_STATUS_HEADER: &str = "x-upstream-status";

/// HTTP client for the gateway's `/api` routes.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Build a client with its own connection pool and request timeout.
    ///
    /// * `base_url` - Server origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/api/inpaint/{id}` with `id` encoded as a single segment.
    fn job_url(&self, id: &str) -> Result<reqwest::Url, GatewayError> {
        let invalid = || GatewayError::Transport(format!("Invalid gateway URL {}", self.base_url));
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(["api", "inpaint", id]);
        Ok(url)
    }
}

#[async_trait]
impl JobGateway for HttpGateway {
    async fn submit_cleanup_job(&self, payload: &CleanupPayload) -> Result<Artifact, GatewayError> {
        let form = Form::new()
            .part("image", image_part(&payload.image, "image")?)
            .part("mask", image_part(&payload.mask, "mask")?);

        let response = self
            .client
            .post(format!("{}/api/clean", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;
        let response = expect_status(response, StatusCode::OK).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(ARTIFACT_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await.map_err(request_error)?;

        Ok(Artifact {
            bytes,
            content_type,
        })
    }

    async fn submit_inpaint_job(
        &self,
        payload: &InpaintPayload,
    ) -> Result<JobHandle, GatewayError> {
        let form = Form::new()
            .part("image", image_part(&payload.image, "image")?)
            .part("mask", image_part(&payload.mask, "mask")?)
            .text("prompt", payload.prompt.clone())
            .text("outputs", payload.output_count.to_string());

        let response = self
            .client
            .post(format!("{}/api/inpaint", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;
        let response = expect_status(response, StatusCode::CREATED).await?;

        response.json::<JobHandle>().await.map_err(request_error)
    }

    async fn poll_inpaint_job(&self, id: &str) -> Result<JobSnapshot, GatewayError> {
        // Unique query per poll so no cache in between answers for the server.
        let bust = chrono::Utc::now().timestamp_millis();
        let response = self
            .client
            .get(self.job_url(id)?)
            .query(&[("bust", bust)])
            .send()
            .await
            .map_err(request_error)?;
        let response = expect_status(response, StatusCode::OK).await?;

        response.json::<JobSnapshot>().await.map_err(request_error)
    }
}

fn image_part(blob: &ImageBlob, name: &str) -> Result<Part, GatewayError> {
    Part::bytes(blob.bytes.to_vec())
        .file_name(name.to_string())
        .mime_str(&blob.content_type)
        .map_err(|e| {
            GatewayError::Transport(format!(
                "Invalid content type {:?} for {name}: {e}",
                blob.content_type
            ))
        })
}

fn request_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::InvalidResponse(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

/// Pass `response` through when it has the `expected` status; otherwise
/// rebuild the server's error from its kind header and plain-text body.
async fn expect_status(
    response: reqwest::Response,
    expected: StatusCode,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let kind = header(GATEWAY_ERROR_HEADER);
    let upstream_status = header(UPSTREAM_STATUS_HEADER).and_then(|s| s.parse::<u16>().ok());
    let body = response.text().await.unwrap_or_default();

    Err(match kind.as_deref() {
        Some("upstream-error") => GatewayError::UpstreamError(body),
        Some("transport") => GatewayError::Transport(body),
        Some("invalid-response") => GatewayError::InvalidResponse(body),
        Some("upstream-rejected") => GatewayError::UpstreamRejected {
            status: upstream_status.unwrap_or(status.as_u16()),
            body,
        },
        // Bad requests, internal errors and anything not produced by the
        // gateway itself (proxies, wrong host).
        _ => GatewayError::UpstreamRejected {
            status: status.as_u16(),
            body,
        },
    })
}
