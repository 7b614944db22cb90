//! Server-side [`JobGateway`] backed by the real providers.
//!
//! [`ProviderGateway`] is stateless: every call maps onto exactly one
//! provider request and all job state lives with the provider.

use std::time::Duration;

use async_trait::async_trait;
use retouch_core::error::GatewayError;
use retouch_core::gateway::JobGateway;
use retouch_core::job::{Artifact, JobHandle, JobSnapshot, JobStatus};
use retouch_core::payload::{CleanupPayload, InpaintPayload};

use crate::clipdrop::ClipDropApi;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::replicate::{InpaintInput, ReplicateApi};

/// Gateway holding the provider credentials.
pub struct ProviderGateway {
    replicate: ReplicateApi,
    clipdrop: ClipDropApi,
    inpaint_model: String,
}

impl ProviderGateway {
    /// Build a gateway with its own HTTP client, using the configured
    /// request timeout.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Build a gateway sharing an existing [`reqwest::Client`] across both
    /// providers.
    pub fn with_client(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            replicate: ReplicateApi::with_client(
                client.clone(),
                config.replicate_api_url.clone(),
                config.replicate_api_token.clone(),
            ),
            clipdrop: ClipDropApi::with_client(
                client,
                config.clipdrop_api_url.clone(),
                config.clipdrop_api_token.clone(),
            ),
            inpaint_model: config.replicate_inpaint_model.clone(),
        }
    }
}

#[async_trait]
impl JobGateway for ProviderGateway {
    async fn submit_cleanup_job(&self, payload: &CleanupPayload) -> Result<Artifact, GatewayError> {
        let bytes = self
            .clipdrop
            .cleanup(&payload.image, &payload.mask)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Cleanup request failed");
                GatewayError::from(e)
            })?;

        tracing::info!(size = bytes.len(), "Cleanup finished");
        Ok(Artifact::png(bytes))
    }

    async fn submit_inpaint_job(
        &self,
        payload: &InpaintPayload,
    ) -> Result<JobHandle, GatewayError> {
        let input = InpaintInput {
            prompt: &payload.prompt,
            num_outputs: payload.output_count,
            image: payload.image.to_data_url(),
            mask: payload.mask.to_data_url(),
        };

        let prediction = self
            .replicate
            .create_prediction(&self.inpaint_model, &input)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Prediction failed to run");
                GatewayError::from(e)
            })?;

        tracing::info!(job_id = %prediction.id, status = %prediction.status, "Started running prediction");

        Ok(JobHandle {
            status: JobStatus::from_provider(&prediction.status),
            id: prediction.id,
        })
    }

    async fn poll_inpaint_job(&self, id: &str) -> Result<JobSnapshot, GatewayError> {
        let prediction = self.replicate.get_prediction(id).await.map_err(|e| {
            tracing::error!(job_id = id, error = %e, "Prediction status request failed");
            GatewayError::from(e)
        })?;

        if let Some(message) = prediction.error_message() {
            tracing::error!(job_id = %prediction.id, error = %message, "Prediction reported an error");
            return Err(GatewayError::UpstreamError(message));
        }

        let status = JobStatus::from_provider(&prediction.status);
        if matches!(status, JobStatus::Failed | JobStatus::Cancelled) {
            tracing::error!(job_id = %prediction.id, %status, "Prediction ended without output");
            return Err(GatewayError::UpstreamError(format!(
                "Prediction {} ended with status {}",
                prediction.id, prediction.status
            )));
        }

        if status != JobStatus::Succeeded {
            tracing::debug!(job_id = %prediction.id, %status, "Prediction still processing");
        }

        Ok(JobSnapshot {
            output: prediction.output_refs(),
            id: prediction.id,
            status,
        })
    }
}
