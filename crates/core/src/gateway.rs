//! The provider-agnostic job contract.
//!
//! Implemented server-side by the provider gateway (which holds the
//! credentials) and client-side by the HTTP client that talks to it.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::job::{Artifact, JobHandle, JobSnapshot};
use crate::payload::{CleanupPayload, InpaintPayload};

/// Submit and poll remote image-edit jobs.
///
/// Each call performs exactly one outbound request and keeps no state
/// between calls.
#[async_trait]
pub trait JobGateway: Send + Sync {
    /// Run a synchronous cleanup job and return its output image.
    async fn submit_cleanup_job(&self, payload: &CleanupPayload) -> Result<Artifact, GatewayError>;

    /// Create an asynchronous inpainting job.
    async fn submit_inpaint_job(&self, payload: &InpaintPayload)
        -> Result<JobHandle, GatewayError>;

    /// Fetch the current state of an inpainting job.
    async fn poll_inpaint_job(&self, id: &str) -> Result<JobSnapshot, GatewayError>;
}
