//! Handlers for the asynchronous inpainting endpoints.
//!
//! The browser never sees provider credentials: both calls go through the
//! server-held [`JobGateway`](retouch_core::gateway::JobGateway).

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use retouch_core::job::{JobHandle, JobSnapshot, JobStatus};

use crate::error::{AppError, AppResult};
use crate::handlers::upload::RetouchUpload;
use crate::state::AppState;

/// POST /api/inpaint
///
/// Accept `image`, `mask`, `prompt` and `outputs` form fields and start an
/// inpainting job. Returns `201` with `{id, status}`.
pub async fn create_inpaint_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<JobHandle>)> {
    tracing::info!("Inpaint request");

    let payload = RetouchUpload::read(multipart).await?.into_inpaint()?;
    let handle = state.gateway.submit_inpaint_job(&payload).await?;

    tracing::info!(job_id = %handle.id, status = %handle.status, "Inpaint job created");
    Ok((StatusCode::CREATED, Json(handle)))
}

/// GET /api/inpaint/{id}
///
/// Return `{id, status, output?}` for an inpainting job.
pub async fn get_inpaint_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JobSnapshot>> {
    tracing::info!(job_id = %id, "Inpaint status request");

    if !is_plain_job_id(&id) {
        return Err(AppError::BadRequest(format!("Invalid job id {id:?}")));
    }
    let snapshot = state.gateway.poll_inpaint_job(&id).await?;

    if snapshot.status != JobStatus::Succeeded {
        tracing::debug!(job_id = %snapshot.id, status = %snapshot.status, "Processing");
    }
    Ok(Json(snapshot))
}

/// Provider job ids are short ASCII tokens; anything else never reaches
/// the provider.
fn is_plain_job_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
