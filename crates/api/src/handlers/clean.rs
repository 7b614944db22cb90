//! Handler for the synchronous cleanup endpoint.

use axum::extract::{Multipart, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::error::{AppError, AppResult};
use crate::handlers::upload::RetouchUpload;
use crate::state::AppState;

/// POST /api/clean
///
/// Accept `image` and `mask` form fields, remove the masked object, and
/// return the edited image as `image/png`. A provider rejection forwards
/// the provider's status code.
pub async fn clean_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Clean request");

    let payload = RetouchUpload::read(multipart).await?.into_cleanup()?;
    let artifact = state
        .gateway
        .submit_cleanup_job(&payload)
        .await
        .map_err(AppError::Passthrough)?;

    Ok(([(CONTENT_TYPE, artifact.content_type)], artifact.bytes))
}
