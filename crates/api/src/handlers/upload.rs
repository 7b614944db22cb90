//! Multipart form parsing shared by the cleanup and inpainting endpoints.

use axum::extract::Multipart;
use retouch_core::payload::{
    CleanupPayload, ImageBlob, InpaintPayload, DEFAULT_IMAGE_CONTENT_TYPE, DEFAULT_OUTPUT_COUNT,
};

use crate::error::{AppError, AppResult};

/// Fields collected from a retouch upload form.
///
/// Unknown fields are ignored; a repeated field keeps its last value.
#[derive(Debug, Default)]
pub struct RetouchUpload {
    pub image: Option<ImageBlob>,
    pub mask: Option<ImageBlob>,
    pub prompt: Option<String>,
    pub outputs: Option<String>,
}

impl RetouchUpload {
    /// Drain the multipart stream into a [`RetouchUpload`].
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut upload = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" | "mask" => {
                    let content_type = field
                        .content_type()
                        .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    let blob = ImageBlob::new(bytes, content_type);
                    if name == "image" {
                        upload.image = Some(blob);
                    } else {
                        upload.mask = Some(blob);
                    }
                }
                "prompt" | "outputs" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if name == "prompt" {
                        upload.prompt = Some(text);
                    } else {
                        upload.outputs = Some(text);
                    }
                }
                other => {
                    tracing::debug!(field = other, "Ignoring unknown upload field");
                }
            }
        }

        Ok(upload)
    }

    /// Validate the form as a cleanup request (`image` + `mask`).
    pub fn into_cleanup(self) -> AppResult<CleanupPayload> {
        let (image, mask) = require_images(self.image, self.mask)?;
        Ok(CleanupPayload::new(image, mask)?)
    }

    /// Validate the form as an inpainting request.
    ///
    /// `prompt` defaults to empty and `outputs` to one.
    pub fn into_inpaint(self) -> AppResult<InpaintPayload> {
        let (image, mask) = require_images(self.image, self.mask)?;
        let output_count = match self.outputs.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_OUTPUT_COUNT,
            Some(raw) => raw.parse::<u8>().map_err(|_| {
                AppError::BadRequest(format!("outputs must be a small positive integer, got {raw:?}"))
            })?,
        };
        Ok(InpaintPayload::new(
            image,
            mask,
            self.prompt.unwrap_or_default(),
            output_count,
        )?)
    }
}

fn require_images(
    image: Option<ImageBlob>,
    mask: Option<ImageBlob>,
) -> AppResult<(ImageBlob, ImageBlob)> {
    let image = image.ok_or_else(|| AppError::BadRequest("Missing image field".to_string()))?;
    let mask = mask.ok_or_else(|| AppError::BadRequest("Missing mask field".to_string()))?;
    Ok((image, mask))
}
