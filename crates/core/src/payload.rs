//! Caller-owned inputs for cleanup and inpainting jobs.

use base64::Engine as _;
use bytes::Bytes;

use crate::error::CoreError;

/// Content type assumed for uploaded parts that do not declare one.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/png";

/// Number of outputs requested when the caller does not specify one.
pub const DEFAULT_OUTPUT_COUNT: u8 = 1;

/// Largest number of outputs the inpainting provider generates per job.
pub const MAX_OUTPUT_COUNT: u8 = 4;

/// One image part (source image or selection mask).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Bytes,
    pub content_type: String,
}

impl ImageBlob {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// Blob with the default `image/png` content type.
    pub fn png(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, DEFAULT_IMAGE_CONTENT_TYPE)
    }

    /// Encode as `data:<content_type>;base64,<data>`.
    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.content_type)
    }

    fn ensure_not_empty(&self, part: &str) -> Result<(), CoreError> {
        if self.bytes.is_empty() {
            return Err(CoreError::Validation(format!("{part} must not be empty")));
        }
        Ok(())
    }
}

/// Input for an object-removal job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPayload {
    pub image: ImageBlob,
    pub mask: ImageBlob,
}

impl CleanupPayload {
    pub fn new(image: ImageBlob, mask: ImageBlob) -> Result<Self, CoreError> {
        image.ensure_not_empty("image")?;
        mask.ensure_not_empty("mask")?;
        Ok(Self { image, mask })
    }
}

/// Input for a prompt-guided inpainting job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InpaintPayload {
    pub image: ImageBlob,
    pub mask: ImageBlob,
    pub prompt: String,
    pub output_count: u8,
}

impl InpaintPayload {
    /// Build a validated payload.
    ///
    /// `output_count` must be in `1..=MAX_OUTPUT_COUNT`.
    pub fn new(
        image: ImageBlob,
        mask: ImageBlob,
        prompt: impl Into<String>,
        output_count: u8,
    ) -> Result<Self, CoreError> {
        image.ensure_not_empty("image")?;
        mask.ensure_not_empty("mask")?;
        validate_output_count(output_count)?;
        Ok(Self {
            image,
            mask,
            prompt: prompt.into(),
            output_count,
        })
    }
}

/// Validate a requested output count.
pub fn validate_output_count(count: u8) -> Result<(), CoreError> {
    if count == 0 || count > MAX_OUTPUT_COUNT {
        return Err(CoreError::Validation(format!(
            "Output count must be between 1 and {MAX_OUTPUT_COUNT}, got {count}"
        )));
    }
    Ok(())
}
