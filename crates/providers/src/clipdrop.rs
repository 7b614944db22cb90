//! REST client for the synchronous cleanup API.
//!
//! The provider blocks until the edited image is ready and returns it as
//! the response body, so there is nothing to poll.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use retouch_core::payload::ImageBlob;

use crate::error::{expect_status, ProviderError};

/// Header carrying the cleanup provider credential.
const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the cleanup API.
pub struct ClipDropApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl ClipDropApi {
    /// Create a client reusing an existing [`reqwest::Client`].
    ///
    /// * `api_url` - Base URL, e.g. `https://clipdrop-api.co`.
    pub fn with_client(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Remove the masked region from `image`.
    ///
    /// Sends `POST /cleanup/v1` with `image_file` and `mask_file` parts and
    /// returns the raw image bytes. Anything other than `200 OK` is an
    /// error.
    pub async fn cleanup(&self, image: &ImageBlob, mask: &ImageBlob) -> Result<Bytes, ProviderError> {
        let form = Form::new()
            .part(
                "image_file",
                Part::bytes(image.bytes.to_vec())
                    .file_name("image.jpeg")
                    .mime_str("image/jpeg")?,
            )
            .part(
                "mask_file",
                Part::bytes(mask.bytes.to_vec())
                    .file_name("mask.png")
                    .mime_str("image/png")?,
            );

        let response = self
            .client
            .post(format!("{}/cleanup/v1", self.api_url))
            .header(API_KEY_HEADER, &self.token)
            .multipart(form)
            .send()
            .await?;

        let response = expect_status(response, StatusCode::OK).await?;
        Ok(response.bytes().await?)
    }
}
