//! REST client for the asynchronous predictions API.
//!
//! Wraps prediction creation and status retrieval using [`reqwest`].
//! Every request carries the `Authorization: Token <token>` header.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{expect_status, ProviderError};

/// HTTP client for the predictions API.
pub struct ReplicateApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

/// Model input for an inpainting prediction.
#[derive(Debug, Serialize)]
pub struct InpaintInput<'a> {
    pub prompt: &'a str,
    pub num_outputs: u8,
    /// Source image as a data URL.
    pub image: String,
    /// Selection mask as a data URL.
    pub mask: String,
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    version: &'a str,
    input: &'a InpaintInput<'a>,
}

/// A prediction as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: String,
    /// Model output: usually an array of image URLs, `null` until done.
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    /// Provider-side failure description, `null` when healthy.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl Prediction {
    /// The error flagged on the prediction, if any.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Output image references, normalised to a list.
    ///
    /// Accepts either an array of strings or a single string. Returns
    /// `None` while the provider has not produced output.
    pub fn output_refs(&self) -> Option<Vec<String>> {
        match self.output.as_ref()? {
            serde_json::Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            serde_json::Value::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}

impl ReplicateApi {
    /// Create a client reusing an existing [`reqwest::Client`].
    ///
    /// * `api_url` - Base URL, e.g. `https://api.replicate.com/v1`.
    pub fn with_client(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Start a prediction for the given model version.
    ///
    /// Sends `POST /predictions`. Anything other than `201 Created` is an
    /// error.
    pub async fn create_prediction(
        &self,
        version: &str,
        input: &InpaintInput<'_>,
    ) -> Result<Prediction, ProviderError> {
        let response = self
            .client
            .post(format!("{}/predictions", self.api_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&CreatePrediction { version, input })
            .send()
            .await?;

        let response = expect_status(response, StatusCode::CREATED).await?;
        Ok(response.json::<Prediction>().await?)
    }

    /// Fetch the current state of a prediction.
    ///
    /// Sends `GET /predictions/{id}`; expects `200 OK`.
    pub async fn get_prediction(&self, id: &str) -> Result<Prediction, ProviderError> {
        let response = self
            .client
            .get(self.prediction_url(id)?)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        let response = expect_status(response, StatusCode::OK).await?;
        Ok(response.json::<Prediction>().await?)
    }

    /// `{api_url}/predictions/{id}` with `id` encoded as a single segment.
    fn prediction_url(&self, id: &str) -> Result<reqwest::Url, ProviderError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["predictions", id]);
        Ok(url)
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }
}
