/// Default base URL of the predictions API.
const DEFAULT_REPLICATE_API_URL: &str = "https://api.replicate.com/v1";
/// Default base URL of the cleanup API.
const DEFAULT_CLIPDROP_API_URL: &str = "https://clipdrop-api.co";
/// Default timeout for a single provider request, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Provider endpoints and credentials.
///
/// Lives server-side only; nothing here is ever sent to the browser.
#[derive(Clone)]
pub struct ProviderConfig {
    pub replicate_api_url: String,
    pub replicate_api_token: String,
    /// Model version identifier used for inpainting predictions.
    pub replicate_inpaint_model: String,
    pub clipdrop_api_url: String,
    pub clipdrop_api_token: String,
    /// Timeout for a single provider request, in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("replicate_api_url", &self.replicate_api_url)
            .field("replicate_api_token", &"<redacted>")
            .field("replicate_inpaint_model", &self.replicate_inpaint_model)
            .field("clipdrop_api_url", &self.clipdrop_api_url)
            .field("clipdrop_api_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// | Env Var                   | Required | Default                        |
    /// |---------------------------|----------|--------------------------------|
    /// | `REPLICATE_API_URL`       | no       | `https://api.replicate.com/v1` |
    /// | `REPLICATE_API_TOKEN`     | **yes**  | --                             |
    /// | `REPLICATE_INPAINT_MODEL` | **yes**  | --                             |
    /// | `CLIPDROP_API_URL`        | no       | `https://clipdrop-api.co`      |
    /// | `CLIPDROP_API_TOKEN`      | **yes**  | --                             |
    /// | `PROVIDER_TIMEOUT_SECS`   | no       | `60`                           |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or empty, or if
    /// `PROVIDER_TIMEOUT_SECS` is not a valid u64.
    pub fn from_env() -> Self {
        let timeout_secs: u64 = std::env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("PROVIDER_TIMEOUT_SECS must be a valid u64");

        Self {
            replicate_api_url: std::env::var("REPLICATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_REPLICATE_API_URL.into()),
            replicate_api_token: required("REPLICATE_API_TOKEN"),
            replicate_inpaint_model: required("REPLICATE_INPAINT_MODEL"),
            clipdrop_api_url: std::env::var("CLIPDROP_API_URL")
                .unwrap_or_else(|_| DEFAULT_CLIPDROP_API_URL.into()),
            clipdrop_api_token: required("CLIPDROP_API_TOKEN"),
            timeout_secs,
        }
    }
}

fn required(name: &str) -> String {
    let value = std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set in the environment"));
    assert!(!value.is_empty(), "{name} must not be empty");
    value
}
