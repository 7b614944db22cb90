#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use retouch_api::config::ServerConfig;
use retouch_api::router::build_app_router;
use retouch_api::state::AppState;
use retouch_core::error::GatewayError;
use retouch_core::gateway::JobGateway;
use retouch_core::job::{Artifact, JobHandle, JobSnapshot, JobStatus};
use retouch_core::payload::{CleanupPayload, InpaintPayload};
use retouch_providers::ProviderConfig;

pub const BOUNDARY: &str = "retouch-test-boundary";

/// A call received by [`FakeGateway`].
#[derive(Debug, Clone)]
pub enum GatewayCall {
    Cleanup { image_len: usize, mask_len: usize },
    Inpaint { prompt: String, output_count: u8 },
    Poll { id: String },
}

/// Scripted [`JobGateway`] that records every call.
pub struct FakeGateway {
    pub cleanup: Mutex<Result<Artifact, GatewayError>>,
    pub submit: Mutex<Result<JobHandle, GatewayError>>,
    pub poll: Mutex<Result<JobSnapshot, GatewayError>>,
    pub calls: Mutex<Vec<GatewayCall>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cleanup: Mutex::new(Ok(Artifact::png(b"\x89PNG-cleaned".to_vec().into()))),
            submit: Mutex::new(Ok(JobHandle {
                id: "pred-1".to_string(),
                status: JobStatus::Pending,
            })),
            poll: Mutex::new(Ok(JobSnapshot {
                id: "pred-1".to_string(),
                status: JobStatus::Processing,
                output: None,
            })),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobGateway for FakeGateway {
    async fn submit_cleanup_job(&self, payload: &CleanupPayload) -> Result<Artifact, GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::Cleanup {
            image_len: payload.image.bytes.len(),
            mask_len: payload.mask.bytes.len(),
        });
        self.cleanup.lock().unwrap().clone()
    }

    async fn submit_inpaint_job(
        &self,
        payload: &InpaintPayload,
    ) -> Result<JobHandle, GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::Inpaint {
            prompt: payload.prompt.clone(),
            output_count: payload.output_count,
        });
        self.submit.lock().unwrap().clone()
    }

    async fn poll_inpaint_job(&self, id: &str) -> Result<JobSnapshot, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Poll { id: id.to_string() });
        self.poll.lock().unwrap().clone()
    }
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Provider values are never used: the gateway is always a fake.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        static_dir: "tests/no-such-static-dir".to_string(),
        providers: ProviderConfig {
            replicate_api_url: "http://127.0.0.1:9".to_string(),
            replicate_api_token: "r8_unused".to_string(),
            replicate_inpaint_model: "unused".to_string(),
            clipdrop_api_url: "http://127.0.0.1:9".to_string(),
            clipdrop_api_token: "cd_unused".to_string(),
            timeout_secs: 1,
        },
    }
}

/// Build the full application router around the given gateway, with the
/// same middleware stack production uses.
pub fn build_test_app(gateway: Arc<FakeGateway>) -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        gateway,
    };
    build_app_router(state, &config)
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Encode parts as a `multipart/form-data` body using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// The image and mask parts every retouch form starts with.
pub fn image_parts() -> Vec<Part<'static>> {
    vec![
        Part::File {
            name: "image",
            content_type: "image/jpeg",
            bytes: b"jpeg-bytes",
        },
        Part::File {
            name: "mask",
            content_type: "image/png",
            bytes: b"mask",
        },
    ]
}

/// Send a GET request to the given URI and return the response.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a multipart POST request to the given URI and return the response.
pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Collect a response body as UTF-8 text.
pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Value of the `x-gateway-error` header, if any.
pub fn error_kind(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get("x-gateway-error")
        .map(|v| v.to_str().unwrap().to_string())
}
