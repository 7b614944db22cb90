//! In-process stand-in for the remote providers.
//!
//! Serves the predictions and cleanup endpoints on `127.0.0.1:0` with
//! scripted responses, and records every request it receives.

use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use retouch_providers::ProviderConfig;
use serde_json::Value;

/// One multipart part received by the cleanup endpoint.
#[derive(Debug, Clone)]
pub struct RecordedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// What the fake server saw.
#[derive(Debug, Clone)]
pub enum Recorded {
    CreatePrediction { authorization: Option<String>, body: Value },
    GetPrediction { authorization: Option<String>, id: String },
    Cleanup { api_key: Option<String>, parts: Vec<RecordedPart> },
    /// A request no scripted route matched.
    Unrouted { path: String },
}

pub struct FakeState {
    pub create_response: Mutex<(u16, Value)>,
    pub get_response: Mutex<(u16, Value)>,
    pub cleanup_response: Mutex<(u16, Vec<u8>)>,
    pub recorded: Mutex<Vec<Recorded>>,
}

pub struct FakeProvider {
    pub base_url: String,
    pub state: Arc<FakeState>,
}

impl FakeProvider {
    /// Start a fake provider with healthy default responses.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            create_response: Mutex::new((
                201,
                serde_json::json!({"id": "pred-1", "status": "starting", "output": null, "error": null}),
            )),
            get_response: Mutex::new((
                200,
                serde_json::json!({"id": "pred-1", "status": "processing", "output": null, "error": null}),
            )),
            cleanup_response: Mutex::new((200, b"\x89PNG-cleaned".to_vec())),
            recorded: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/predictions", post(create_prediction))
            .route("/predictions/{id}", get(get_prediction))
            .route("/cleanup/v1", post(cleanup))
            .fallback(unrouted)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Provider configuration pointing both APIs at this server.
    pub fn config(&self) -> ProviderConfig {
        ProviderConfig {
            replicate_api_url: self.base_url.clone(),
            replicate_api_token: "r8_test".to_string(),
            replicate_inpaint_model: "inpaint-version-1".to_string(),
            clipdrop_api_url: self.base_url.clone(),
            clipdrop_api_token: "cd_test".to_string(),
            timeout_secs: 5,
        }
    }

    pub fn set_create_response(&self, status: u16, body: Value) {
        *self.state.create_response.lock().unwrap() = (status, body);
    }

    pub fn set_get_response(&self, status: u16, body: Value) {
        *self.state.get_response.lock().unwrap() = (status, body);
    }

    pub fn set_cleanup_response(&self, status: u16, body: &[u8]) {
        *self.state.cleanup_response.lock().unwrap() = (status, body.to_vec());
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.state.recorded.lock().unwrap().clone()
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn create_prediction(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.recorded.lock().unwrap().push(Recorded::CreatePrediction {
        authorization: header(&headers, "authorization"),
        body,
    });
    let (code, body) = state.create_response.lock().unwrap().clone();
    (status(code), Json(body))
}

async fn get_prediction(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.recorded.lock().unwrap().push(Recorded::GetPrediction {
        authorization: header(&headers, "authorization"),
        id,
    });
    let (code, body) = state.get_response.lock().unwrap().clone();
    (status(code), Json(body))
}

async fn cleanup(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Vec<u8>) {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        parts.push(RecordedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    state.recorded.lock().unwrap().push(Recorded::Cleanup {
        api_key: header(&headers, "x-api-key"),
        parts,
    });
    let (code, body) = state.cleanup_response.lock().unwrap().clone();
    (status(code), body)
}

async fn unrouted(State(state): State<Arc<FakeState>>, uri: Uri) -> StatusCode {
    state.recorded.lock().unwrap().push(Recorded::Unrouted {
        path: uri.path().to_string(),
    });
    StatusCode::NOT_FOUND
}
