#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use retouch_core::error::GatewayError;
use retouch_core::gateway::JobGateway;
use retouch_core::job::{Artifact, JobHandle, JobSnapshot, JobStatus};
use retouch_core::payload::{CleanupPayload, ImageBlob, InpaintPayload};
use retouch_orchestrator::{Orchestrator, OrchestratorConfig};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A call received by [`ScriptedGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Cleanup,
    Submit { prompt: String },
    Poll { id: String },
}

/// [`JobGateway`] fake answering from per-job scripts.
///
/// Submissions hand out ids `job-1`, `job-2`, ... in order. Polls pop the
/// next scripted snapshot for that id and keep reporting `processing` once
/// the script runs dry.
#[derive(Default)]
pub struct ScriptedGateway {
    submit_error: Mutex<Option<GatewayError>>,
    /// Status reported by new handles; `pending` when unset.
    handle_status: Mutex<Option<JobStatus>>,
    cleanup: Mutex<Option<Result<Artifact, GatewayError>>>,
    polls: Mutex<std::collections::HashMap<String, VecDeque<Result<JobSnapshot, GatewayError>>>>,
    /// Delay applied inside every call, to model network latency.
    latency: Mutex<Duration>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u32>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_submit(&self, err: GatewayError) {
        *self.submit_error.lock().unwrap() = Some(err);
    }

    pub fn set_handle_status(&self, status: JobStatus) {
        *self.handle_status.lock().unwrap() = Some(status);
    }

    pub fn set_cleanup(&self, result: Result<Artifact, GatewayError>) {
        *self.cleanup.lock().unwrap() = Some(result);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Queue the next poll answer for job `id`.
    pub fn push_poll(&self, id: &str, result: Result<JobSnapshot, GatewayError>) {
        self.polls
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(result);
    }

    /// Queue `n` snapshots without output for job `id`.
    pub fn push_processing(&self, id: &str, n: usize) {
        for _ in 0..n {
            self.push_poll(id, Ok(snapshot(id, JobStatus::Processing, None)));
        }
    }

    pub fn push_output(&self, id: &str, output: &[&str]) {
        self.push_poll(id, Ok(snapshot(id, JobStatus::Succeeded, Some(output))));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn poll_count(&self, id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Poll { id: polled } if polled == id))
            .count()
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl JobGateway for ScriptedGateway {
    async fn submit_cleanup_job(&self, _: &CleanupPayload) -> Result<Artifact, GatewayError> {
        self.calls.lock().unwrap().push(Call::Cleanup);
        self.simulate_latency().await;
        self.cleanup
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Artifact::png(b"\x89PNG-cleaned".to_vec().into())))
    }

    async fn submit_inpaint_job(
        &self,
        payload: &InpaintPayload,
    ) -> Result<JobHandle, GatewayError> {
        self.calls.lock().unwrap().push(Call::Submit {
            prompt: payload.prompt.clone(),
        });
        self.simulate_latency().await;
        if let Some(err) = self.submit_error.lock().unwrap().clone() {
            return Err(err);
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("job-{next}")
        };
        let status = self.handle_status.lock().unwrap().unwrap_or(JobStatus::Pending);
        Ok(JobHandle { id, status })
    }

    async fn poll_inpaint_job(&self, id: &str) -> Result<JobSnapshot, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Poll { id: id.to_string() });
        self.simulate_latency().await;
        self.polls
            .lock()
            .unwrap()
            .get_mut(id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(snapshot(id, JobStatus::Processing, None)))
    }
}

pub fn snapshot(id: &str, status: JobStatus, output: Option<&[&str]>) -> JobSnapshot {
    JobSnapshot {
        id: id.to_string(),
        status,
        output: output.map(|o| o.iter().map(|s| s.to_string()).collect()),
    }
}

pub fn inpaint_payload(prompt: &str) -> InpaintPayload {
    InpaintPayload::new(
        ImageBlob::new(b"jpeg-bytes".to_vec(), "image/jpeg"),
        ImageBlob::png(b"mask".to_vec()),
        prompt,
        1,
    )
    .unwrap()
}

pub fn cleanup_payload() -> CleanupPayload {
    CleanupPayload::new(
        ImageBlob::new(b"jpeg-bytes".to_vec(), "image/jpeg"),
        ImageBlob::png(b"mask".to_vec()),
    )
    .unwrap()
}

pub fn orchestrator(gateway: &Arc<ScriptedGateway>, max_attempts: u32) -> Orchestrator<ScriptedGateway> {
    Orchestrator::new(
        Arc::clone(gateway),
        OrchestratorConfig {
            poll_interval: POLL_INTERVAL,
            max_attempts,
        },
    )
    .unwrap()
}
