//! One submit-and-poll run against a [`JobGateway`].
//!
//! A [`PollSession`] owns its attempt counter and its poll timer; nothing
//! is shared between sessions. Every exit path goes through
//! [`PollSession::settle`], which reports the outcome exactly once.

use std::time::Duration;

use chrono::Utc;
use retouch_core::error::GatewayError;
use retouch_core::gateway::JobGateway;
use retouch_core::job::{Artifact, Job, JobKind, JobSnapshot, JobStatus};
use retouch_core::payload::{CleanupPayload, InpaintPayload};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{OrchestratorConfig, SessionHooks};
use crate::error::OrchestratorError;
use crate::events::{EventBus, JobEvent, PollReport};

/// What a successful session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetouchOutput {
    /// Output image references of an inpainting job.
    Inpainted(Vec<String>),
    /// Edited image of a cleanup job.
    Cleaned(Artifact),
}

/// Final result of a session, as seen by hooks and the editor bridge.
pub type SessionOutcome = Result<RetouchOutput, OrchestratorError>;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl SessionState {
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            SessionState::Succeeded
                | SessionState::Failed
                | SessionState::TimedOut
                | SessionState::Cancelled
        )
    }
}

impl From<JobStatus> for SessionState {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => SessionState::Submitting,
            JobStatus::Processing => SessionState::Polling,
            JobStatus::Succeeded => SessionState::Succeeded,
            JobStatus::Failed => SessionState::Failed,
            JobStatus::TimedOut => SessionState::TimedOut,
            JobStatus::Cancelled => SessionState::Cancelled,
        }
    }
}

/// Client-side bookkeeping for one in-flight job.
pub(crate) struct PollSession<'a, G: ?Sized> {
    id: Uuid,
    gateway: &'a G,
    config: OrchestratorConfig,
    hooks: &'a SessionHooks,
    events: &'a EventBus,
    job: Option<Job>,
    attempt: u32,
    state: SessionState,
}

impl<'a, G: JobGateway + ?Sized> PollSession<'a, G> {
    pub(crate) fn new(
        gateway: &'a G,
        config: OrchestratorConfig,
        hooks: &'a SessionHooks,
        events: &'a EventBus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            gateway,
            config,
            hooks,
            events,
            job: None,
            attempt: 0,
            state: SessionState::Idle,
        }
    }

    /// Submit an inpainting job and poll it until it produces output, fails,
    /// runs out of attempts or is cancelled.
    pub(crate) async fn run_inpaint(
        mut self,
        payload: &InpaintPayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, OrchestratorError> {
        if cancel.is_cancelled() {
            return self.settle(Err(OrchestratorError::Cancelled), RetouchOutput::Inpainted);
        }

        self.state = SessionState::Submitting;
        tracing::info!(session_id = %self.id, outputs = payload.output_count, "Submitting inpaint job");
        let handle = match self.gateway.submit_inpaint_job(payload).await {
            Ok(handle) => handle,
            Err(e) => return self.settle(Err(e.into()), RetouchOutput::Inpainted),
        };

        tracing::info!(session_id = %self.id, job_id = %handle.id, "Inpaint job submitted");
        self.events.publish(JobEvent::Submitted {
            session_id: self.id,
            kind: JobKind::Asynchronous,
            job_id: Some(handle.id.clone()),
            timestamp: Utc::now(),
        });
        let job_id = handle.id.clone();
        self.job = Some(Job::from_handle(&handle));
        self.state = SessionState::Polling;

        loop {
            if !wait_or_cancel(cancel, self.config.poll_interval).await {
                return self.settle(Err(OrchestratorError::Cancelled), RetouchOutput::Inpainted);
            }

            let polled = self.gateway.poll_inpaint_job(&job_id).await;
            self.attempt += 1;

            // The poll itself is never interrupted; a cancellation that
            // arrived meanwhile wins over whatever it returned.
            if cancel.is_cancelled() {
                return self.settle(Err(OrchestratorError::Cancelled), RetouchOutput::Inpainted);
            }
            let snapshot = match polled {
                Ok(snapshot) => snapshot,
                Err(e) => return self.settle(Err(e.into()), RetouchOutput::Inpainted),
            };

            let status = match self.observe(&snapshot) {
                Ok(status) => status,
                Err(e) => return self.settle(Err(e.into()), RetouchOutput::Inpainted),
            };
            tracing::debug!(
                session_id = %self.id,
                job_id = %job_id,
                attempt = self.attempt,
                %status,
                "Polled inpaint job",
            );
            self.report_poll(&job_id, status);

            match status {
                JobStatus::Succeeded => {
                    let output = snapshot.output.unwrap_or_default();
                    return self.settle(Ok(output), RetouchOutput::Inpainted);
                }
                s if s.is_terminal() => {
                    let err = GatewayError::UpstreamError(format!(
                        "Job {job_id} ended with status {s}"
                    ));
                    return self.settle(Err(err.into()), RetouchOutput::Inpainted);
                }
                _ if self.attempt >= self.config.max_attempts => {
                    return self.settle(
                        Err(OrchestratorError::TimedOut {
                            attempts: self.attempt,
                        }),
                        RetouchOutput::Inpainted,
                    );
                }
                _ => {}
            }
        }
    }

    /// Run a cleanup job: one call, raced against cancellation.
    pub(crate) async fn run_cleanup(
        mut self,
        payload: &CleanupPayload,
        cancel: &CancellationToken,
    ) -> Result<Artifact, OrchestratorError> {
        if cancel.is_cancelled() {
            return self.settle(Err(OrchestratorError::Cancelled), RetouchOutput::Cleaned);
        }

        self.state = SessionState::Submitting;
        tracing::info!(session_id = %self.id, "Submitting cleanup job");
        self.events.publish(JobEvent::Submitted {
            session_id: self.id,
            kind: JobKind::Synchronous,
            job_id: None,
            timestamp: Utc::now(),
        });

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
            result = self.gateway.submit_cleanup_job(payload) => result.map_err(Into::into),
        };
        self.settle(result, RetouchOutput::Cleaned)
    }

    /// Fold a snapshot into the job record and return the resulting status.
    fn observe(
        &mut self,
        snapshot: &JobSnapshot,
    ) -> Result<JobStatus, GatewayError> {
        let job = self
            .job
            .as_mut()
            .ok_or_else(|| GatewayError::InvalidResponse("Poll before submission".into()))?;
        job.observe(snapshot)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(job.status())
    }

    fn report_poll(&self, job_id: &str, status: JobStatus) {
        let report = PollReport {
            session_id: self.id,
            job_id: job_id.to_string(),
            attempt: self.attempt,
            status,
        };
        if let Some(hook) = &self.hooks.on_poll {
            hook(&report);
        }
        self.events.publish(JobEvent::Polled {
            report,
            timestamp: Utc::now(),
        });
    }

    /// Record the terminal outcome, then fire the settle hook and the
    /// `Settled` event. Only the first call has any effect.
    fn settle<T: Clone>(
        &mut self,
        result: Result<T, OrchestratorError>,
        wrap: fn(T) -> RetouchOutput,
    ) -> Result<T, OrchestratorError> {
        if self.state.is_settled() {
            tracing::debug!(session_id = %self.id, state = ?self.state, "Session already settled");
            return result;
        }

        let status = match &result {
            Ok(_) => JobStatus::Succeeded,
            Err(e) => e.terminal_status(),
        };
        self.state = SessionState::from(status);

        if let Some(job) = self.job.as_mut() {
            if !job.status().is_terminal() {
                let error = result.as_ref().err().map(ToString::to_string);
                if let Err(e) = job.settle(status, error) {
                    tracing::warn!(session_id = %self.id, error = %e, "Could not settle job record");
                }
            }
        }

        let job_id = self.job.as_ref().map(|j| j.id().to_string());
        match &result {
            Ok(_) => tracing::info!(session_id = %self.id, job_id = ?job_id, "Session succeeded"),
            Err(e) => tracing::warn!(
                session_id = %self.id,
                job_id = ?job_id,
                attempts = self.attempt,
                %status,
                error = %e,
                "Session ended without result",
            ),
        }

        if let Some(hook) = &self.hooks.on_settle {
            let outcome: SessionOutcome = result.clone().map(wrap);
            hook(&outcome);
        }
        self.events.publish(JobEvent::Settled {
            session_id: self.id,
            job_id,
            status,
            timestamp: Utc::now(),
        });

        result
    }
}

/// Sleep for `interval` unless cancelled first. Returns `false` on
/// cancellation; the timer is dropped as soon as the select resolves.
async fn wait_or_cancel(cancel: &CancellationToken, interval: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}
