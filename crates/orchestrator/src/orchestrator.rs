//! Entry point for running retouch jobs to completion.

use std::sync::Arc;

use retouch_core::error::CoreError;
use retouch_core::gateway::JobGateway;
use retouch_core::job::Artifact;
use retouch_core::payload::{CleanupPayload, InpaintPayload};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{OrchestratorConfig, SessionHooks};
use crate::error::OrchestratorError;
use crate::events::{EventBus, JobEvent};
use crate::session::PollSession;

/// Turns a gateway's submit and poll calls into single awaitable results.
///
/// Every call runs its own session with its own counter, timer and
/// cancellation token; concurrent sessions never interact. Cloning is
/// cheap and clones share the gateway, hooks and event bus.
pub struct Orchestrator<G: ?Sized> {
    gateway: Arc<G>,
    config: OrchestratorConfig,
    hooks: SessionHooks,
    events: Arc<EventBus>,
}

impl<G: ?Sized> Clone for Orchestrator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            config: self.config,
            hooks: self.hooks.clone(),
            events: Arc::clone(&self.events),
        }
    }
}

impl<G: JobGateway + ?Sized + 'static> Orchestrator<G> {
    /// Create an orchestrator after validating `config`.
    pub fn new(gateway: Arc<G>, config: OrchestratorConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            gateway,
            config,
            hooks: SessionHooks::default(),
            events: Arc::new(EventBus::default()),
        })
    }

    /// Attach callbacks invoked from every session.
    pub fn with_hooks(mut self, hooks: SessionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Receive [`JobEvent`]s from every session started after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Submit an inpainting job and wait for its output references.
    ///
    /// Polls every `poll_interval` up to `max_attempts` times. Cancelling
    /// `cancel` stops the session at the next poll boundary without any
    /// further network call.
    pub async fn inpaint(
        &self,
        payload: &InpaintPayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, OrchestratorError> {
        self.session().run_inpaint(payload, cancel).await
    }

    /// Run a cleanup job and return the edited image.
    pub async fn cleanup(
        &self,
        payload: &CleanupPayload,
        cancel: &CancellationToken,
    ) -> Result<Artifact, OrchestratorError> {
        self.session().run_cleanup(payload, cancel).await
    }

    /// Run [`inpaint`](Self::inpaint) on its own task.
    ///
    /// The session listens to a child of `parent`: cancelling the handle
    /// leaves sibling sessions alone, cancelling `parent` stops them all.
    pub fn spawn_inpaint(
        &self,
        payload: InpaintPayload,
        parent: &CancellationToken,
    ) -> SessionHandle<Vec<String>> {
        let this = self.clone();
        SessionHandle::spawn(parent, move |cancel| async move {
            this.inpaint(&payload, &cancel).await
        })
    }

    /// Run [`cleanup`](Self::cleanup) on its own task.
    pub fn spawn_cleanup(
        &self,
        payload: CleanupPayload,
        parent: &CancellationToken,
    ) -> SessionHandle<Artifact> {
        let this = self.clone();
        SessionHandle::spawn(parent, move |cancel| async move {
            this.cleanup(&payload, &cancel).await
        })
    }

    fn session(&self) -> PollSession<'_, G> {
        PollSession::new(&*self.gateway, self.config, &self.hooks, &self.events)
    }
}

/// A session running on its own task.
pub struct SessionHandle<T> {
    cancel: CancellationToken,
    task: JoinHandle<Result<T, OrchestratorError>>,
}

impl<T: Send + 'static> SessionHandle<T> {
    fn spawn<F, Fut>(parent: &CancellationToken, run: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = Result<T, OrchestratorError>> + Send + 'static,
    {
        let cancel = parent.child_token();
        let task = tokio::spawn(run(cancel.clone()));
        Self { cancel, task }
    }

    /// Ask the session to stop. It settles `Cancelled` at its next poll
    /// boundary; an in-flight cleanup call is abandoned immediately.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session's result.
    ///
    /// A task torn down by runtime shutdown reports `Cancelled`; a panic
    /// inside the session is resumed on the caller.
    pub async fn join(self) -> Result<T, OrchestratorError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                tracing::warn!(error = %e, "Session task did not complete");
                Err(OrchestratorError::Cancelled)
            }
        }
    }
}
