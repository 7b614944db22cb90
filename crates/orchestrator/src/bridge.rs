//! Drives retouch sessions from editor lifecycle events.
//!
//! The editor sends [`EditorEvent`]s over an mpsc channel; the bridge keeps
//! at most one live session per shape and reports every settled session as
//! a [`RetouchUpdate`].

use std::collections::HashMap;

use retouch_core::gateway::JobGateway;
use retouch_core::payload::{CleanupPayload, InpaintPayload};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::orchestrator::Orchestrator;
use crate::session::{RetouchOutput, SessionOutcome};

/// The edit requested for a committed selection.
#[derive(Debug, Clone)]
pub enum RetouchRequest {
    Cleanup(CleanupPayload),
    Inpaint(InpaintPayload),
}

/// Lifecycle notifications from the editor.
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// The user started redrawing a selection; its running job is stale.
    SelectionStarted { shape_id: String },
    /// A selection was finished and should be retouched.
    SelectionCommitted {
        shape_id: String,
        request: RetouchRequest,
    },
    /// The shape was deleted.
    ShapeRemoved { shape_id: String },
}

/// Result of one session, addressed to the shape that started it.
#[derive(Debug, Clone)]
pub struct RetouchUpdate {
    pub shape_id: String,
    pub outcome: SessionOutcome,
}

struct ShapeSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct EditorBridge<G: ?Sized> {
    orchestrator: Orchestrator<G>,
    updates: mpsc::Sender<RetouchUpdate>,
    shutdown: CancellationToken,
    sessions: HashMap<String, ShapeSession>,
}

impl<G: JobGateway + ?Sized + 'static> EditorBridge<G> {
    /// `shutdown` stops the bridge and cancels every session it started.
    pub fn new(
        orchestrator: Orchestrator<G>,
        updates: mpsc::Sender<RetouchUpdate>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            orchestrator,
            updates,
            shutdown,
            sessions: HashMap::new(),
        }
    }

    /// Consume editor events until the channel closes or shutdown fires.
    ///
    /// Sessions still running at that point are cancelled and their
    /// `Cancelled` updates are delivered before this returns.
    pub async fn run(mut self, mut events: mpsc::Receiver<EditorEvent>) {
        tracing::info!("Editor bridge started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }

        let remaining = self.sessions.len();
        for (_, session) in self.sessions.drain() {
            session.cancel.cancel();
            let _ = session.task.await;
        }
        tracing::info!(remaining, "Editor bridge stopped");
    }

    fn handle(&mut self, event: EditorEvent) {
        self.sessions.retain(|_, s| !s.task.is_finished());

        match event {
            EditorEvent::SelectionStarted { shape_id } => {
                tracing::debug!(%shape_id, "Selection started");
                self.cancel_shape(&shape_id);
            }
            EditorEvent::ShapeRemoved { shape_id } => {
                tracing::debug!(%shape_id, "Shape removed");
                self.cancel_shape(&shape_id);
            }
            EditorEvent::SelectionCommitted { shape_id, request } => {
                self.cancel_shape(&shape_id);
                self.start(shape_id, request);
            }
        }
    }

    fn cancel_shape(&mut self, shape_id: &str) {
        if let Some(session) = self.sessions.remove(shape_id) {
            tracing::info!(%shape_id, "Cancelling retouch session");
            session.cancel.cancel();
        }
    }

    fn start(&mut self, shape_id: String, request: RetouchRequest) {
        let cancel = self.shutdown.child_token();
        let token = cancel.clone();
        let orchestrator = self.orchestrator.clone();
        let updates = self.updates.clone();
        let id = shape_id.clone();

        let task = tokio::spawn(async move {
            let outcome = match request {
                RetouchRequest::Inpaint(payload) => orchestrator
                    .inpaint(&payload, &token)
                    .await
                    .map(RetouchOutput::Inpainted),
                RetouchRequest::Cleanup(payload) => orchestrator
                    .cleanup(&payload, &token)
                    .await
                    .map(RetouchOutput::Cleaned),
            };
            if updates
                .send(RetouchUpdate {
                    shape_id: id,
                    outcome,
                })
                .await
                .is_err()
            {
                tracing::debug!("Update receiver dropped");
            }
        });

        tracing::info!(%shape_id, "Retouch session started");
        self.sessions.insert(shape_id, ShapeSession { cancel, task });
    }
}
