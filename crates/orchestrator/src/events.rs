//! Session lifecycle events, fanned out over a `tokio::sync::broadcast`
//! channel.
//!
//! Subscribers observe every session of one [`Orchestrator`](crate::Orchestrator)
//! without being able to influence it.

use chrono::{DateTime, Utc};
use retouch_core::job::{JobKind, JobStatus};
use tokio::sync::broadcast;
use uuid::Uuid;

/// What one poll reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub session_id: Uuid,
    pub job_id: String,
    /// 1-based poll count.
    pub attempt: u32,
    pub status: JobStatus,
}

/// Something that happened to a session.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The job was accepted by the gateway.
    Submitted {
        session_id: Uuid,
        kind: JobKind,
        /// Provider job id; absent for synchronous jobs.
        job_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// A poll returned a snapshot.
    Polled {
        report: PollReport,
        timestamp: DateTime<Utc>,
    },
    /// The session reached its terminal status. Published once per session.
    Settled {
        session_id: Uuid,
        job_id: Option<String>,
        status: JobStatus,
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            JobEvent::Submitted { session_id, .. } | JobEvent::Settled { session_id, .. } => {
                *session_id
            }
            JobEvent::Polled { report, .. } => report.session_id,
        }
    }
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out of [`JobEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer is full.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: JobEvent) {
        // Only fails when nobody is subscribed.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
