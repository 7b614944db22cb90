use retouch_core::error::GatewayError;
use retouch_core::job::JobStatus;

/// Why a session ended without a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// A gateway call failed. Never retried.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// No output after the whole polling budget.
    #[error("Job produced no output after {attempts} polls")]
    TimedOut { attempts: u32 },

    /// The caller cancelled the session.
    #[error("Job cancelled")]
    Cancelled,
}

impl OrchestratorError {
    /// The terminal status a session ends in for this error.
    pub fn terminal_status(&self) -> JobStatus {
        match self {
            OrchestratorError::Gateway(_) => JobStatus::Failed,
            OrchestratorError::TimedOut { .. } => JobStatus::TimedOut,
            OrchestratorError::Cancelled => JobStatus::Cancelled,
        }
    }
}
