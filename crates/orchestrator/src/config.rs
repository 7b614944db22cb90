use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use retouch_core::error::CoreError;

use crate::events::PollReport;
use crate::session::SessionOutcome;

/// Default wait between two polls of the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of polls before a session gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Polling budget shared by every session of an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Fixed wait before each poll.
    pub poll_interval: Duration,
    /// Polls allowed without output before settling `TimedOut`.
    pub max_attempts: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl OrchestratorConfig {
    /// Reject budgets under which a session could never make progress.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::Validation(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Called after every poll that returned a snapshot.
pub type PollHook = Arc<dyn Fn(&PollReport) + Send + Sync>;

/// Called exactly once when a session settles.
pub type SettleHook = Arc<dyn Fn(&SessionOutcome) + Send + Sync>;

/// Optional callbacks invoked from inside sessions.
///
/// Hooks run on the session's task and must not block.
#[derive(Clone, Default)]
pub struct SessionHooks {
    pub on_poll: Option<PollHook>,
    pub on_settle: Option<SettleHook>,
}

impl SessionHooks {
    pub fn on_poll(mut self, hook: impl Fn(&PollReport) + Send + Sync + 'static) -> Self {
        self.on_poll = Some(Arc::new(hook));
        self
    }

    pub fn on_settle(mut self, hook: impl Fn(&SessionOutcome) + Send + Sync + 'static) -> Self {
        self.on_settle = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_poll", &self.on_poll.is_some())
            .field("on_settle", &self.on_settle.is_some())
            .finish()
    }
}
