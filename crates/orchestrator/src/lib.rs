pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod orchestrator;
pub mod session;

pub use bridge::{EditorBridge, EditorEvent, RetouchRequest, RetouchUpdate};
pub use config::{OrchestratorConfig, SessionHooks};
pub use error::OrchestratorError;
pub use events::{JobEvent, PollReport};
pub use http::HttpGateway;
pub use orchestrator::{Orchestrator, SessionHandle};
pub use session::{RetouchOutput, SessionOutcome, SessionState};
