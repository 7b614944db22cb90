//! REST clients for the remote inference providers.
//!
//! [`replicate::ReplicateApi`] drives the asynchronous predictions API used
//! for inpainting, [`clipdrop::ClipDropApi`] the synchronous cleanup API.
//! [`gateway::ProviderGateway`] combines both behind the
//! [`JobGateway`](retouch_core::gateway::JobGateway) contract and holds the
//! provider credentials.

pub mod clipdrop;
pub mod config;
pub mod error;
pub mod gateway;
pub mod replicate;

pub use config::ProviderConfig;
pub use error::ProviderError;
pub use gateway::ProviderGateway;
