//! Shared job model, payload types, and error taxonomy for the retouch
//! gateway and orchestrator.

pub mod error;
pub mod gateway;
pub mod job;
pub mod payload;
