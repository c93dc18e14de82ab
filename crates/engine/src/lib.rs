//! Engine crate – battery gauge query service.
//!
//! Backend probes, tier selection, the query dispatcher and the response
//! channel live here behind the [`traits::PowerSupplyOps`] host seam, so the
//! same logic serves the CLI harness, the socket daemon and tests.

pub mod channel;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod doctor;
pub mod platform;
pub mod probes;
pub mod scenario;
pub mod selector;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use channel::{reply_pair, MethodResult, ResponseChannel};
pub use context::AppContext;
pub use dispatcher::QueryDispatcher;
pub use types::{ErrorCode, RequestEnvelope, ResponseEnvelope};
