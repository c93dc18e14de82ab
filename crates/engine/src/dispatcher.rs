//! Query dispatcher – routes a request to the selected probe and maps the
//! outcome to a response envelope.

use crate::probes::BackendProbe;
use crate::selector;
use crate::types::*;

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryDispatcher;

impl QueryDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Answer one request. A single probe read is final; nothing is retried.
    pub fn dispatch(
        &self,
        req: &RequestEnvelope,
        env: &EnvironmentDescriptor<'_>,
    ) -> ResponseEnvelope {
        if req.method != GET_BATTERY_LEVEL {
            tracing::debug!(method = %req.method, "method not implemented");
            return ResponseEnvelope::NotImplemented;
        }

        let probe = selector::select(env);
        tracing::debug!(
            probe = probe.name(),
            tier = ?env.tier,
            api_level = ?env.api_level,
            "selected backend probe"
        );

        match probe.read(env) {
            ProbeOutcome::Success(reading) => ResponseEnvelope::Ok {
                value: serde_json::json!(reading.percent()),
            },
            ProbeOutcome::Failure(reason) => {
                tracing::warn!(probe = probe.name(), %reason, "battery probe failed");
                ResponseEnvelope::unavailable()
            }
        }
    }
}
