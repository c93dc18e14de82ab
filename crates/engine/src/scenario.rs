//! Scenario runner – execute scripted channel calls from YAML files.

use crate::channel::{reply_pair, ResponseChannel};
use crate::context::AppContext;
use crate::dispatcher::QueryDispatcher;
use crate::platform::FixedPowerSupply;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Simulated host; without it the scenario runs against the caller's context.
    #[serde(default)]
    pub environment: Option<SimulatedEnvironment>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimulatedEnvironment {
    #[serde(default)]
    pub api_level: Option<u32>,
    #[serde(default)]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(default)]
    pub scale: Option<i32>,
}

impl SimulatedEnvironment {
    pub fn context(&self) -> AppContext {
        AppContext::simulated(
            FixedPowerSupply {
                capacity: self.capacity,
                level: self.level,
                scale: self.scale,
            },
            self.api_level,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub call: String,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
    #[serde(default = "default_expect")]
    pub expect: ResponseKind,
    #[serde(default)]
    pub expect_value: Option<serde_json::Value>,
}

fn default_expect() -> ResponseKind {
    ResponseKind::Ok
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub call: String,
    pub status: Status,
    pub response: ResponseEnvelope,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: Option<String>,
    pub overall_status: Status,
    pub step_results: Vec<StepResult>,
}

/// Load a scenario from a YAML string.
pub fn load_scenario(yaml: &str) -> Result<Scenario, String> {
    serde_yaml::from_str(yaml).map_err(|e| format!("failed to parse scenario YAML: {}", e))
}

/// Execute a scenario and return the overall result.
pub async fn run_scenario(scenario: &Scenario, channel_name: &str, ctx: &AppContext) -> ScenarioResult {
    let simulated = scenario.environment.map(|env| env.context());
    let ctx = simulated.as_ref().unwrap_or(ctx);
    let dispatcher = QueryDispatcher::new();
    let channel = ResponseChannel::new(channel_name, &dispatcher, ctx);

    let mut step_results = Vec::new();
    let mut overall = Status::Pass;

    for (i, step) in scenario.steps.iter().enumerate() {
        let req = RequestEnvelope {
            method: step.call.clone(),
            arguments: step.args.clone(),
        };
        let (reply, rx) = reply_pair();
        channel.handle_envelope(&req, reply);
        let response = match rx.await {
            Ok(r) => r,
            Err(_) => ResponseEnvelope::error(ErrorCode::InternalError, "channel dropped reply"),
        };

        let kind_matches = response.kind() == step.expect;
        let value_matches = match (&step.expect_value, &response) {
            (None, _) => true,
            (Some(expected), ResponseEnvelope::Ok { value }) => expected == value,
            (Some(_), _) => false,
        };
        let status = if kind_matches && value_matches {
            Status::Pass
        } else {
            tracing::warn!(
                step = i,
                expected = %step.expect,
                actual = %response.kind(),
                "scenario step mismatch"
            );
            overall = Status::Fail;
            Status::Fail
        };

        step_results.push(StepResult {
            call: step.call.clone(),
            status,
            response,
        });
    }

    ScenarioResult {
        name: scenario.name.clone(),
        overall_status: overall,
        step_results,
    }
}
