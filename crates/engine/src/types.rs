use crate::traits::PowerSupplyOps;
use serde::{Deserialize, Serialize};

/// Method name answered by the battery channel.
pub const GET_BATTERY_LEVEL: &str = "getBatteryLevel";

/// User-visible message for every failed probe.
pub const UNAVAILABLE_MESSAGE: &str = "Could not fetch battery level";

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Host capability tier used to pick a backend probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Host exposes the capacity property directly.
    Modern,
    /// Host only publishes the level/scale battery broadcast.
    Legacy,
}

impl Tier {
    pub fn from_api_level(api_level: u32, modern_min_api_level: u32) -> Self {
        if api_level >= modern_min_api_level {
            Tier::Modern
        } else {
            Tier::Legacy
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Modern => f.write_str("modern"),
            Tier::Legacy => f.write_str("legacy"),
        }
    }
}

/// Snapshot of the host handed to a probe for a single request.
///
/// Borrowed from the caller and rebuilt on every call; probes only read it.
#[derive(Clone, Copy)]
pub struct EnvironmentDescriptor<'a> {
    pub tier: Option<Tier>,
    pub api_level: Option<u32>,
    pub power: &'a dyn PowerSupplyOps,
}

impl std::fmt::Debug for EnvironmentDescriptor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentDescriptor")
            .field("tier", &self.tier)
            .field("api_level", &self.api_level)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Probe results
// ---------------------------------------------------------------------------

/// A validated battery percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GaugeReading {
    percent: u8,
}

impl GaugeReading {
    /// Returns `None` for anything outside `[0, 100]`.
    pub fn new(percent: i64) -> Option<Self> {
        if (0..=100).contains(&percent) {
            Some(Self {
                percent: percent as u8,
            })
        } else {
            None
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success(GaugeReading),
    /// Internal diagnostic reason; never shown to the caller.
    Failure(String),
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

impl RequestEnvelope {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseEnvelope {
    Ok {
        value: serde_json::Value,
    },
    Error {
        code: ErrorCode,
        message: String,
        #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
        details: serde_json::Value,
    },
    NotImplemented,
}

impl ResponseEnvelope {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ResponseEnvelope::Error {
            code,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn unavailable() -> Self {
        Self::error(ErrorCode::Unavailable, UNAVAILABLE_MESSAGE)
    }

    /// Short label used in logs and scenario expectations.
    pub fn kind(&self) -> ResponseKind {
        match self {
            ResponseEnvelope::Ok { .. } => ResponseKind::Ok,
            ResponseEnvelope::Error { .. } => ResponseKind::Error,
            ResponseEnvelope::NotImplemented => ResponseKind::NotImplemented,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Ok,
    Error,
    NotImplemented,
}

impl std::fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseKind::Ok => f.write_str("ok"),
            ResponseKind::Error => f.write_str("error"),
            ResponseKind::NotImplemented => f.write_str("not_implemented"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unavailable,
    InvalidRequest,
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        f.write_str(&s)
    }
}

// ---------------------------------------------------------------------------
// Harness output contract
// ---------------------------------------------------------------------------

/// What `gaugectl call` reports for one request.
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub run_id: String,
    pub channel: String,
    pub method: String,
    pub response: ResponseEnvelope,
    pub timing_ms: u64,
    pub env_summary: EnvSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvSummary {
    pub os: String,
    pub arch: String,
    pub headless: bool,
}

impl Default for EnvSummary {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            headless: detect_headless(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    pub os_name: String,
    pub os_version: String,
    pub kernel: String,
    pub arch: String,
    pub headless: bool,
    pub api_level: Option<u32>,
    pub tier: Tier,
    pub modern_min_api_level: u32,
    pub sysfs_root: String,
    pub power_supplies: Vec<PowerSupplyEntry>,
    pub battery_device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSupplyEntry {
    pub name: String,
    pub kind: String,
}

// ---------------------------------------------------------------------------
// Daemon protocol
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonRequest {
    pub id: String,
    #[serde(flatten)]
    pub envelope: RequestEnvelope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub id: String,
    pub response: ResponseEnvelope,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn detect_headless() -> bool {
    match std::env::consts::OS {
        "linux" => std::env::var("DISPLAY").is_err() && std::env::var("WAYLAND_DISPLAY").is_err(),
        "macos" => std::env::var("SSH_TTY").is_ok() && std::env::var("DISPLAY").is_err(),
        _ => false,
    }
}

/// Generate a new run ID (UUIDv4).
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_reading_bounds() {
        assert_eq!(GaugeReading::new(0).map(|r| r.percent()), Some(0));
        assert_eq!(GaugeReading::new(100).map(|r| r.percent()), Some(100));
        assert!(GaugeReading::new(-1).is_none());
        assert!(GaugeReading::new(101).is_none());
        assert!(GaugeReading::new(i64::from(i32::MIN)).is_none());
    }

    #[test]
    fn test_tier_threshold() {
        assert_eq!(Tier::from_api_level(21, 21), Tier::Modern);
        assert_eq!(Tier::from_api_level(34, 21), Tier::Modern);
        assert_eq!(Tier::from_api_level(19, 21), Tier::Legacy);
    }

    #[test]
    fn test_response_envelope_wire_shape() {
        let ok = serde_json::to_value(ResponseEnvelope::Ok {
            value: serde_json::json!(73),
        })
        .unwrap();
        assert_eq!(ok, serde_json::json!({ "status": "ok", "value": 73 }));

        let err = serde_json::to_value(ResponseEnvelope::unavailable()).unwrap();
        assert_eq!(
            err,
            serde_json::json!({
                "status": "error",
                "code": "UNAVAILABLE",
                "message": "Could not fetch battery level",
            })
        );

        let ni = serde_json::to_value(ResponseEnvelope::NotImplemented).unwrap();
        assert_eq!(ni, serde_json::json!({ "status": "not_implemented" }));
    }

    #[test]
    fn test_request_envelope_arguments_optional() {
        let req: RequestEnvelope =
            serde_json::from_str(r#"{"method":"getBatteryLevel"}"#).unwrap();
        assert_eq!(req, RequestEnvelope::new(GET_BATTERY_LEVEL));

        let req: RequestEnvelope =
            serde_json::from_str(r#"{"method":"x","arguments":{"a":1}}"#).unwrap();
        assert_eq!(req.arguments, Some(serde_json::json!({ "a": 1 })));
    }

    #[test]
    fn test_daemon_request_flattens_envelope() {
        let req: DaemonRequest =
            serde_json::from_str(r#"{"id":"7","method":"getBatteryLevel"}"#).unwrap();
        assert_eq!(req.id, "7");
        assert_eq!(req.envelope.method, GET_BATTERY_LEVEL);
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::Unavailable.to_string(), "UNAVAILABLE");
        assert_eq!(ErrorCode::InvalidRequest.to_string(), "INVALID_REQUEST");
    }
}
