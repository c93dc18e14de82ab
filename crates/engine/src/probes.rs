//! Backend probes – the two host-specific ways of reading the battery gauge.

use crate::traits::BatteryBroadcast;
use crate::types::{EnvironmentDescriptor, GaugeReading, ProbeOutcome};

/// Reason recorded for every failed read.
pub const UNAVAILABLE: &str = "UNAVAILABLE";

/// One read of the battery gauge against a host environment.
pub trait BackendProbe {
    fn name(&self) -> &'static str;
    fn read(&self, env: &EnvironmentDescriptor<'_>) -> ProbeOutcome;
}

fn unavailable(detail: impl std::fmt::Display) -> ProbeOutcome {
    ProbeOutcome::Failure(format!("{}: {}", UNAVAILABLE, detail))
}

// ---------------------------------------------------------------------------
// Modern tier – capacity property
// ---------------------------------------------------------------------------

/// Reads the capacity property straight from the host power service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModernCapacityProbe;

impl BackendProbe for ModernCapacityProbe {
    fn name(&self) -> &'static str {
        "capacity_property"
    }

    fn read(&self, env: &EnvironmentDescriptor<'_>) -> ProbeOutcome {
        match env.power.capacity_property() {
            Ok(value) => match GaugeReading::new(i64::from(value)) {
                Some(reading) => ProbeOutcome::Success(reading),
                None => unavailable(format_args!("capacity property returned {}", value)),
            },
            Err(e) => unavailable(format_args!("capacity property read failed: {}", e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Legacy tier – level / scale broadcast
// ---------------------------------------------------------------------------

/// Derives the percentage from the battery broadcast as `level * 100 / scale`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyBroadcastProbe;

impl LegacyBroadcastProbe {
    fn compute(broadcast: BatteryBroadcast) -> ProbeOutcome {
        let (level, scale) = match (broadcast.level, broadcast.scale) {
            (Some(level), Some(scale)) => (level, scale),
            (None, _) => return unavailable("broadcast has no level"),
            (_, None) => return unavailable("broadcast has no scale"),
        };
        // Negative level is the unknown-sentinel; -1 / 200 must not read as 0%.
        if level < 0 {
            return unavailable(format_args!("broadcast level is {}", level));
        }
        if scale <= 0 {
            return unavailable(format_args!("broadcast scale is {}", scale));
        }
        let percent = match level.checked_mul(100) {
            Some(scaled) => scaled / scale,
            None => return unavailable(format_args!("broadcast level {} overflows", level)),
        };
        match GaugeReading::new(percent) {
            Some(reading) => ProbeOutcome::Success(reading),
            None => unavailable(format_args!(
                "computed percent {} from level {} / scale {}",
                percent, level, scale
            )),
        }
    }
}

impl BackendProbe for LegacyBroadcastProbe {
    fn name(&self) -> &'static str {
        "battery_broadcast"
    }

    fn read(&self, env: &EnvironmentDescriptor<'_>) -> ProbeOutcome {
        match env.power.battery_broadcast() {
            Ok(broadcast) => Self::compute(broadcast),
            Err(e) => unavailable(format_args!("battery broadcast read failed: {}", e)),
        }
    }
}
