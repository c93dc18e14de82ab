//! Backend selection by host tier.

use crate::probes::{BackendProbe, LegacyBroadcastProbe, ModernCapacityProbe};
use crate::types::{EnvironmentDescriptor, ProbeOutcome, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVariant {
    Modern(ModernCapacityProbe),
    Legacy(LegacyBroadcastProbe),
}

impl BackendProbe for ProbeVariant {
    fn name(&self) -> &'static str {
        match self {
            ProbeVariant::Modern(p) => p.name(),
            ProbeVariant::Legacy(p) => p.name(),
        }
    }

    fn read(&self, env: &EnvironmentDescriptor<'_>) -> ProbeOutcome {
        match self {
            ProbeVariant::Modern(p) => p.read(env),
            ProbeVariant::Legacy(p) => p.read(env),
        }
    }
}

/// Picks the probe for `env`. Hosts without a tier marker get the legacy probe.
pub fn select(env: &EnvironmentDescriptor<'_>) -> ProbeVariant {
    match env.tier {
        Some(Tier::Modern) => ProbeVariant::Modern(ModernCapacityProbe),
        Some(Tier::Legacy) | None => ProbeVariant::Legacy(LegacyBroadcastProbe),
    }
}
