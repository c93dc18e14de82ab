//! Application context – holds the host power service and tier settings.

use crate::config::{GaugeConfig, TierConfig};
use crate::platform::{FixedPowerSupply, SysfsPowerSupply, UnavailablePowerSupply};
use crate::traits::PowerSupplyOps;
use crate::types::{EnvironmentDescriptor, Tier};

/// Central context the channel draws per-request environments from.
///
/// Holds the power service as a trait object so hosts (CLI, scenarios,
/// tests) can swap a real sysfs reader for simulated values.
pub struct AppContext {
    power: Box<dyn PowerSupplyOps>,
    api_level: Option<u32>,
    tier_config: TierConfig,
}

impl AppContext {
    pub fn new(
        power: Box<dyn PowerSupplyOps>,
        api_level: Option<u32>,
        tier_config: TierConfig,
    ) -> Self {
        Self {
            power,
            api_level,
            tier_config,
        }
    }

    /// Real host: sysfs power supply as configured.
    pub fn from_config(config: &GaugeConfig) -> Self {
        let power = SysfsPowerSupply::new(
            config.power_supply.sysfs_root.clone(),
            config.power_supply.device.clone(),
        );
        Self::new(Box::new(power), config.host.api_level, config.tier)
    }

    /// Host with preset readings.
    pub fn simulated(power: FixedPowerSupply, api_level: Option<u32>) -> Self {
        Self::new(Box::new(power), api_level, TierConfig::default())
    }

    /// Host with no battery at all.
    pub fn headless() -> Self {
        Self::new(Box::new(UnavailablePowerSupply), None, TierConfig::default())
    }

    pub fn api_level(&self) -> Option<u32> {
        self.api_level
    }

    pub fn tier_config(&self) -> TierConfig {
        self.tier_config
    }

    pub fn tier(&self) -> Option<Tier> {
        self.api_level
            .map(|level| Tier::from_api_level(level, self.tier_config.modern_min_api_level))
    }

    pub fn power(&self) -> &dyn PowerSupplyOps {
        self.power.as_ref()
    }

    /// Fresh descriptor for one request; nothing is cached between calls.
    pub fn environment(&self) -> EnvironmentDescriptor<'_> {
        EnvironmentDescriptor {
            tier: self.tier(),
            api_level: self.api_level,
            power: self.power(),
        }
    }
}
