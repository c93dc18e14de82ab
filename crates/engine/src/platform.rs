//! Host implementations of [`PowerSupplyOps`].
//!
//! - [`SysfsPowerSupply`]: Linux `/sys/class/power_supply`
//! - [`FixedPowerSupply`]: in-memory values for simulation and tests
//! - [`UnavailablePowerSupply`]: always returns UNSUPPORTED

use crate::traits::*;
use crate::types::PowerSupplyEntry;
use std::path::{Path, PathBuf};

// ===========================================================================
// Sysfs – wraps std::fs reads under /sys/class/power_supply
// ===========================================================================

pub struct SysfsPowerSupply {
    root: PathBuf,
    device: Option<String>,
}

impl SysfsPowerSupply {
    pub fn new(root: impl Into<PathBuf>, device: Option<String>) -> Self {
        Self {
            root: root.into(),
            device,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every supply under the root with its `type` attribute.
    pub fn entries(&self) -> CapResult<Vec<PowerSupplyEntry>> {
        let dir = std::fs::read_dir(&self.root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CapError::Unsupported(format!(
                "no power supply class at {}",
                self.root.display()
            )),
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot list {}: {}", self.root.display(), e))
            }
            _ => CapError::Io(e),
        })?;

        let mut out = Vec::new();
        for entry in dir {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let kind = read_attr(&entry.path().join("type"))?
                .unwrap_or_else(|| "Unknown".to_string());
            out.push(PowerSupplyEntry { name, kind });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// The configured device, or the first supply whose type is `Battery`.
    pub fn battery_device(&self) -> CapResult<String> {
        if let Some(ref name) = self.device {
            return Ok(name.clone());
        }
        self.entries()?
            .into_iter()
            .find(|e| e.kind == "Battery")
            .map(|e| e.name)
            .ok_or_else(|| {
                CapError::Unsupported(format!("no battery under {}", self.root.display()))
            })
    }

    /// Charge counters are reported in µAh and can exceed i32 on large packs.
    fn device_attr(&self, attr: &str) -> CapResult<Option<i64>> {
        let path = self.root.join(self.battery_device()?).join(attr);
        match read_attr(&path)? {
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|e| CapError::Parse(format!("{}: {:?}: {}", path.display(), raw, e))),
            None => Ok(None),
        }
    }
}

impl PowerSupplyOps for SysfsPowerSupply {
    fn capacity_property(&self) -> CapResult<i32> {
        let raw = self.device_attr("capacity")?.ok_or_else(|| {
            CapError::Unsupported("battery does not expose a capacity attribute".into())
        })?;
        i32::try_from(raw).map_err(|_| CapError::Parse(format!("capacity {} out of range", raw)))
    }

    fn battery_broadcast(&self) -> CapResult<BatteryBroadcast> {
        let charge = BatteryBroadcast {
            level: self.device_attr("charge_now")?,
            scale: self.device_attr("charge_full")?,
        };
        if charge.level.is_some() || charge.scale.is_some() {
            return Ok(charge);
        }
        Ok(BatteryBroadcast {
            level: self.device_attr("energy_now")?,
            scale: self.device_attr("energy_full")?,
        })
    }
}

/// Read a trimmed sysfs attribute; a missing file is `None`.
fn read_attr(path: &Path) -> CapResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s.trim().to_string())),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(None),
            std::io::ErrorKind::PermissionDenied => Err(CapError::PermissionDenied(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
            _ => Err(CapError::Io(e)),
        },
    }
}

// ===========================================================================
// Fixed – simulated host
// ===========================================================================

/// Host with preset readings. A missing capacity reports UNSUPPORTED.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedPowerSupply {
    pub capacity: Option<i32>,
    pub level: Option<i32>,
    pub scale: Option<i32>,
}

impl FixedPowerSupply {
    pub fn capacity(value: i32) -> Self {
        Self {
            capacity: Some(value),
            ..Self::default()
        }
    }

    pub fn broadcast(level: Option<i32>, scale: Option<i32>) -> Self {
        Self {
            capacity: None,
            level,
            scale,
        }
    }
}

impl PowerSupplyOps for FixedPowerSupply {
    fn capacity_property(&self) -> CapResult<i32> {
        self.capacity
            .ok_or_else(|| CapError::Unsupported("simulated host has no capacity property".into()))
    }

    fn battery_broadcast(&self) -> CapResult<BatteryBroadcast> {
        Ok(BatteryBroadcast {
            level: self.level.map(i64::from),
            scale: self.scale.map(i64::from),
        })
    }
}

// ===========================================================================
// Unavailable – hosts without a battery
// ===========================================================================

pub struct UnavailablePowerSupply;

impl PowerSupplyOps for UnavailablePowerSupply {
    fn capacity_property(&self) -> CapResult<i32> {
        Err(CapError::Unsupported("no power supply on this host".into()))
    }

    fn battery_broadcast(&self) -> CapResult<BatteryBroadcast> {
        Err(CapError::Unsupported("no power supply on this host".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::{BackendProbe, LegacyBroadcastProbe};

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn fake_sysfs() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("AC"), "type", "Mains\n");
        let bat = tmp.path().join("BAT0");
        write(&bat, "type", "Battery\n");
        write(&bat, "capacity", "73\n");
        write(&bat, "charge_now", "2250000\n");
        write(&bat, "charge_full", "5000000\n");
        tmp
    }

    #[test]
    fn test_sysfs_finds_battery_and_reads_capacity() {
        let tmp = fake_sysfs();
        let ps = SysfsPowerSupply::new(tmp.path(), None);
        assert_eq!(ps.battery_device().unwrap(), "BAT0");
        assert_eq!(ps.capacity_property().unwrap(), 73);
    }

    #[test]
    fn test_sysfs_broadcast_prefers_charge() {
        let tmp = fake_sysfs();
        let ps = SysfsPowerSupply::new(tmp.path(), None);
        let b = ps.battery_broadcast().unwrap();
        assert_eq!(b.level, Some(2_250_000));
        assert_eq!(b.scale, Some(5_000_000));
    }

    #[test]
    fn test_sysfs_broadcast_falls_back_to_energy() {
        let tmp = tempfile::tempdir().unwrap();
        let bat = tmp.path().join("BAT1");
        write(&bat, "type", "Battery");
        write(&bat, "energy_now", "30");
        write(&bat, "energy_full", "60");
        let ps = SysfsPowerSupply::new(tmp.path(), None);
        let b = ps.battery_broadcast().unwrap();
        assert_eq!((b.level, b.scale), (Some(30), Some(60)));
        assert!(matches!(ps.capacity_property(), Err(CapError::Unsupported(_))));
    }

    #[test]
    fn test_sysfs_wide_counters_are_not_clamped() {
        let tmp = tempfile::tempdir().unwrap();
        let bat = tmp.path().join("BAT0");
        write(&bat, "type", "Battery");
        write(&bat, "capacity", "4294967296");
        write(&bat, "charge_now", "3000000000");
        write(&bat, "charge_full", "6000000000");
        let ps = SysfsPowerSupply::new(tmp.path(), None);

        let b = ps.battery_broadcast().unwrap();
        assert_eq!((b.level, b.scale), (Some(3_000_000_000), Some(6_000_000_000)));
        assert!(matches!(ps.capacity_property(), Err(CapError::Parse(_))));

        let env = crate::types::EnvironmentDescriptor {
            tier: Some(crate::types::Tier::Legacy),
            api_level: None,
            power: &ps,
        };
        match LegacyBroadcastProbe.read(&env) {
            crate::types::ProbeOutcome::Success(r) => assert_eq!(r.percent(), 50),
            other => panic!("expected 50%, got {:?}", other),
        }
    }

    #[test]
    fn test_sysfs_entries_sorted() {
        let tmp = fake_sysfs();
        let ps = SysfsPowerSupply::new(tmp.path(), None);
        let names: Vec<String> = ps.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["AC".to_string(), "BAT0".to_string()]);
    }

    #[test]
    fn test_sysfs_missing_root_is_unsupported() {
        let tmp = tempfile::tempdir().unwrap();
        let ps = SysfsPowerSupply::new(tmp.path().join("nope"), None);
        assert!(matches!(ps.capacity_property(), Err(CapError::Unsupported(_))));
    }

    #[test]
    fn test_sysfs_garbage_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let bat = tmp.path().join("BAT0");
        write(&bat, "capacity", "full");
        let ps = SysfsPowerSupply::new(tmp.path(), Some("BAT0".into()));
        assert!(matches!(ps.capacity_property(), Err(CapError::Parse(_))));
    }

    #[test]
    fn test_unavailable_host() {
        assert!(UnavailablePowerSupply.capacity_property().is_err());
        assert!(UnavailablePowerSupply.battery_broadcast().is_err());
    }
}
