//! Doctor – gather host and power-supply facts for diagnostics.

use crate::config::GaugeConfig;
use crate::context::AppContext;
use crate::platform::SysfsPowerSupply;
use crate::types::*;

/// Build a report for the configured host.
pub fn run_doctor(config: &GaugeConfig, ctx: &AppContext) -> DoctorReport {
    let sysfs = SysfsPowerSupply::new(
        config.power_supply.sysfs_root.clone(),
        config.power_supply.device.clone(),
    );

    let power_supplies = sysfs.entries().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "power supply listing unavailable");
        Vec::new()
    });
    let battery_device = sysfs.battery_device().ok();

    DoctorReport {
        os_name: std::env::consts::OS.to_string(),
        os_version: os_version(),
        kernel: kernel_version(),
        arch: std::env::consts::ARCH.to_string(),
        headless: detect_headless(),
        api_level: ctx.api_level(),
        tier: ctx.tier().unwrap_or(Tier::Legacy),
        modern_min_api_level: ctx.tier_config().modern_min_api_level,
        sysfs_root: sysfs.root().display().to_string(),
        power_supplies,
        battery_device,
    }
}

fn os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        run_cmd("sw_vers", &["-productVersion"]).unwrap_or_else(|| "unknown".into())
    }
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/etc/os-release") {
            for line in content.lines() {
                if let Some(ver) = line.strip_prefix("PRETTY_NAME=") {
                    return ver.trim_matches('"').to_string();
                }
            }
        }
        "unknown".to_string()
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        "unknown".to_string()
    }
}

fn kernel_version() -> String {
    run_cmd("uname", &["-r"]).unwrap_or_else(|| "unknown".into())
}

fn run_cmd(cmd: &str, args: &[&str]) -> Option<String> {
    std::process::Command::new(cmd)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}
