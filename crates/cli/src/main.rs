//! `gaugectl` – headless host for the battery gauge channel.
//!
//! Runs the same engine the embedding application talks to, but from a
//! terminal: one-shot calls, diagnostics, scripted scenarios and a socket
//! daemon.

mod logging;
mod serve;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use engine::config::{load_config, GaugeConfig};
use engine::platform::FixedPowerSupply;
use engine::types::*;
use engine::{reply_pair, AppContext, QueryDispatcher, ResponseChannel};
use std::path::{Path, PathBuf};
use std::time::Instant;

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(
    name = "gaugectl",
    version,
    about = "Host and test harness for the battery gauge channel"
)]
struct Cli {
    /// Configuration file (defaults to ./gauge_config.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    host: HostArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Default)]
struct HostArgs {
    /// Override the host platform API level.
    #[arg(long, global = true)]
    api_level: Option<u32>,
    /// Simulated capacity property (switches to a simulated host).
    #[arg(long, global = true, allow_hyphen_values = true)]
    simulate_capacity: Option<i32>,
    /// Simulated broadcast level (switches to a simulated host).
    #[arg(long, global = true, allow_hyphen_values = true)]
    simulate_level: Option<i32>,
    /// Simulated broadcast scale (switches to a simulated host).
    #[arg(long, global = true, allow_hyphen_values = true)]
    simulate_scale: Option<i32>,
}

impl HostArgs {
    fn simulated(&self) -> Option<FixedPowerSupply> {
        if self.simulate_capacity.is_none()
            && self.simulate_level.is_none()
            && self.simulate_scale.is_none()
        {
            return None;
        }
        Some(FixedPowerSupply {
            capacity: self.simulate_capacity,
            level: self.simulate_level,
            scale: self.simulate_scale,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request through the channel.
    Call {
        /// Method name.
        #[arg(default_value = GET_BATTERY_LEVEL)]
        method: String,
        /// JSON arguments for the request.
        #[arg(long)]
        args: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report host and power-supply facts.
    Doctor {
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
        /// Write the report JSON to this path.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run a scripted scenario from a YAML file.
    RunScenario {
        /// Path to the scenario YAML file.
        file: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer line-delimited JSON requests on a Unix socket.
    Serve {
        /// Path for the Unix domain socket.
        #[arg(long)]
        socket: PathBuf,
    },
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init_logging(&config.logging);

    let ctx = build_context(&config, &cli.host);

    match cli.command {
        Commands::Call { method, args, json } => {
            let code = cmd_call(&config, &ctx, method, args.as_deref(), json).await?;
            std::process::exit(code);
        }
        Commands::Doctor { json, out } => cmd_doctor(&config, &ctx, json, out),
        Commands::RunScenario { file, json } => {
            let code = cmd_run_scenario(&config, &ctx, &file, json).await?;
            std::process::exit(code);
        }
        Commands::Serve { socket } => serve::run_daemon(socket, &config, &ctx).await,
    }
}

fn build_context(config: &GaugeConfig, host: &HostArgs) -> AppContext {
    let api_level = host.api_level.or(config.host.api_level);
    match host.simulated() {
        Some(power) => AppContext::new(Box::new(power), api_level, config.tier),
        None => {
            let mut config = config.clone();
            config.host.api_level = api_level;
            AppContext::from_config(&config)
        }
    }
}

// ===========================================================================
// Subcommand implementations
// ===========================================================================

async fn cmd_call(
    config: &GaugeConfig,
    ctx: &AppContext,
    method: String,
    args: Option<&str>,
    json: bool,
) -> Result<i32> {
    let arguments = args
        .map(|s| serde_json::from_str::<serde_json::Value>(s))
        .transpose()
        .context("invalid JSON args")?;
    let req = RequestEnvelope { method, arguments };

    let start = Instant::now();
    let dispatcher = QueryDispatcher::new();
    let channel = ResponseChannel::new(config.channel.name.clone(), &dispatcher, ctx);
    let (reply, rx) = reply_pair();
    channel.handle_envelope(&req, reply);
    let response = rx.await.context("channel dropped the reply")?;

    let record = CallRecord {
        run_id: new_run_id(),
        channel: channel.name().to_string(),
        method: req.method,
        response,
        timing_ms: start.elapsed().as_millis() as u64,
        env_summary: EnvSummary::default(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_human(&record);
    }

    Ok(exit_code(&record.response))
}

fn cmd_doctor(config: &GaugeConfig, ctx: &AppContext, json: bool, out: Option<PathBuf>) -> Result<()> {
    let report = engine::doctor::run_doctor(config, ctx);
    let j = serde_json::to_string_pretty(&report)?;
    if let Some(ref path) = out {
        std::fs::write(path, &j)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    if json {
        println!("{}", j);
        return Ok(());
    }

    println!("os:       {} {} ({})", report.os_name, report.os_version, report.arch);
    println!("kernel:   {}", report.kernel);
    println!("headless: {}", report.headless);
    println!(
        "tier:     {} (api level {}, modern from {})",
        report.tier,
        report
            .api_level
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unset".into()),
        report.modern_min_api_level
    );
    println!("sysfs:    {}", report.sysfs_root);
    for entry in &report.power_supplies {
        println!("  {}: {}", entry.name, entry.kind);
    }
    println!(
        "battery:  {}",
        report.battery_device.as_deref().unwrap_or("none")
    );
    Ok(())
}

async fn cmd_run_scenario(
    config: &GaugeConfig,
    ctx: &AppContext,
    file: &Path,
    json: bool,
) -> Result<i32> {
    let yaml = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read scenario file {}", file.display()))?;
    let scenario = engine::scenario::load_scenario(&yaml).map_err(anyhow::Error::msg)?;
    let result = engine::scenario::run_scenario(&scenario, &config.channel.name, ctx).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Scenario: {}", result.name.as_deref().unwrap_or("<unnamed>"));
        println!("Overall: {:?}", result.overall_status);
        for (i, step) in result.step_results.iter().enumerate() {
            println!(
                "  Step {}: {} -> {} ({:?})",
                i,
                step.call,
                step.response.kind(),
                step.status
            );
        }
    }

    Ok(match result.overall_status {
        engine::scenario::Status::Pass => 0,
        engine::scenario::Status::Fail => 1,
    })
}

// ===========================================================================
// Output helpers
// ===========================================================================

fn exit_code(response: &ResponseEnvelope) -> i32 {
    match response {
        ResponseEnvelope::Ok { .. } => 0,
        ResponseEnvelope::NotImplemented => 1,
        ResponseEnvelope::Error { .. } => 2,
    }
}

fn print_human(r: &CallRecord) {
    match &r.response {
        ResponseEnvelope::Ok { value } => println!("[OK] {} {} = {}", r.channel, r.method, value),
        ResponseEnvelope::Error { code, message, .. } => {
            println!("[ERROR] {} {}: {} – {}", r.channel, r.method, code, message)
        }
        ResponseEnvelope::NotImplemented => {
            println!("[NOT IMPLEMENTED] {} {}", r.channel, r.method)
        }
    }
    println!("  run_id: {}", r.run_id);
    println!("  timing: {}ms", r.timing_ms);
    println!(
        "  env: os={} arch={} headless={}",
        r.env_summary.os, r.env_summary.arch, r.env_summary.headless
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_call_with_simulation() {
        let cli = Cli::try_parse_from([
            "gaugectl",
            "call",
            "--api-level",
            "29",
            "--simulate-capacity",
            "-1",
        ])
        .unwrap();
        assert_eq!(cli.host.api_level, Some(29));
        assert_eq!(cli.host.simulate_capacity, Some(-1));
        match cli.command {
            Commands::Call { method, .. } => assert_eq!(method, GET_BATTERY_LEVEL),
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn test_build_context_prefers_flag_api_level() {
        let mut config = GaugeConfig::default();
        config.host.api_level = Some(19);
        let host = HostArgs {
            api_level: Some(29),
            simulate_capacity: Some(73),
            ..HostArgs::default()
        };
        let ctx = build_context(&config, &host);
        assert_eq!(ctx.tier(), Some(Tier::Modern));
    }

    #[test]
    fn test_host_args_without_simulation() {
        assert!(HostArgs::default().simulated().is_none());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&ResponseEnvelope::Ok { value: 1.into() }), 0);
        assert_eq!(exit_code(&ResponseEnvelope::NotImplemented), 1);
        assert_eq!(exit_code(&ResponseEnvelope::unavailable()), 2);
    }
}
