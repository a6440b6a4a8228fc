//! sensorctl: main entry point
//!
//! Hexagonal architecture: adapters on the outside, the control service in
//! the middle, one synchronous control thread.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SensorHub        Lpd433Sink      LogEventSink   SystemClock   │
//! │  (SensorPort)     (ActuationSink) (EventSink)    (ClockPort)   │
//! │  CommandQueue     StateStore      TriggerStore   JsonConfig    │
//! │  (CommandPort)    (StatePort)     (Triggers)     (ConfigPort)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ControlService (pure logic)                 │    │
//! │  │  Profile · Thresholds · TriggerScheduler · Applier     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Runner (drift-free sampling loop) · ShutdownToken (signals)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use log::{info, warn};

use sensorctl::adapters::command_queue::{self, CommandQueue};
use sensorctl::adapters::config_file::JsonConfigFile;
use sensorctl::adapters::fs_storage::FsStorage;
use sensorctl::adapters::host_id;
use sensorctl::adapters::log_sink::LogEventSink;
use sensorctl::adapters::lpd433::{CommandTransmitter, DryRunTransmitter, Lpd433Sink};
use sensorctl::adapters::state_store::StateStore;
use sensorctl::adapters::time::SystemClock;
use sensorctl::adapters::trigger_store::TriggerStore;
use sensorctl::app::commands::parse_switch;
use sensorctl::app::ports::{ActuationSink, ClockPort, ConfigPort, TriggerStorePort};
use sensorctl::app::runner::{self, RunOutcome, RunPlan};
use sensorctl::app::service::{ControlService, TickPorts};
use sensorctl::config::SystemConfig;
use sensorctl::control::{ControlProfile, ControlVariable, HostProfile};
use sensorctl::sensors::file::FileSensor;
use sensorctl::sensors::{Sensor, SensorHub};
use sensorctl::shutdown::{self, ShutdownToken, WaitOutcome};
use sensorctl::trigger::ControlTrigger;

/// Conventional exit status of a process stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "sensorctl", version, about)]
struct Cli {
    /// Directory holding the config file and the `data/` tree.
    #[arg(long, env = "SENSORCTL_BASE_PATH", default_value = ".")]
    base_path: PathBuf,

    /// Override the detected hostname.
    #[arg(long, env = "SENSORCTL_HOSTNAME")]
    hostname: Option<String>,

    /// Config file (default: `<base-path>/sensorctl.json`).
    #[arg(long, env = "SENSORCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Force a control profile instead of selecting it by hostname.
    #[arg(long)]
    profile: Option<HostProfile>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sample and control for one run.
    Run {
        /// Start immediately instead of at the next run boundary.
        #[arg(long)]
        now: bool,
        /// Accept `<variable> <on|off> [hold_seconds]` lines on stdin.
        #[arg(long)]
        stdin_commands: bool,
        /// File or FIFO with commands decoded by an RF receiver; these are
        /// dropped while the variable's ignore window runs.
        #[arg(long)]
        radio_commands: Option<PathBuf>,
        /// Program that transmits LPD433 codes; without it codes are only logged.
        #[arg(long)]
        transmitter: Option<PathBuf>,
    },
    /// Manage scheduled triggers.
    Trigger {
        #[command(subcommand)]
        action: TriggerCommand,
    },
    /// Print the effective configuration as JSON.
    PrintConfig,
}

#[derive(Debug, Subcommand)]
enum TriggerCommand {
    /// Create or replace a trigger.
    Add {
        name: String,
        variable: ControlVariable,
        /// `on` or `off`.
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
        to: bool,
        /// RFC 3339 instant, or `HH:MM[:SS]` (UTC, today).
        time: String,
        /// Repeat every day at the same UTC time.
        #[arg(long)]
        daily: bool,
        /// Dwell time after firing, in seconds.
        #[arg(long)]
        hold_time: Option<f32>,
    },
    /// List stored triggers.
    List,
    /// Remove a trigger by name.
    Remove { name: String },
}

/// Everything derived from the global options.
struct Host {
    name: String,
    profile: HostProfile,
    data_dir: PathBuf,
    config_path: PathBuf,
}

impl Host {
    fn resolve(cli: &Cli) -> Self {
        let name = cli
            .hostname
            .as_deref()
            .map_or_else(host_id::read_hostname, host_id::sanitize);
        let profile = cli
            .profile
            .unwrap_or_else(|| HostProfile::from_hostname(&name));
        Self {
            profile,
            data_dir: cli.base_path.join("data"),
            config_path: cli
                .config
                .clone()
                .unwrap_or_else(|| cli.base_path.join("sensorctl.json")),
            name,
        }
    }

    fn load_config(&self) -> Result<SystemConfig> {
        JsonConfigFile::new(&self.config_path)
            .load()
            .with_context(|| format!("loading {}", self.config_path.display()))
    }
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let host = Host::resolve(&cli);

    match cli.command {
        Command::Run {
            now,
            stdin_commands,
            radio_commands,
            transmitter,
        } => run(
            &host,
            now,
            stdin_commands,
            radio_commands.as_deref(),
            transmitter.as_deref(),
        ),
        Command::Trigger { action } => {
            trigger(&host, action)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::PrintConfig => {
            let config = host.load_config()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(
    host: &Host,
    now: bool,
    stdin_commands: bool,
    radio_commands: Option<&Path>,
    transmitter: Option<&Path>,
) -> Result<ExitCode> {
    info!("sensorctl v{} on {} ({})", env!("CARGO_PKG_VERSION"), host.name, host.profile);

    let token = ShutdownToken::new();
    shutdown::install_signal_handlers(&token).context("installing signal handlers")?;

    let config = host.load_config()?;
    let profile = host
        .profile
        .build()
        .with_context(|| format!("building profile {}", host.profile))?;

    // ── Adapters ─────────────────────────────────────────────
    let mut actuator: Box<dyn ActuationSink> = match transmitter {
        Some(program) => Box::new(Lpd433Sink::new(profile.params(), CommandTransmitter::new(program))),
        None => {
            warn!("No --transmitter given, LPD433 codes are only logged");
            Box::new(Lpd433Sink::new(profile.params(), DryRunTransmitter))
        }
    };
    let mut sensors = SensorHub::new(
        config
            .sensor_files
            .iter()
            .map(|c| Box::new(FileSensor::from_config(c)) as Box<dyn Sensor>)
            .collect(),
    );
    let mut commands = if stdin_commands || radio_commands.is_some() {
        let (tx, queue) = CommandQueue::channel();
        if stdin_commands {
            command_queue::spawn_stdin_reader(tx.clone()).context("starting stdin reader")?;
        }
        if let Some(path) = radio_commands {
            command_queue::spawn_radio_reader(path, tx).context("starting radio command reader")?;
        }
        queue
    } else {
        CommandQueue::empty()
    };
    let mut events = LogEventSink::new();
    let clock = SystemClock::new();
    let mut state_store = StateStore::new(
        FsStorage::new(&host.data_dir),
        &host.name,
        profile.schema_fingerprint(),
    );
    let triggers = TriggerStore::new(FsStorage::new(&host.data_dir), &host.name).load_all();

    // ── Run ──────────────────────────────────────────────────
    let run_start = if now {
        clock.now()
    } else {
        runner::next_run_start(clock.now(), config.run_duration())
    };
    let plan = RunPlan::from_config(&config, run_start);
    let mut service = ControlService::new(profile, config, &mut state_store);
    service.start(run_start, &triggers, &mut events);

    let outcome = if !now && runner::wait_for_start(&plan, &clock, &token) == WaitOutcome::Cancelled {
        RunOutcome::Interrupted
    } else {
        let mut ports = TickPorts {
            sensors: &mut sensors,
            commands: &mut commands,
            actuator: actuator.as_mut(),
            events: &mut events,
        };
        runner::run(&mut service, &plan, &clock, &token, &mut ports)
    };

    let interrupted = outcome == RunOutcome::Interrupted;
    service.finish(&mut state_store, interrupted, &mut events);
    Ok(if interrupted {
        ExitCode::from(EXIT_INTERRUPTED)
    } else {
        ExitCode::SUCCESS
    })
}

fn trigger(host: &Host, action: TriggerCommand) -> Result<()> {
    let mut store = TriggerStore::new(FsStorage::new(&host.data_dir), &host.name);
    match action {
        TriggerCommand::Add {
            name,
            variable,
            to,
            time,
            daily,
            hold_time,
        } => {
            let trigger = ControlTrigger {
                time: parse_trigger_time(&time, Utc::now())?,
                name,
                variable,
                to,
                daily,
                hold_time,
            };
            store
                .put(&trigger)
                .with_context(|| format!("saving trigger '{}'", trigger.name))?;
            info!("Trigger '{}' saved", trigger.name);
        }
        TriggerCommand::List => {
            for t in store.load_all() {
                let when = if t.daily {
                    format!("daily {}", t.time.format("%H:%M:%S"))
                } else {
                    t.time.to_rfc3339()
                };
                let hold = t.hold_time.map(|h| format!(" hold={h}s")).unwrap_or_default();
                println!(
                    "{}\t{} {}\t{}{}",
                    t.name,
                    t.variable,
                    if t.to { "on" } else { "off" },
                    when,
                    hold
                );
            }
        }
        TriggerCommand::Remove { name } => {
            if !store.remove(&name).with_context(|| format!("removing '{name}'"))? {
                bail!("no trigger named '{name}'");
            }
            info!("Trigger '{}' removed", name);
        }
    }
    Ok(())
}

/// RFC 3339, or a UTC time of day placed on `today`'s date.
fn parse_trigger_time(s: &str, today: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let tod = NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .with_context(|| format!("invalid trigger time \"{s}\""))?;
    Ok(today.date_naive().and_time(tod).and_utc())
}
