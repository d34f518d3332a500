use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use flight_assistant::{AssistantConfig, Conversation, MetricsHub, SubmitOutcome};
use intent_parser::{Interpreter, RuleBasedInterpreter};
use vehicle_control::{SimulatedVehicle, VehicleControl, VehicleTelemetrySnapshot};

#[derive(Parser, Debug)]
#[command(
    name = "fa",
    version,
    about = "Natural-language flight assistant",
    disable_help_subcommand = true
)]
struct Cli {
    /// YAML configuration file (defaults apply when it is missing)
    #[arg(long, global = true, default_value = "configs/assistant.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive chat with a simulated vehicle
    Chat {
        /// Use the keyword interpreter only
        #[arg(long, action = ArgAction::SetTrue)]
        offline: bool,
    },
    /// Run one command and print the reply
    Ask {
        /// Command text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Use the keyword interpreter only
        #[arg(long, action = ArgAction::SetTrue)]
        offline: bool,
        /// Print the run's counters in Prometheus text format
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
    /// Print the vehicle telemetry snapshot as JSON
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup_tracing();

    let cli = Cli::parse();
    let config = AssistantConfig::load(&cli.config)?;
    flight_assistant::init()?;
    intent_parser::init()?;

    let vehicle = Arc::new(SimulatedVehicle::new(config.vehicle.clone()));

    match cli.command {
        Commands::Chat { offline } => {
            let hub = MetricsHub::new()?;
            let interpreter = build_interpreter(&config, offline)?;
            run_chat(interpreter, vehicle, hub).await?;
        }
        Commands::Ask {
            text,
            offline,
            metrics,
        } => {
            let interpreter = build_interpreter(&config, offline)?;
            print!("{}", run_ask(interpreter, vehicle, &text.join(" "), metrics).await?);
        }
        Commands::Status => print_status(vehicle.as_ref())?,
    }

    Ok(())
}

fn build_interpreter(config: &AssistantConfig, offline: bool) -> Result<Arc<dyn Interpreter>> {
    let rules = RuleBasedInterpreter::new(config.interpreter.clone())?;
    if offline || config.offline {
        info!("Using rule-based interpreter");
        return Ok(Arc::new(rules));
    }
    remote_interpreter(config, rules)
}

#[cfg(feature = "gemini")]
fn remote_interpreter(
    config: &AssistantConfig,
    rules: RuleBasedInterpreter,
) -> Result<Arc<dyn Interpreter>> {
    use intent_parser::gemini::GeminiClient;
    use intent_parser::RemoteInterpreter;

    let model = &config.interpreter.model;
    let client = GeminiClient::new(model, model.api_key())?;
    info!("Using {} with rule-based fallback", model.model);
    Ok(Arc::new(RemoteInterpreter::new(Arc::new(client), rules)))
}

#[cfg(not(feature = "gemini"))]
fn remote_interpreter(
    _config: &AssistantConfig,
    rules: RuleBasedInterpreter,
) -> Result<Arc<dyn Interpreter>> {
    tracing::warn!("Built without gemini support, using rule-based interpreter");
    Ok(Arc::new(rules))
}

/// Submit one command; returns the reply, the resulting telemetry and,
/// when asked, the counters of this run.
async fn run_ask(
    interpreter: Arc<dyn Interpreter>,
    vehicle: Arc<SimulatedVehicle>,
    text: &str,
    with_metrics: bool,
) -> Result<String> {
    let hub = MetricsHub::new()?;
    let conversation =
        Conversation::new(interpreter, vehicle.clone()).with_metrics(hub.assistant.clone());

    let mut out = String::new();
    if let SubmitOutcome::Replied(reply) = conversation.submit(text).await {
        out.push_str(&reply.content);
        out.push('\n');
    }
    out.push_str(&status_json(vehicle.as_ref())?);
    out.push('\n');
    if with_metrics {
        out.push_str(&hub.encode_text());
    }
    Ok(out)
}

async fn run_chat(
    interpreter: Arc<dyn Interpreter>,
    vehicle: Arc<SimulatedVehicle>,
    hub: MetricsHub,
) -> Result<()> {
    let _subscription = vehicle.subscribe(Arc::new(|s: &VehicleTelemetrySnapshot| {
        debug!(
            "telemetry: mode={} armed={} pos=({:.6}, {:.6}) alt={:.1}m batt={:.0}%",
            s.mode, s.armed, s.latitude, s.longitude, s.altitude, s.battery_percent
        );
    }));
    let conversation =
        Conversation::new(interpreter, vehicle.clone()).with_metrics(hub.assistant.clone());

    for message in conversation.transcript() {
        println!("{}", message.content);
    }
    println!("(/status, /metrics, /quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/status" => print_status(vehicle.as_ref())?,
            "/metrics" => print!("{}", hub.encode_text()),
            text => match conversation.submit(text).await {
                SubmitOutcome::Replied(reply) => println!("{}", reply.content),
                SubmitOutcome::Busy => println!("Still working on the previous command."),
                SubmitOutcome::Ignored => {}
            },
        }
    }

    info!(
        "Chat ended after {} message(s)",
        conversation.transcript().len()
    );
    Ok(())
}

fn status_json(vehicle: &dyn VehicleControl) -> Result<String> {
    let snapshot = vehicle.current_state()?;
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

fn print_status(vehicle: &dyn VehicleControl) -> Result<()> {
    println!("{}", status_json(vehicle)?);
    Ok(())
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
