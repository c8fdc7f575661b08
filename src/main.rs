use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use pocketciv::{
    command::{Command, CommandOutcome},
    config::RulesConfig,
    events::LogObserver,
    scenario::{Scenario, ScenarioLoader},
    snapshot::SnapshotWriter,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Turn-based territory and economy rules engine")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, global = true, default_value = "scenarios/two_rivers.yaml")]
    scenario: PathBuf,

    /// Rules file replacing the scenario's embedded rules
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Log filter (falls back to RUST_LOG, then the rules' logging level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Play the scenario's scripted orders, then end turns for N rounds
    Run {
        /// Override the number of extra rounds
        #[arg(long)]
        rounds: Option<u32>,

        /// Override snapshot interval in rounds (0 disables)
        #[arg(long)]
        snapshot_interval: Option<u32>,

        /// Directory for snapshots
        #[arg(long, default_value = "snapshots")]
        snapshot_dir: PathBuf,
    },
    /// Serve the game over HTTP for an external client
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,

        #[arg(long)]
        snapshot_interval: Option<u32>,

        #[arg(long, default_value = "snapshots")]
        snapshot_dir: PathBuf,
    },
}

fn init_tracing(cli_level: Option<&str>, rules: &RulesConfig) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&rules.logging.level)),
    };
    fmt().with_env_filter(filter).with_target(false).init();
}

fn load(cli: &Cli) -> Result<Scenario> {
    let mut scenario = ScenarioLoader::new(".").load(&cli.scenario)?;
    if let Some(path) = &cli.rules {
        scenario.rules = RulesConfig::from_yaml(path)?;
    }
    Ok(scenario)
}

fn run(scenario: Scenario, rounds: u32, snapshots: SnapshotWriter) -> Result<()> {
    let mut game = scenario
        .build_game()
        .with_context(|| format!("Failed to set up scenario '{}'", scenario.name))?;
    game.register_observer(Box::new(LogObserver));

    for order in &scenario.orders {
        let outcome = game.apply(order.player, order.command.clone());
        match &outcome {
            CommandOutcome::Rejected(reason) => {
                tracing::warn!(player = %order.player, command = ?order.command, %reason, "order rejected");
            }
            CommandOutcome::TurnEnded(report) if report.round_completed => {
                snapshots.maybe_write(&game.snapshot(), &scenario.name)?;
            }
            _ => {}
        }
    }

    let target_turn = game.turn() + rounds;
    while game.turn() < target_turn {
        let player = game.active_player();
        match game.apply(player, Command::EndTurn) {
            CommandOutcome::TurnEnded(report) if report.round_completed => {
                snapshots.maybe_write(&game.snapshot(), &scenario.name)?;
            }
            CommandOutcome::Rejected(reason) => {
                anyhow::bail!("{player} could not end the turn: {reason}");
            }
            _ => {}
        }
    }

    println!(
        "Scenario '{}' finished on turn {}.",
        scenario.name,
        game.turn()
    );
    for &player in game.players() {
        if let Some(wallet) = game.wallet(player) {
            println!(
                "  {player}: {}G (+{}) {}C (+{}), {} units",
                wallet.gold,
                wallet.gold_income,
                wallet.coal,
                wallet.coal_income,
                game.units_of(player).len()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let scenario = load(&cli)?;
    init_tracing(cli.log_level.as_deref(), &scenario.rules);

    let mode = cli.command.unwrap_or(Mode::Run {
        rounds: None,
        snapshot_interval: None,
        snapshot_dir: PathBuf::from("snapshots"),
    });
    match mode {
        Mode::Run {
            rounds,
            snapshot_interval,
            snapshot_dir,
        } => {
            let rounds = scenario.rounds(rounds);
            let interval = snapshot_interval.unwrap_or(scenario.snapshot_interval_rounds);
            let writer = SnapshotWriter::new(snapshot_dir, interval);
            tokio::task::spawn_blocking(move || run(scenario, rounds, writer)).await??;
        }
        Mode::Serve {
            host,
            port,
            snapshot_interval,
            snapshot_dir,
        } => {
            let snapshot_interval =
                snapshot_interval.unwrap_or(scenario.snapshot_interval_rounds);
            web::run(WebServerConfig {
                scenario,
                snapshot_interval,
                snapshot_dir,
                host,
                port,
            })
            .await?;
        }
    }
    Ok(())
}
