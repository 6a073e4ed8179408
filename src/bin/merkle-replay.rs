//! merkle-replay - command-line viewer for Merkle authentication-path replays

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use merkle_replay::{
    compute_step, loader, Config, DemoCatalog, Outcome, PlaybackController, Player,
    ScenarioReport, StepResult,
};

#[derive(Parser)]
#[command(name = "merkle-replay")]
#[command(about = "Replay Merkle authentication-path verification step by step", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot document, overriding `data.snapshot_path`
    #[arg(short, long, global = true)]
    snapshot: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scenarios in the snapshot
    List,

    /// Print every step of a scenario and its final report
    Show {
        /// Scenario key
        key: String,
    },

    /// Auto-advance through a scenario, printing each step as it is reached
    Play {
        /// Scenario key (defaults to `data.default_scenario` or the first one)
        key: Option<String>,
        /// Milliseconds between steps
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },
}

fn main() {
    if let Err(e) = run_application() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_application() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().and_then(|p| p.to_str());
    let config = merkle_replay::init(config_path).context("failed to initialise")?;

    let snapshot = cli
        .snapshot
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.data.snapshot_path));
    let catalog = loader::load_from_path(&snapshot)
        .with_context(|| format!("failed to load snapshot {}", snapshot.display()))?;

    match &cli.command {
        Commands::List => list(&catalog, cli.json),
        Commands::Show { key } => show(&catalog, key, cli.json),
        Commands::Play { key, interval_ms } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(play(catalog, &config, key.as_deref(), *interval_ms, cli.json))
        }
    }
}

fn list(catalog: &DemoCatalog, json: bool) -> anyhow::Result<()> {
    let summaries = catalog.summaries();
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    println!("{:<24} {:<36} {:<7} {:<10} notes", "key", "label", "verify", "root_match");
    for s in summaries {
        println!(
            "{:<24} {:<36} {:<7} {:<10} {}",
            s.key,
            s.label,
            flag(s.verify),
            flag(s.root_match),
            s.notes.join("; ")
        );
    }
    Ok(())
}

fn show(catalog: &DemoCatalog, key: &str, json: bool) -> anyhow::Result<()> {
    let scenario = catalog
        .scenario(key)
        .ok_or_else(|| merkle_replay::ReplayError::scenario_not_found(key))?;
    let steps: Vec<StepResult> = (0..=scenario.max_step())
        .filter_map(|i| compute_step(scenario, i))
        .collect();
    let report = merkle_replay::scenario_report(scenario);

    if json {
        let out = serde_json::json!({ "steps": steps, "report": report });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if let Some(e) = scenario.data_error() {
        println!("{} is not replayable: {}", key, e);
    }
    for step in &steps {
        print_step(step);
    }
    print_report(&report);
    Ok(())
}

async fn play(
    catalog: DemoCatalog,
    config: &Config,
    key: Option<&str>,
    interval_ms: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = Arc::new(catalog);
    let mut controller = PlaybackController::new(Arc::clone(&catalog))?;
    if let Some(key) = key.or(config.data.default_scenario.as_deref()) {
        controller.select_scenario(key)?;
    }
    if !controller.is_interactive() {
        anyhow::bail!("scenario '{}' has no replay data", controller.scenario().key);
    }
    let interval = interval_ms
        .map(|ms| config.playback.clamp_interval(ms))
        .unwrap_or_else(|| config.playback.default_interval());

    let mut player = Player::new(controller);
    let mut steps = player.subscribe();
    emit(&player, json).await?;
    let max_step = player.view().await.max_step;
    if *steps.borrow_and_update() < max_step {
        player.play(interval).await;
        while steps.changed().await.is_ok() {
            emit(&player, json).await?;
            if *steps.borrow_and_update() >= max_step {
                break;
            }
        }
        player.wait_until_stopped().await?;
    }

    let view = player.view().await;
    match view.report {
        Some(report) if !json => print_report(&report),
        _ => {}
    }
    if view.outcome == Outcome::Failed {
        std::process::exit(2);
    }
    Ok(())
}

async fn emit(player: &Player, json: bool) -> anyhow::Result<()> {
    let view = player.view().await;
    if json {
        println!("{}", serde_json::to_string(&view)?);
    } else if let Some(step) = &view.result {
        print_step(step);
    }
    Ok(())
}

fn print_step(step: &StepResult) {
    let verdict = match step.parent_match {
        Some(true) => "match",
        Some(false) => "MISMATCH",
        None => "-",
    };
    println!(
        "step {:>2}  level {:>2}  node {:>4} ({:?})  sibling {:>4}  -> parent ({}, {})  {}",
        step.step,
        step.level,
        step.node_index,
        step.side,
        step.sibling_index,
        step.level + 1,
        step.parent_index,
        verdict
    );
    if let Some(byte) = step.parent_diff_at_byte {
        println!("          first differing byte: {}", byte);
    }
}

fn print_report(report: &ScenarioReport) {
    println!("== {} ({})", report.label, report.key);
    if let Some(note) = &report.note {
        println!("   note: {}", note);
    }
    if let Some(error) = &report.error {
        println!("   error: {}", error);
    }
    println!("   verify: {}", flag(report.verify));
    for (name, cmp) in [("leaf", &report.leaf), ("root", &report.root)] {
        if let Some(cmp) = cmp {
            print!("   {}: expected {} got {} ({})", name, cmp.expected, cmp.observed, cmp.matched);
            match cmp.diff_at_byte {
                Some(byte) => println!(", differs at byte {}", byte),
                None => println!(),
            }
        }
    }
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "-",
    }
}
