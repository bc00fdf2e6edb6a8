//! Bluff Analysis CLI
//!
//! Loads tournament game logs, prints reports, exports CSV tables and
//! renders SVG figures.

use anyhow::{bail, Context, Result};
use bluff_core::analysis::metrics::{calculate_all_stats, compare_experiments};
use bluff_core::analysis::tables::{game_summary_rows, turn_rows};
use bluff_core::data::{game_counts_by_experiment, load_game_logs, unique_models};
use bluff_core::export::{
    export_experiment_comparison, export_game_summary, export_player_stats, export_turns,
};
use bluff_core::models::{ExperimentId, GameLog, EXPERIMENT_IDS};
use bluff_core::plot::generate_all_plots;
use bluff_core::report::{statistical_report, summary_report};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bluff_cli")]
#[command(version = bluff_core::VERSION)]
#[command(about = "Analyze LLM bluffing-game tournament logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export flat CSV tables from game logs
    Analyze {
        /// Directory of game log JSON files
        #[arg(long, default_value = "logs/games")]
        logs_dir: PathBuf,

        /// Restrict to one experiment (1, 2 or 3)
        #[arg(long)]
        experiment: Option<u8>,

        /// Output directory for CSV files
        #[arg(long, default_value = "logs/csv")]
        output_dir: PathBuf,
    },

    /// Print summary and statistical reports
    Stats {
        /// Directory of game log JSON files
        #[arg(long, default_value = "logs/games")]
        logs_dir: PathBuf,
    },

    /// Render SVG figures from game logs
    Plots {
        /// Directory of game log JSON files
        #[arg(long, default_value = "logs/games")]
        logs_dir: PathBuf,

        /// Output directory for SVG files
        #[arg(long, default_value = "results/figures")]
        output_dir: PathBuf,
    },
}

fn parse_experiment(raw: Option<u8>) -> Result<Option<ExperimentId>> {
    raw.map(|n| {
        ExperimentId::try_from(n).map_err(|e| anyhow::anyhow!("invalid --experiment: {}", e))
    })
    .transpose()
}

fn load_games(logs_dir: &Path, experiment: Option<ExperimentId>) -> Result<Vec<GameLog>> {
    let games = load_game_logs(logs_dir, experiment)
        .with_context(|| format!("failed to load game logs from {}", logs_dir.display()))?;
    if games.is_empty() {
        bail!("no game logs found in {}", logs_dir.display());
    }
    Ok(games)
}

fn split_by_experiment(games: &[GameLog]) -> BTreeMap<ExperimentId, Vec<GameLog>> {
    let mut split: BTreeMap<ExperimentId, Vec<GameLog>> = BTreeMap::new();
    for game in games {
        split.entry(game.experiment_id).or_default().push(game.clone());
    }
    split
}

fn run_analyze(
    logs_dir: PathBuf,
    experiment: Option<ExperimentId>,
    output_dir: PathBuf,
) -> Result<()> {
    let games = load_games(&logs_dir, experiment)?;
    let models = unique_models(&games);
    println!("Loaded {} games ({} models)", games.len(), models.len());

    let all_stats = calculate_all_stats(&models, &games, experiment);
    println!("{}", summary_report(&all_stats));

    let turns = turn_rows(&games);
    let turns_path = export_turns(&turns, &output_dir)?;
    println!("Wrote {} ({} turns)", turns_path.display(), turns.len());

    let summaries = game_summary_rows(&games);
    let summary_path = export_game_summary(&summaries, &output_dir)?;
    println!("Wrote {}", summary_path.display());

    if experiment.is_none() {
        let path = export_player_stats(&all_stats, None, &output_dir)?;
        println!("Wrote {}", path.display());
    }

    let split = split_by_experiment(&games);
    for (exp, exp_games) in &split {
        let stats = calculate_all_stats(&models, exp_games, Some(*exp));
        let path = export_player_stats(&stats, Some(*exp), &output_dir)?;
        println!("Wrote {}", path.display());
    }

    if let (Some(exp1), Some(exp2)) = (
        split.get(&ExperimentId::FullRules),
        split.get(&ExperimentId::AsymmetricHonesty),
    ) {
        let in_both = |m: &String| {
            exp1.iter().any(|g| g.seat_of(m).is_some())
                && exp2.iter().any(|g| g.seat_of(m).is_some())
        };
        let comparisons: Vec<_> = models
            .iter()
            .filter(|m| in_both(m))
            .map(|m| compare_experiments(m, exp1, exp2))
            .collect();
        let path = export_experiment_comparison(&comparisons, &output_dir)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn run_stats(logs_dir: PathBuf) -> Result<()> {
    let games = load_games(&logs_dir, None)?;
    let models = unique_models(&games);

    let counts = game_counts_by_experiment(&games);
    for exp in EXPERIMENT_IDS {
        println!("Experiment {}: {} games", exp.as_u8(), counts[&exp]);
    }
    println!();

    let all_stats = calculate_all_stats(&models, &games, None);
    println!("{}", summary_report(&all_stats));

    let split = split_by_experiment(&games);
    let per_experiment: BTreeMap<ExperimentId, _> = split
        .iter()
        .map(|(exp, exp_games)| (*exp, calculate_all_stats(&models, exp_games, Some(*exp))))
        .collect();

    let turns = turn_rows(&games);
    println!(
        "{}",
        statistical_report(
            per_experiment.get(&ExperimentId::FullRules),
            per_experiment.get(&ExperimentId::AsymmetricHonesty),
            per_experiment.get(&ExperimentId::HonestyInstruction),
            &turns,
        )
    );

    Ok(())
}

fn run_plots(logs_dir: PathBuf, output_dir: PathBuf) -> Result<()> {
    let games = load_games(&logs_dir, None)?;
    println!("Loaded {} games", games.len());

    let written = generate_all_plots(&games, &output_dir)
        .with_context(|| format!("failed to write figures to {}", output_dir.display()))?;
    for path in &written {
        println!("Wrote {}", path.display());
    }
    println!("{} figures written", written.len());

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            logs_dir,
            experiment,
            output_dir,
        } => {
            let experiment = parse_experiment(experiment)?;
            run_analyze(logs_dir, experiment, output_dir)
        }
        Commands::Stats { logs_dir } => run_stats(logs_dir),
        Commands::Plots {
            logs_dir,
            output_dir,
        } => run_plots(logs_dir, output_dir),
    }
}
