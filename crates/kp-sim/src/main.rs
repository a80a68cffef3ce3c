//! Kokopot batch simulator
//!
//! Usage:
//!   kp-sim draws --spins 1000000         - Symbol and payout statistics
//!   kp-sim sessions --games 100000       - Final score distribution
//!
//! Common flags: --seed, --variant, --config <file.json|yaml>, --json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kp_engine::{EngineConfig, RuleVariant, Symbol};
use kp_sim::{DrawReport, SessionReport, simulate_draws, simulate_sessions};

#[derive(Parser)]
#[command(name = "kp-sim", about = "Kokopot spin simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RNG seed
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    /// Rule variant (overrides the config file)
    #[arg(long, global = true, value_enum)]
    variant: Option<VariantArg>,

    /// Engine config file (.json, .yaml, .yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads (defaults to the CPU count)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw and score windows without a session
    Draws {
        /// Number of spins
        #[arg(short, long, default_value_t = 1_000_000)]
        spins: u64,
    },
    /// Play complete games
    Sessions {
        /// Number of games
        #[arg(short, long, default_value_t = 100_000)]
        games: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    /// Independent reels with wilds and partial pays
    Independent,
    /// One symbol on all three reels
    Triple,
}

impl From<VariantArg> for RuleVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Independent => RuleVariant::IndependentReels,
            VariantArg::Triple => RuleVariant::GuaranteedTriple,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let threads = cli.threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build thread pool")?;
    log::debug!("Using {threads} worker thread(s)");

    match cli.command {
        Commands::Draws { spins } => {
            let report = pool.install(|| simulate_draws(&config, spins, cli.seed))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_draws(&report);
            }
        }
        Commands::Sessions { games } => {
            let report = pool.install(|| simulate_sessions(&config, games, cli.seed))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_sessions(&report);
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::for_variant(cli.variant.map(Into::into).unwrap_or_default()),
    };
    if let Some(variant) = cli.variant {
        config.variant = variant.into();
    }
    Ok(config)
}

fn print_draws(report: &DrawReport) {
    println!(
        "=== {} ({:?}): {} spins, seed {} ===",
        report.config_name, report.variant, report.spins, report.seed
    );

    println!("\nSymbols per reel:");
    for symbol in Symbol::DRAW_ORDER {
        let observed = report.symbol_frequency.get(&symbol).copied().unwrap_or(0.0);
        let expected = report.expected_frequency.get(&symbol).copied().unwrap_or(0.0);
        println!(
            "  {:<8} {:>6.2}%  (expected {:>6.2}%)",
            symbol.name(),
            observed * 100.0,
            expected * 100.0
        );
    }

    println!("\nOutcomes:");
    for (points, count) in &report.outcomes {
        let share = *count as f64 / report.spins as f64 * 100.0;
        println!("  {:>+5}  {:>6.2}%  ({count})", points, share);
    }

    println!("\nHit rate:        {:>6.2}%", report.hit_rate * 100.0);
    println!("Average points:  {:>6.2}", report.average_points);
    println!("Jackpot (7x3):   {:>6.2}% per spin", report.jackpot_rate * 100.0);
    println!("                 {:>6.2}% per game", report.jackpot_per_game * 100.0);
}

fn print_sessions(report: &SessionReport) {
    println!(
        "=== {} ({:?}): {} games, seed {} ===",
        report.config_name, report.variant, report.games, report.seed
    );
    println!("Final score:     mean {:.1}, min {}, max {}", report.mean_score, report.min_score, report.max_score);
    println!("Spins per game:  {:.2}", report.average_spins);
    println!("Free spins:      {:.2} per game", report.average_free_spins);
    println!("Free-spin cap:   {:.2}% of games", report.free_spin_cap_rate * 100.0);
}
