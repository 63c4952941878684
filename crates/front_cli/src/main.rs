//! front_sim CLI
//!
//! Feature table + trained models → per-city occupation projections.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "front_sim")]
#[command(about = "Project front-line advance and city capture day by day", long_about = None)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct Inputs {
    /// Feature table CSV (one row per city per date)
    #[arg(long)]
    data: PathBuf,

    /// Directory with front_dynamics.json, encirclement.json, capture.json
    #[arg(long)]
    models: PathBuf,

    /// CONSERVATIVE, INERTIAL, AGGRESSIVE (comma-separated) or "all"
    #[arg(long, default_value = "all")]
    scenario: String,

    /// Simulation horizon in days (overrides the config file)
    #[arg(long)]
    horizon: Option<u32>,

    /// Simulation config JSON (falls back to FRONT_SIM_CONFIG_PATH)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Simulate one city and print its trajectory
    Simulate {
        #[command(flatten)]
        inputs: Inputs,

        /// City id or name
        #[arg(long)]
        city: String,

        /// Print results as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Simulate every city in the table in parallel
    Batch {
        #[command(flatten)]
        inputs: Inputs,

        /// Restrict to these city ids or names (comma-separated)
        #[arg(long)]
        cities: Option<String>,

        /// Worker threads (0 = one per core)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Write the full JSON report here
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(feature = "cli")]
struct Prepared {
    table: front_cli::FeatureTable,
    driver: front_core::SimulationDriver,
    scenarios: Vec<front_core::Scenario>,
}

#[cfg(feature = "cli")]
fn prepare(inputs: &Inputs) -> Result<Prepared> {
    let mut config = front_cli::load_sim_config(inputs.config.as_deref())?;
    if let Some(days) = inputs.horizon {
        config = config.with_horizon(days);
    }
    let scenarios = front_cli::parse_scenarios(&inputs.scenario)?;

    let (table, stats) = front_cli::load_feature_table(&inputs.data)?;
    tracing::info!(
        rows = stats.total_rows,
        parsed = stats.parsed,
        failed = stats.failed,
        cities = table.len(),
        "loaded feature table"
    );

    let models = front_cli::load_models(&inputs.models)?;
    let driver = front_core::SimulationDriver::new(models, config)
        .context("Invalid simulation config")?;

    Ok(Prepared {
        table,
        driver,
        scenarios,
    })
}

#[cfg(feature = "cli")]
fn simulate(inputs: &Inputs, city: &str, json: bool) -> Result<()> {
    let prepared = prepare(inputs)?;
    let seed = prepared.table.latest(city)?;

    let results: Vec<_> = prepared
        .scenarios
        .iter()
        .map(|&scenario| prepared.driver.run(seed, scenario))
        .collect();

    if json {
        front_cli::render::write_json(std::io::stdout().lock(), &results)?;
    } else {
        if let Some(date) = prepared.table.seed_date(&seed.city_id) {
            println!("Seed date: {}", date);
        }
        for result in &results {
            println!("\n{}", front_cli::render::render_trajectory(result));
        }
    }

    if let Some(failed) = results.iter().find(|r| r.outcome.is_error()) {
        anyhow::bail!(
            "{} / {}: {}",
            failed.city_id(),
            failed.scenario(),
            front_cli::render::describe_outcome(&failed.outcome)
        );
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn batch(inputs: &Inputs, cities: Option<&str>, threads: usize, out: Option<&Path>) -> Result<()> {
    let prepared = prepare(inputs)?;

    let seeds = match cities {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| prepared.table.latest(c).cloned())
            .collect::<Result<Vec<_>>>()?,
        None => prepared.table.seeds(),
    };

    let runner = front_core::BatchRunner::new(prepared.driver).with_threads(threads);
    let summary = runner.run(&seeds, &prepared.scenarios)?;

    print!("{}", front_cli::render::render_summary(&summary));

    if let Some(path) = out {
        let report = front_cli::render::BatchReport::new(
            &summary,
            runner.driver().config(),
            prepared.table.last_date(),
        );
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        front_cli::render::write_json(std::io::BufWriter::new(file), &report)?;
        println!("Report saved to: {}", path.display());
    }

    for failed in summary.errored() {
        tracing::warn!(
            city = failed.city_id(),
            scenario = %failed.scenario(),
            "{}",
            front_cli::render::describe_outcome(&failed.outcome)
        );
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Simulate { inputs, city, json } => simulate(&inputs, &city, json),
        Commands::Batch {
            inputs,
            cities,
            threads,
            out,
        } => batch(&inputs, cities.as_deref(), threads, out.as_deref()),
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("front_sim CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
