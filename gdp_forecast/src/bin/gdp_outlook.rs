//! # gdp_outlook
//!
//! Command-line entry point for the GDP growth forecasting pipeline.

use clap::{Parser, Subcommand};
use gdp_forecast::artifacts::write_forecasts;
use gdp_forecast::bundle::ResultBundle;
use gdp_forecast::config::PipelineConfig;
use gdp_forecast::data::PanelLoader;
use gdp_forecast::pipeline::{Pipeline, PipelineOutput};
use gdp_forecast::synthetic::SyntheticPanel;
use gdp_forecast::Result;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gdp_outlook")]
#[command(about = "Per-country GDP growth forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline on an indicator panel CSV
    Run {
        /// Wide indicator panel (one column per year)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON configuration; absent keys keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory receiving the artifacts
        #[arg(short, long, default_value = "output")]
        out_dir: PathBuf,

        /// Target country (repeatable); overrides the configured list
        #[arg(long = "country")]
        countries: Vec<String>,

        /// Years forecast past the test window
        #[arg(long)]
        horizon: Option<usize>,
    },

    /// Run the pipeline on a seeded synthetic panel
    Demo {
        /// Directory receiving the artifacts
        #[arg(short, long, default_value = "output")]
        out_dir: PathBuf,

        /// Random seed of the synthetic panel
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Print the metrics stored in a result bundle
    Metrics {
        /// Result bundle JSON
        #[arg(short, long)]
        bundle: PathBuf,
    },

    /// Write one country's forecast timeline as CSV
    Export {
        /// Result bundle JSON
        #[arg(short, long)]
        bundle: PathBuf,

        /// Country to export
        #[arg(short, long)]
        country: String,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn report(output: &PipelineOutput) {
    for metrics in output.bundle.metrics.values() {
        print!("{}", metrics);
    }
    for (country, reason) in &output.failures {
        eprintln!("Forecast failed for {}: {}", country, reason);
    }
}

fn run_pipeline(
    input: &Path,
    config: Option<&Path>,
    out_dir: &Path,
    countries: Vec<String>,
    horizon: Option<usize>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if !countries.is_empty() {
        config.countries = countries;
    }
    if let Some(horizon) = horizon {
        config.horizon_years = horizon;
    }

    let pipeline = Pipeline::new(config)?;
    let panel = PanelLoader::from_csv(input, &pipeline.config().schema)?;
    let output = pipeline.run_to_dir(&panel, out_dir)?;
    report(&output);
    Ok(())
}

fn run_demo(out_dir: &Path, seed: u64) -> Result<()> {
    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let panel = SyntheticPanel::with_seed(seed).generate(pipeline.config())?;
    info!(seed, rows = panel.len(), "generated synthetic panel");

    let output = pipeline.run_to_dir(&panel, out_dir)?;
    report(&output);
    Ok(())
}

fn show_metrics(bundle: &Path) -> Result<()> {
    let bundle = ResultBundle::load(bundle)?;
    for metrics in bundle.metrics.values() {
        print!("{}", metrics);
    }
    Ok(())
}

fn export_country(bundle: &Path, country: &str, output: &Path) -> Result<()> {
    let bundle = ResultBundle::load(bundle)?;
    let records = bundle.forecasts_for(country)?;
    write_forecasts(output, records)?;
    println!("Wrote {} records for {} to {}", records.len(), country, output.display());
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            config,
            out_dir,
            countries,
            horizon,
        } => run_pipeline(&input, config.as_deref(), &out_dir, countries, horizon),
        Commands::Demo { out_dir, seed } => run_demo(&out_dir, seed),
        Commands::Metrics { bundle } => show_metrics(&bundle),
        Commands::Export {
            bundle,
            country,
            output,
        } => export_country(&bundle, &country, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
