//! Opendata Ingest - bikeshare trip history ingestion tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use opendata_common::logging::{init_logging, LogConfig, LogLevel};
use opendata_ingest::config::IngestConfig;
use opendata_ingest::markets::{Market, MarketConfig};
use opendata_ingest::output;
use opendata_ingest::pipeline::MarketPipeline;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "opendata-ingest")]
#[command(author, version, about = "Bikeshare open data ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest one market's trip history into a canonical CSV
    Market {
        /// Market to ingest
        #[arg(value_enum)]
        market: Market,

        /// Keep every Nth trip row
        #[arg(short, long, default_value = "1000")]
        sample_rate: NonZeroUsize,

        /// Trip output file [default: <market name>.csv]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the deduplicated station table
        #[arg(long)]
        stations_output: Option<PathBuf>,

        /// Market definition overriding the built-in one
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Write the source tables as read, without normalizing them
        #[arg(long)]
        raw: bool,
    },

    /// Count trips per market in one year from earlier market outputs
    Totals {
        /// Year to count
        year: i32,

        /// Directory holding <market>.csv files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "totals.csv")]
        output: PathBuf,
    },

    /// List supported markets
    Markets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("opendata-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Market {
            market,
            sample_rate,
            output,
            stations_output,
            schema,
            raw,
        } => {
            let market_config = match schema {
                Some(path) => MarketConfig::from_toml_file(&path)
                    .with_context(|| format!("Failed to load market definition {}", path.display()))?,
                None => market.config(),
            };

            let output = output.unwrap_or_else(|| market_config.default_output_path());

            info!(market = %market_config.name, sample_rate = sample_rate.get(), raw, "Ingesting market");
            let config = IngestConfig::from_env()?;
            let pipeline = MarketPipeline::new(config, market_config);

            if raw {
                let result = pipeline.run_raw(sample_rate).await?;
                output::write_raw_csv(&output, &result.tables.trips)?;
                if let Some(path) = stations_output {
                    output::write_raw_csv(&path, &result.tables.stations)?;
                }
            } else {
                let result = pipeline.run(sample_rate).await?;
                output::write_trips_csv(&output, &result.trips)?;
                if let Some(path) = stations_output {
                    output::write_stations_csv(&path, &result.stations)?;
                }
            }
        },
        Command::Totals { year, dir, output } => {
            info!(year, dir = %dir.display(), "Calculating yearly totals");
            let totals = output::yearly_totals(&dir, &Market::ALL, year)?;
            output::write_totals_csv(&output, &totals)?;
        },
        Command::Markets => {
            for market in Market::ALL {
                let config = market.config();
                println!(
                    "{:<18} {:<60} {} ({})",
                    market, config.info_url, config.license_name, config.license_url
                );
            }
            return Ok(());
        },
    }

    info!("Ingestion complete");
    Ok(())
}
