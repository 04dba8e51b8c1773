//! One-shot NetCDF to Parquet conversion.
//!
//! Reads the source URLs and output path from the environment, runs the
//! crosswalk conversion pipeline and writes a single Parquet file. Any
//! failure exits non-zero before output is written.

mod config;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ConvertConfig;
use crosswalk::{convert_nc, write_parquet};

#[derive(Parser, Debug)]
#[command(name = "nc2parquet")]
#[command(about = "Convert NWM NetCDF output to a crosswalked Parquet file")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ConvertConfig::from_env()?;
    info!(
        nc_url = %config.nc_url,
        gpkg_url = %config.gpkg_url,
        output = %config.output_path.display(),
        "Starting conversion"
    );

    let merged = convert_nc(&config.nc_url, &config.gpkg_url, &config.xwalk).await?;
    write_parquet(&merged, &config.output_path)?;

    info!(rows = merged.num_rows(), "Conversion finished");
    Ok(())
}
