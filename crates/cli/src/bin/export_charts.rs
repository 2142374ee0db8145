use anyhow::{Context, Result, bail};
use chart_export::ChartExport;
use clap::Parser;
use dashboard_engine::DashboardEngine;
use std::path::PathBuf;
use utils::JsonDatabase;

#[derive(Parser, Debug)]
#[command(
    name = "export-charts",
    about = "Render the monthly, category and forecast PNG charts."
)]
struct Args {
    /// Path to the JSON store; requires --owner
    #[arg(short, long, requires = "owner", conflicts_with = "csv")]
    database: Option<PathBuf>,

    /// Owner whose records are charted
    #[arg(long)]
    owner: Option<String>,

    /// CSV (or JSON array) of records to chart instead of a store
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Directory receiving the PNG files
    #[arg(long)]
    out_dir: PathBuf,

    /// Settings file; ./settings.json is used when present
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    cli::init_tracing();
    let args = Args::parse();
    let settings = cli::load_cli_settings(args.settings.as_ref())?;

    let report = match (&args.database, &args.owner, &args.csv) {
        (Some(database), Some(owner), None) => {
            let engine = DashboardEngine::new(JsonDatabase::new(utils::resolve_database_path(
                database,
            )))
            .with_settings(settings.forecast.clone());
            let summary = engine
                .summarize_owner(owner)
                .with_context(|| format!("summarizing owner {}", owner))?;
            ChartExport::new(&args.out_dir).with_summary(&summary).run()?
        }
        (None, _, Some(csv)) => ChartExport::new(&args.out_dir)
            .with_records_file(csv)
            .with_forecast_settings(settings.forecast.clone())
            .run()?,
        _ => bail!("either --database with --owner, or --csv, is required"),
    };

    for path in &report.written {
        println!("Wrote {}", path.display());
    }
    for file in &report.skipped {
        println!("Skipped {} (not enough data)", file);
    }
    Ok(())
}
