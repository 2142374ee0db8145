use anyhow::{Context, Result};
use chart_export::ChartExport;
use clap::Parser;
use dashboard_engine::DashboardEngine;
use std::{fs, path::PathBuf};
use utils::JsonDatabase;

#[derive(Parser, Debug)]
#[command(name = "summarize", about = "Print the chart data and expense forecast for one owner.")]
struct Args {
    /// Path to the JSON store (e.g., database/database.json)
    #[arg(short, long)]
    database: PathBuf,

    /// Owner whose records are summarized
    #[arg(long)]
    owner: String,

    /// Write the summary here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Also export the PNG charts into this directory
    #[arg(long)]
    charts: Option<PathBuf>,

    /// Settings file; ./settings.json is used when present
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    cli::init_tracing();
    let args = Args::parse();
    let settings = cli::load_cli_settings(args.settings.as_ref())?;

    let source = JsonDatabase::new(utils::resolve_database_path(&args.database));
    let engine = DashboardEngine::new(source).with_settings(settings.forecast.clone());
    let summary = engine
        .summarize_owner(&args.owner)
        .with_context(|| format!("summarizing owner {}", args.owner))?;

    for warning in summary_warnings(&summary) {
        tracing::warn!("{}", warning);
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };

    match &args.out {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
            println!("Summary written to {}", path.display());
        }
        None => println!("{}", json),
    }

    if let Some(dir) = &args.charts {
        let report = ChartExport::new(dir).with_summary(&summary).run()?;
        for path in &report.written {
            eprintln!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn summary_warnings(summary: &models::Summary) -> &[String] {
    match summary {
        models::Summary::Available(report) => &report.warnings,
        models::Summary::NoData(empty) => &empty.warnings,
    }
}
