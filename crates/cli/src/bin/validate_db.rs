use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::Parser;
use serde_json::Value;
use std::{fs, path::PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "validate-db",
    about = "Report store records that will be skipped or defaulted when summarized."
)]
struct Args {
    /// Path to the JSON store (e.g., database/database.json)
    #[arg(short, long)]
    database: PathBuf,
}

fn main() -> Result<()> {
    cli::init_tracing();
    let args = Args::parse();

    let path = utils::resolve_database_path(&args.database);
    let txt = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let val: Value =
        serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))?;

    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    let report = cli::validate_database(&val, Utc::now());
    report.print(file_name);

    if report.has_errors() {
        Err(anyhow!("Validation failed"))
    } else {
        println!(
            "{} passed validation ({} warnings).",
            path.display(),
            report.warnings.len()
        );
        Ok(())
    }
}
