//! PNG export of the dashboard charts.
//!
//! Three files are produced from a summary: monthly income vs expense bars,
//! the expense category pie and the expense trend with its forecast point.
//! A chart whose input is empty is skipped rather than drawn blank.

pub mod error;
pub mod font;
pub mod render;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use models::{ForecastSettings, Summary, SummaryReport};
use serde::Serialize;
use tracing::{debug, info};

pub use crate::error::{ChartError, Result};

pub const MONTHLY_CHART_FILE: &str = "monthly_income_expense.png";
pub const CATEGORY_CHART_FILE: &str = "category_expense_pie.png";
pub const FORECAST_CHART_FILE: &str = "expense_forecast.png";

pub const CHART_FILES: [&str; 3] = [MONTHLY_CHART_FILE, CATEGORY_CHART_FILE, FORECAST_CHART_FILE];

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExportReport {
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

impl ExportReport {
    fn new(output_dir: &Path) -> Self {
        ExportReport {
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        }
    }

    /// Records a skipped chart and removes any file left by an earlier run,
    /// so the directory only ever holds charts of the current data.
    fn skip(&mut self, file: &str, reason: &str) -> Result<()> {
        debug!(file, reason, "skipping chart");
        match fs::remove_file(self.output_dir.join(file)) {
            Ok(()) => debug!(file, "removed stale chart"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.skipped.push(file.to_string());
        Ok(())
    }
}

/// Writes every chart that has data into `output_dir`, creating it if needed.
pub fn export_charts(report: &SummaryReport, output_dir: &Path) -> Result<ExportReport> {
    fs::create_dir_all(output_dir)?;
    let mut export = ExportReport::new(output_dir);
    let data = &report.chart_data;

    if data.months.is_empty() {
        export.skip(MONTHLY_CHART_FILE, "no months")?;
    } else {
        let path = output_dir.join(MONTHLY_CHART_FILE);
        render::draw_monthly_bars(&path, data)?;
        export.written.push(path);
    }

    if data.expense_by_category.amounts.iter().any(|a| *a > 0.0) {
        let path = output_dir.join(CATEGORY_CHART_FILE);
        render::draw_category_pie(&path, &data.expense_by_category)?;
        export.written.push(path);
    } else {
        export.skip(CATEGORY_CHART_FILE, "no expense categories")?;
    }

    match &report.forecast {
        Some(forecast) => {
            let path = output_dir.join(FORECAST_CHART_FILE);
            render::draw_forecast(&path, forecast)?;
            export.written.push(path);
        }
        None => export.skip(FORECAST_CHART_FILE, "not enough expense history")?,
    }

    info!(
        dir = %output_dir.display(),
        written = export.written.len(),
        skipped = export.skipped.len(),
        "chart export finished"
    );
    Ok(export)
}

/// Builder for an export run fed either by an already computed summary or by
/// a CSV/JSON records file.
#[derive(Debug, Clone)]
pub struct ChartExport<'a> {
    output_dir: PathBuf,
    summary: Option<&'a Summary>,
    records_file: Option<PathBuf>,
    forecast: ForecastSettings,
}

impl<'a> ChartExport<'a> {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        ChartExport {
            output_dir: output_dir.as_ref().to_path_buf(),
            summary: None,
            records_file: None,
            forecast: ForecastSettings::default(),
        }
    }

    pub fn with_summary(mut self, summary: &'a Summary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_records_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.records_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_forecast_settings(mut self, settings: ForecastSettings) -> Self {
        self.forecast = settings;
        self
    }

    /// A given summary wins over a records file.
    pub fn run(self) -> Result<ExportReport> {
        if let Some(summary) = self.summary {
            return export_summary(summary, &self.output_dir);
        }

        let path = self.records_file.ok_or(ChartError::MissingInput)?;
        let raws = utils::load_records_file(&path).map_err(ChartError::Records)?;
        debug!(path = %path.display(), records = raws.len(), "loaded records for export");
        let summary = dashboard_engine::summarize(None, &raws, Utc::now(), &self.forecast);
        export_summary(&summary, &self.output_dir)
    }
}

fn export_summary(summary: &Summary, output_dir: &Path) -> Result<ExportReport> {
    match summary {
        Summary::Available(report) => export_charts(report, output_dir),
        Summary::NoData(_) => {
            fs::create_dir_all(output_dir)?;
            let mut export = ExportReport::new(output_dir);
            for file in CHART_FILES {
                export.skip(file, "no data")?;
            }
            Ok(export)
        }
    }
}
