use chrono::{DateTime, Utc};
use data_normalization::{normalize_records, NormalizedBatch};
use models::{ChartData, EmptySummary, ForecastSettings, RawRecord, Summary, SummaryReport};
use tracing::debug;

use crate::aggregation::aggregate;
use crate::forecast::forecast_expenses;

/// Normalizes, aggregates and forecasts one owner's raw records.
pub fn summarize(
    owner_id: Option<&str>,
    raws: &[RawRecord],
    now: DateTime<Utc>,
    settings: &ForecastSettings,
) -> Summary {
    let batch = normalize_records(raws, now);
    summarize_batch(owner_id, batch, now, settings)
}

/// Assembles the summary from an already normalized batch.
///
/// A batch with no countable records yields `Summary::NoData`, which callers
/// can tell apart from a populated summary whose forecast is missing.
pub fn summarize_batch(
    owner_id: Option<&str>,
    batch: NormalizedBatch,
    now: DateTime<Utc>,
    settings: &ForecastSettings,
) -> Summary {
    let generated_at = now.to_rfc3339();
    let owner_id = owner_id.map(str::to_string);

    if batch.is_empty() {
        debug!(owner = ?owner_id, "no countable records");
        return Summary::NoData(EmptySummary {
            generated_at,
            owner_id,
            warnings: batch.warnings,
        });
    }

    let agg = aggregate(&batch.records);
    let forecast = forecast_expenses(&agg, settings);

    Summary::Available(SummaryReport {
        generated_at,
        owner_id,
        record_count: batch.records.len(),
        chart_data: ChartData::from(&agg),
        forecast,
        warnings: batch.warnings,
    })
}
