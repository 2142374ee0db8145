pub mod period;

use chrono::{DateTime, Utc};
use models::*;
use serde_json::Value;
use tracing::debug;

pub use period::{parse_date, parse_month_label, parse_timestamp, parse_year, resolve_period};

pub const DEFAULT_CATEGORY: &str = "Other";

/// Result of normalizing a batch of raw records
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Records with a strictly positive amount, in input order
    pub records: Vec<TransactionRecord>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl NormalizedBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Coerces a raw amount to `f64`. Anything that is not a finite number (or a
/// string holding one) becomes `0.0`.
pub fn coerce_amount(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Anything other than `income` (case-insensitive) is an expense.
pub fn normalize_kind(kind: Option<&str>) -> TransactionType {
    match kind.map(|k| k.trim().to_lowercase()).as_deref() {
        Some("income") => TransactionType::Income,
        _ => TransactionType::Expense,
    }
}

/// Category resolution order: explicit category, then title, then `Other`.
pub fn resolve_category(category: Option<&str>, title: Option<&str>) -> String {
    [category, title]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string()
}

/// Picks the record timestamp: `date`, then `created_at`, then `now`.
pub fn resolve_timestamp(raw: &RawRecord, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.date
        .as_deref()
        .and_then(parse_date)
        .or_else(|| raw.created_at.as_ref().and_then(parse_timestamp))
        .unwrap_or(now)
}

/// Normalizes a single record. Never fails; the result may carry a zero amount.
pub fn normalize_record(raw: &RawRecord, now: DateTime<Utc>) -> TransactionRecord {
    let created_at = resolve_timestamp(raw, now);
    TransactionRecord {
        owner_id: raw.owner_id.clone().unwrap_or_default(),
        amount: coerce_amount(raw.amount.as_ref()),
        kind: normalize_kind(raw.kind.as_deref()),
        category: resolve_category(raw.category.as_deref(), raw.title.as_deref()),
        period: resolve_period(raw.month.as_deref(), raw.year.as_ref(), created_at),
        created_at,
    }
}

fn describe(raw: &RawRecord, idx: usize) -> String {
    match raw.id.as_deref().or(raw.title.as_deref()) {
        Some(name) => format!("record {} ('{}')", idx, name),
        None => format!("record {}", idx),
    }
}

/// Normalizes a batch, dropping records whose amount is not strictly positive.
/// Problems are reported as warnings; the batch itself never fails.
pub fn normalize_records(raws: &[RawRecord], now: DateTime<Utc>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (idx, raw) in raws.iter().enumerate() {
        let record = normalize_record(raw, now);

        if !record.is_countable() {
            let shown = raw
                .amount
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "missing".to_string());
            batch.warnings.push(format!(
                "{} has non-positive or invalid amount {}; skipped",
                describe(raw, idx),
                shown
            ));
            batch.skipped += 1;
            continue;
        }

        if let MonthKey::Unparsed { label } = &record.period {
            batch.warnings.push(format!(
                "{} has unrecognized month/year '{}'; placed after dated months",
                describe(raw, idx),
                label
            ));
        }

        batch.records.push(record);
    }

    debug!(
        total = raws.len(),
        kept = batch.records.len(),
        skipped = batch.skipped,
        "normalized record batch"
    );
    batch
}
