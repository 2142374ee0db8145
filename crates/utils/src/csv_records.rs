use anyhow::{Context, Result};
use csv::ReaderBuilder;
use models::RawRecord;
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Loads raw records from a CSV export.
pub fn load_records_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    parse_records_csv(file).with_context(|| format!("Parsing CSV in {}", path.display()))
}

/// Parses CSV rows into raw records.
///
/// Header names are trimmed and lower-cased; every cell is kept as text so
/// the normalizer decides what is valid. Empty cells count as missing.
pub fn parse_records_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut records = Vec::new();
    for (idx, row) in rdr.records().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping CSV row {}: {}", idx + 1, e);
                continue;
            }
        };

        let mut record = RawRecord::default();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            let text = cell.to_string();
            match header.as_str() {
                "id" | "_id" => record.id = Some(text),
                "owner_id" | "email" => record.owner_id = Some(text),
                "section_id" => record.section_id = Some(text),
                "amount" => record.amount = Some(Value::String(text)),
                "type" => record.kind = Some(text),
                "category" => record.category = Some(text),
                "title" => record.title = Some(text),
                "month" | "month_label" => record.month = Some(text),
                "year" => record.year = Some(Value::String(text)),
                "date" => record.date = Some(text),
                "created_at" => record.created_at = Some(Value::String(text)),
                _ => {}
            }
        }
        records.push(record);
    }

    Ok(records)
}
