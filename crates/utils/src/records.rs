use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dashboard_engine::RecordSource;
use data_normalization::parse_timestamp;
use models::{RawRecord, Section};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::csv_records::load_records_csv;
use crate::database::{database_from_value, read_database_if_exists, records_from_values, Database};

/// Entries belonging to `owner_id`: either tagged with the owner directly or
/// filed under one of the owner's sections.
pub fn records_for_owner(database: &Database, owner_id: &str) -> Vec<RawRecord> {
    let owned_sections: HashSet<&str> = database
        .sections
        .iter()
        .filter(|s| s.owner_id == owner_id)
        .map(|s| s.id.as_str())
        .collect();

    let mut records: Vec<RawRecord> = database
        .entries
        .iter()
        .filter(|e| {
            e.owner_id.as_deref() == Some(owner_id)
                || e
                    .section_id
                    .as_deref()
                    .is_some_and(|id| owned_sections.contains(id))
        })
        .cloned()
        .collect();

    sort_records_by_created_at(&mut records);
    records
}

/// Sort records in-place by `created_at` ascending.
///
/// Sorting is stable. Records with a missing/unparseable `created_at` are
/// placed at the end, preserving their relative order.
pub fn sort_records_by_created_at(records: &mut [RawRecord]) {
    records.sort_by(|a, b| {
        let ta = a.created_at.as_ref().and_then(parse_timestamp);
        let tb = b.created_at.as_ref().and_then(parse_timestamp);

        match (ta, tb) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// 24-hex-character id derived from the owner, a name and the creation time.
pub fn make_record_id(owner_id: &str, name: &str, created_at: DateTime<Utc>, salt: usize) -> String {
    let s = format!(
        "{}|{}|{}|{}",
        owner_id,
        name,
        created_at.to_rfc3339(),
        salt
    );
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let hash = hasher.finalize();
    hex::encode(&hash[..12])
}

/// Directory name for an owner's files: a readable prefix plus a digest of
/// the exact id, so distinct owners never share a directory.
pub fn owner_directory_name(owner_id: &str) -> String {
    let prefix: String = owner_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(24)
        .collect::<String>()
        .to_ascii_lowercase();
    let hash = Sha256::digest(owner_id.as_bytes());
    let digest = hex::encode(&hash[..8]);
    if prefix.is_empty() {
        digest
    } else {
        format!("{}-{}", prefix, digest)
    }
}

/// Fields accepted when saving a new entry
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub section_id: String,
    pub title: String,
    pub amount: f64,
    pub kind: Option<String>,
    pub category: Option<String>,
}

/// Appends a section owned by `owner_id` and returns it.
pub fn add_section(
    database: &mut Database,
    owner_id: &str,
    name: &str,
    created_at: DateTime<Utc>,
) -> Section {
    let section = Section {
        id: make_record_id(owner_id, name, created_at, database.sections.len()),
        owner_id: owner_id.to_string(),
        name: name.to_string(),
        created_at,
    };
    database.sections.push(section.clone());
    section
}

/// Appends an entry owned by `owner_id` and returns the stored record.
pub fn add_entry(
    database: &mut Database,
    owner_id: &str,
    entry: NewEntry,
    created_at: DateTime<Utc>,
) -> RawRecord {
    let record = RawRecord {
        id: Some(make_record_id(
            owner_id,
            &entry.title,
            created_at,
            database.entries.len(),
        )),
        owner_id: Some(owner_id.to_string()),
        section_id: Some(entry.section_id),
        amount: serde_json::Number::from_f64(entry.amount).map(Value::Number),
        kind: entry.kind,
        category: entry.category,
        title: Some(entry.title),
        created_at: Some(Value::String(created_at.to_rfc3339())),
        ..RawRecord::default()
    };
    database.entries.push(record.clone());
    record
}

/// Loads records from a CSV file or a JSON file.
///
/// JSON may be a full store document or a bare array of records.
pub fn load_records_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        return load_records_csv(path);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Reading records file {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Parsing JSON in {}", path.display()))?;
    if let Value::Array(items) = &value {
        return Ok(records_from_values(items));
    }
    let database = database_from_value(&value)
        .with_context(|| format!("Reading store in {}", path.display()))?;
    Ok(database.entries)
}

/// JSON store used as a [`RecordSource`]. The file is re-read on every fetch,
/// so each summary sees the latest snapshot.
#[derive(Debug, Clone)]
pub struct JsonDatabase {
    path: PathBuf,
}

impl JsonDatabase {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonDatabase {
    type Error = anyhow::Error;

    fn records_for_owner(&self, owner_id: &str) -> Result<Vec<RawRecord>> {
        let database = read_database_if_exists(&self.path)?;
        Ok(records_for_owner(&database, owner_id))
    }
}
