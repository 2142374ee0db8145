use std::collections::HashSet;

use chrono::{DateTime, Utc};
use data_normalization::{coerce_amount, resolve_period, resolve_timestamp};
use models::{MonthKey, RawRecord};
use serde_json::Value;

/// Findings for one store document. Errors make the document unusable;
/// warnings describe records that will be dropped or defaulted.
#[derive(Debug, Default)]
pub struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Report {
    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
    pub fn print(&self, file: &str) {
        for w in &self.warnings {
            println!("[WARN] {}: {}", file, w);
        }
        for e in &self.errors {
            println!("[ERROR] {}: {}", file, e);
        }
    }
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub fn validate_database(val: &Value, now: DateTime<Utc>) -> Report {
    let mut rep = Report::default();

    if !val.is_object() {
        rep.error("store document must be a JSON object");
        return rep;
    }

    // sections
    let mut section_ids: HashSet<String> = HashSet::new();
    match val.get("sections") {
        None => rep.warn("missing 'sections'; entries must carry an owner"),
        Some(Value::Array(sections)) => {
            for (i, s) in sections.iter().enumerate() {
                let id = s.get("_id").or_else(|| s.get("id")).and_then(|v| v.as_str());
                match id {
                    Some(id) => {
                        if !section_ids.insert(id.to_string()) {
                            rep.warn(format!("sections[{}] repeats id '{}'", i, id));
                        }
                    }
                    None => rep.error(format!("sections[{}] missing 'id'", i)),
                }
                if s.get("owner_id").or_else(|| s.get("email")).is_none() {
                    rep.error(format!("sections[{}] missing 'owner_id'", i));
                }
            }
        }
        Some(_) => rep.error("'sections' is not an array"),
    }

    // entries
    let entries = match val.get("entries").and_then(|v| v.as_array()) {
        Some(entries) => entries,
        None => {
            rep.error("missing or non-array 'entries'");
            return rep;
        }
    };

    for (i, e) in entries.iter().enumerate() {
        let raw: RawRecord = match serde_json::from_value(e.clone()) {
            Ok(raw) => raw,
            Err(err) => {
                rep.error(format!("entries[{}] is not a valid record: {}", i, err));
                continue;
            }
        };

        if raw.owner_id.is_none() {
            match raw.section_id.as_deref() {
                None => rep.warn(format!(
                    "entries[{}] has neither owner nor section; it belongs to nobody",
                    i
                )),
                Some(id) if !section_ids.contains(id) => rep.warn(format!(
                    "entries[{}] references unknown section '{}'",
                    i, id
                )),
                Some(_) => {}
            }
        }

        if coerce_amount(raw.amount.as_ref()) <= 0.0 {
            let shown = raw
                .amount
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "missing".to_string());
            rep.warn(format!(
                "entries[{}] has non-positive or invalid amount {}; it will be skipped",
                i, shown
            ));
            continue;
        }

        if let Some(kind) = raw.kind.as_deref() {
            let kind = kind.trim().to_lowercase();
            if kind != "income" && kind != "expense" {
                rep.warn(format!(
                    "entries[{}] has type '{}'; counted as expense",
                    i, kind
                ));
            }
        }

        let has_category = raw
            .category
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_category {
            rep.warn(format!("entries[{}] has no category; it is filed by title or as 'Other'", i));
        }

        let period = resolve_period(
            raw.month.as_deref(),
            raw.year.as_ref(),
            resolve_timestamp(&raw, now),
        );
        if let MonthKey::Unparsed { label } = period {
            rep.warn(format!(
                "entries[{}] has unrecognized month/year '{}'",
                i, label
            ));
        }
    }

    rep
}
