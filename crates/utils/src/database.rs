use anyhow::{anyhow, Context, Result};
use models::{RawRecord, Section};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// On-disk store: every section and entry of every owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Database {
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub entries: Vec<RawRecord>,
}

/// Resolves a directory (or a path without `.json`) to `<dir>/database.json`.
pub fn resolve_database_path<P: AsRef<Path>>(database_path: P) -> PathBuf {
    let path = database_path.as_ref();
    if path.is_dir() || (!path.exists() && !path.to_string_lossy().ends_with(".json")) {
        path.join("database.json")
    } else {
        path.to_path_buf()
    }
}

/// Ensures that database.json exists at the specified path.
/// If it doesn't exist or is not valid JSON, it is initialized with an empty
/// store. A syntactically valid file is never replaced, even when some of its
/// records do not match the expected shape.
///
/// # Example
/// ```no_run
/// use utils::ensure_database_exists;
///
/// let db_path = ensure_database_exists("database").unwrap();
/// println!("Database ready at: {:?}", db_path);
/// ```
pub fn ensure_database_exists<P: AsRef<Path>>(database_path: P) -> Result<PathBuf> {
    let db_path = resolve_database_path(database_path);

    let needs_initialization = match File::open(&db_path) {
        Ok(mut file) => {
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;
            serde_json::from_str::<Value>(&contents).is_err()
        }
        Err(_) => true,
    };

    if needs_initialization {
        write_database(&db_path, &Database::default())?;
        info!(path = %db_path.display(), "initialized empty database");
    }

    Ok(db_path)
}

/// Reads the database, creating an empty one first if needed.
pub fn read_database<P: AsRef<Path>>(database_path: P) -> Result<Database> {
    let db_path = ensure_database_exists(database_path)?;
    load_database(&db_path)
}

/// Reads the database without creating it. A missing file is an empty store.
pub fn read_database_if_exists<P: AsRef<Path>>(database_path: P) -> Result<Database> {
    let db_path = resolve_database_path(database_path);
    if !db_path.exists() {
        return Ok(Database::default());
    }
    load_database(&db_path)
}

/// Parses store text into a raw JSON document. Blank text is an empty store.
pub fn parse_store(contents: &str) -> Result<Value> {
    if contents.trim().is_empty() {
        return Ok(json!({ "sections": [], "entries": [] }));
    }
    serde_json::from_str(contents).context("Database is not valid JSON")
}

/// Parses a store document from JSON text.
pub fn parse_database(contents: &str) -> Result<Database> {
    database_from_value(&parse_store(contents)?)
}

/// Builds the typed store from a raw document.
///
/// Only a document that is not a JSON object is an error. Sections or
/// entries that cannot be read are skipped with a warning, so one bad item
/// never hides the rest of the store.
pub fn database_from_value(doc: &Value) -> Result<Database> {
    let object = doc
        .as_object()
        .ok_or_else(|| anyhow!("Database is not a valid store document: expected a JSON object"))?;

    let mut database = Database::default();

    for (idx, item) in items(object.get("sections"), "sections").iter().enumerate() {
        match serde_json::from_value::<Section>((*item).clone()) {
            Ok(section) => database.sections.push(section),
            Err(e) => warn!("Skipping sections[{}]: {}", idx, e),
        }
    }

    let entries: Vec<&Value> = items(object.get("entries"), "entries");
    database.entries = records_from_values(entries);

    Ok(database)
}

fn items<'a>(value: Option<&'a Value>, key: &str) -> Vec<&'a Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(_) => {
            warn!("Ignoring '{}': not an array", key);
            Vec::new()
        }
    }
}

/// Reads each value as a raw record, skipping (with a warning) values that
/// are not records at all, such as bare numbers.
pub fn records_from_values<'a, I>(values: I) -> Vec<RawRecord>
where
    I: IntoIterator<Item = &'a Value>,
{
    values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value::<RawRecord>(value.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping entries[{}]: {}", idx, e);
                None
            }
        })
        .collect()
}

/// Appends `item` to the `key` array of a raw store document, leaving every
/// other item untouched.
pub fn append_to_store(doc: &mut Value, key: &str, item: Value) -> Result<()> {
    if doc.is_null() {
        *doc = json!({});
    }
    let object = doc
        .as_object_mut()
        .ok_or_else(|| anyhow!("Database is not a valid store document: expected a JSON object"))?;
    let slot = object.entry(key.to_string()).or_insert_with(|| json!([]));
    if slot.is_null() {
        *slot = json!([]);
    }
    slot.as_array_mut()
        .ok_or_else(|| anyhow!("Database field '{}' is not an array", key))?
        .push(item);
    Ok(())
}

fn load_database(db_path: &Path) -> Result<Database> {
    let contents = fs::read_to_string(db_path)
        .with_context(|| format!("Cannot open database at {:?}", db_path))?;
    parse_database(&contents).with_context(|| format!("Reading {:?}", db_path))
}

/// Sibling file a store is written to before being renamed into place.
pub fn staging_path(db_path: &Path) -> PathBuf {
    let mut name = db_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "database.json".into());
    name.push(".tmp");
    db_path.with_file_name(name)
}

/// Writes the store, creating parent directories when missing.
pub fn write_database<P: AsRef<Path>>(database_path: P, database: &Database) -> Result<PathBuf> {
    write_store(database_path, &serde_json::to_value(database)?)
}

/// Writes a raw store document. The text goes to a staging file first and is
/// renamed over the store, so readers see either the old or the new document.
pub fn write_store<P: AsRef<Path>>(database_path: P, doc: &Value) -> Result<PathBuf> {
    let db_path = resolve_database_path(database_path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staging = staging_path(&db_path);
    let formatted = serde_json::to_string_pretty(doc)?;
    let mut file = File::create(&staging)
        .with_context(|| format!("Cannot create database file at {:?}", staging))?;
    file.write_all(formatted.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(&staging, &db_path)
        .with_context(|| format!("Cannot replace database file at {:?}", db_path))?;

    Ok(db_path)
}
