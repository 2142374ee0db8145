pub mod csv_records;
pub mod database;
pub mod records;

// Re-export commonly used items
pub use crate::csv_records::{load_records_csv, parse_records_csv};
pub use crate::database::{
    append_to_store, database_from_value, ensure_database_exists, parse_database, parse_store,
    read_database, read_database_if_exists, records_from_values, resolve_database_path,
    staging_path, write_database, write_store, Database,
};
pub use crate::records::{
    add_entry, add_section, load_records_file, owner_directory_name, records_for_owner,
    sort_records_by_created_at, JsonDatabase, NewEntry,
};
