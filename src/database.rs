//! Database initialization and table definitions
//!
//! This module handles the setup of the embedded redb database that backs
//! the redirect ledger.

use redb::{Database, TableDefinition};
use std::sync::Arc;

use crate::config::Config;
use crate::ledger::Ledger;

/// Main table for tracked QR codes
///
/// Key: short code (8 lowercase hex characters)
/// Value: JSON-serialized TrackedCode
///
/// Example:
/// - Key: "9f86d081"
/// - Value: '{"short_code":"9f86d081","original_url":"https://example.com",...}'
pub const TABLE_CODES: TableDefinition<&str, &str> = TableDefinition::new("qr_codes_v1");

/// Creation-order index used to list codes newest first
///
/// Key: `created_at` in microseconds since the Unix epoch
/// Value: short code
///
/// Keys are unique: the ledger bumps a creation timestamp by one microsecond
/// when it would collide with (or precede) the newest existing entry.
pub const TABLE_CREATED_INDEX: TableDefinition<i64, &str> =
    TableDefinition::new("qr_created_index_v1");

/// Initializes the embedded database and creates required tables
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "qrcodes.db")
///
/// # Example
///
/// ```no_run
/// # use qrtrack::database::init_db;
/// let db = init_db("qrcodes.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    // Open both tables once so read transactions never hit a missing table
    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_CODES)?;
        write_txn.open_table(TABLE_CREATED_INDEX)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Redirect ledger over the embedded database
    pub ledger: Ledger,

    /// Base used for redirect and tracking URLs instead of the request host
    pub public_url: Option<String>,

    /// Host used when a request carries no `Host` header
    pub fallback_host: String,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            ledger: Ledger::new(Arc::new(db)),
            public_url: None,
            fallback_host: "localhost".to_string(),
        }
    }

    pub fn from_config(db: Database, config: &Config) -> Self {
        Self {
            ledger: Ledger::new(Arc::new(db)),
            public_url: config.public_url.clone(),
            fallback_host: format!("localhost:{}", config.port),
        }
    }
}
