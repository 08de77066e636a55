//! Redirect ledger
//!
//! Durable store of tracked QR codes on top of redb. Every mutation runs in
//! a single write transaction; redb allows one writer at a time, so the scan
//! counter increment cannot lose updates and create cannot overwrite an
//! existing code.

use std::sync::Arc;

use axum::http::HeaderValue;
use chrono::{DateTime, Utc};
use rand::Rng;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::{debug, info, warn};

use crate::database::{TABLE_CODES, TABLE_CREATED_INDEX};
use crate::error::LedgerError;
use crate::model::TrackedCode;

/// How many fresh short codes create tries before giving up
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Generates a short code from 4 random bytes, as 8 lowercase hex characters
pub fn generate_short_code() -> String {
    let bytes: [u8; 4] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Handle to the tracked codes; cheap to clone
#[derive(Clone)]
pub struct Ledger {
    db: Arc<Database>,
}

impl Ledger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Creates a tracked code for `original_url` with a random short code
    pub fn create(&self, original_url: &str) -> Result<TrackedCode, LedgerError> {
        self.create_with(original_url, generate_short_code)
    }

    /// Creates a tracked code, drawing short codes from `generate`
    ///
    /// A generated code that already exists is discarded and another one is
    /// drawn, up to [`MAX_CODE_ATTEMPTS`] times.
    pub fn create_with<G>(&self, original_url: &str, mut generate: G) -> Result<TrackedCode, LedgerError>
    where
        G: FnMut() -> String,
    {
        let original_url = original_url.trim();
        if original_url.is_empty() {
            return Err(LedgerError::Validation("URL is required".to_string()));
        }
        // Scans answer with the URL as the Location header
        if HeaderValue::from_str(original_url).is_err() {
            return Err(LedgerError::Validation("URL is not a valid redirect target".to_string()));
        }

        let write_txn = self.db.begin_write()?;
        let record = {
            let mut codes = write_txn.open_table(TABLE_CODES)?;
            let mut index = write_txn.open_table(TABLE_CREATED_INDEX)?;

            let mut short_code = None;
            for attempt in 1..=MAX_CODE_ATTEMPTS {
                let candidate = generate();
                if codes.get(candidate.as_str())?.is_none() {
                    short_code = Some(candidate);
                    break;
                }
                warn!(code = %candidate, attempt, "short code collision, regenerating");
            }
            let short_code = short_code.ok_or(LedgerError::CodeSpaceExhausted {
                attempts: MAX_CODE_ATTEMPTS,
            })?;

            // Keep creation times strictly increasing so the index keys stay unique
            let now = Utc::now();
            let newest = index.last()?.map(|(key, _)| key.value());
            let micros = match newest {
                Some(last) if last >= now.timestamp_micros() => last + 1,
                _ => now.timestamp_micros(),
            };
            let created_at = DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or(now);

            let record = TrackedCode {
                short_code,
                original_url: original_url.to_string(),
                scan_count: 0,
                created_at,
                last_scanned: None,
            };

            let record_json = serde_json::to_string(&record)?;
            codes.insert(record.short_code.as_str(), record_json.as_str())?;
            index.insert(record.created_at.timestamp_micros(), record.short_code.as_str())?;
            record
        };
        write_txn.commit()?;

        info!(code = %record.short_code, url = %record.original_url, "created tracked QR code");
        Ok(record)
    }

    /// Returns the destination of `short_code` and records a scan
    pub fn resolve(&self, short_code: &str) -> Result<String, LedgerError> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut codes = write_txn.open_table(TABLE_CODES)?;
            let raw = codes.get(short_code)?.map(|guard| guard.value().to_string());
            let Some(raw) = raw else {
                return Err(LedgerError::NotFound(short_code.to_string()));
            };

            let mut record: TrackedCode = serde_json::from_str(&raw)?;
            record.scan_count += 1;
            record.last_scanned = Some(Utc::now());

            let record_json = serde_json::to_string(&record)?;
            codes.insert(short_code, record_json.as_str())?;
            record
        };
        write_txn.commit()?;

        debug!(code = %short_code, scans = record.scan_count, "scan recorded");
        Ok(record.original_url)
    }

    /// Current record for `short_code`, without side effects
    pub fn stats(&self, short_code: &str) -> Result<TrackedCode, LedgerError> {
        let read_txn = self.db.begin_read()?;
        let codes = read_txn.open_table(TABLE_CODES)?;

        let record = match codes.get(short_code)? {
            Some(guard) => serde_json::from_str(guard.value())?,
            None => return Err(LedgerError::NotFound(short_code.to_string())),
        };

        Ok(record)
    }

    /// All records, most recently created first
    pub fn list_all(&self) -> Result<Vec<TrackedCode>, LedgerError> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TABLE_CREATED_INDEX)?;
        let codes = read_txn.open_table(TABLE_CODES)?;

        let mut records = Vec::new();
        for entry in index.iter()?.rev() {
            let (_, short_code) = entry?;
            let raw = codes.get(short_code.value())?.map(|guard| guard.value().to_string());
            match raw {
                Some(raw) => records.push(serde_json::from_str(&raw)?),
                None => warn!(code = %short_code.value(), "index entry without record"),
            }
        }

        Ok(records)
    }

    /// Removes `short_code` and its index entry
    pub fn delete(&self, short_code: &str) -> Result<(), LedgerError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut codes = write_txn.open_table(TABLE_CODES)?;
            let removed = codes.remove(short_code)?.map(|guard| guard.value().to_string());
            let Some(raw) = removed else {
                return Err(LedgerError::NotFound(short_code.to_string()));
            };

            let record: TrackedCode = serde_json::from_str(&raw)?;
            let mut index = write_txn.open_table(TABLE_CREATED_INDEX)?;
            index.remove(record.created_at.timestamp_micros())?;
        }
        write_txn.commit()?;

        info!(code = %short_code, "deleted tracked QR code");
        Ok(())
    }
}
