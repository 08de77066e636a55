//! Data models for the QR tracking service
//!
//! This module defines the stored record and the request/response bodies
//! of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capacity::{ECLevel, Mode};

/// A tracked redirect as stored in the database
///
/// This is also the shape returned by the dashboard listing, so its fields
/// keep their snake_case names on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TrackedCode {
    /// 8 lowercase hex characters, unique within the ledger
    pub short_code: String,

    /// Destination the short code redirects to
    pub original_url: String,

    /// Number of redirects served for this code
    #[serde(default)]
    pub scan_count: u64,

    /// Timestamp when this record was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the most recent scan, `None` until the first one
    #[serde(default)]
    pub last_scanned: Option<DateTime<Utc>>,
}

/// Request payload for creating a tracked QR code
///
/// # Example
/// ```json
/// {
///   "url": "https://example.com/landing",
///   "level": "M",      // Optional, L/M/Q/H
///   "mode": "byte",    // Optional, detected from the redirect URL
///   "version": 0       // Optional, 0 or absent picks the smallest symbol
/// }
/// ```
#[derive(Deserialize, Debug, Default)]
pub struct CreateQrRequest {
    /// Destination URL; missing and empty are both rejected
    pub url: Option<String>,

    #[serde(default)]
    pub level: ECLevel,

    pub mode: Option<Mode>,

    pub version: Option<u8>,
}

/// Symbol chosen for the redirect URL
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SymbolResponse {
    pub version: u8,
    pub level: ECLevel,
    pub mode: Mode,
    pub modules: u32,
    pub svg_filename: String,
}

/// Response returned after successfully creating a tracked QR code
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateQrResponse {
    pub success: bool,
    pub short_code: String,
    /// URL to encode in the QR code
    pub redirect_url: String,
    pub original_url: String,
    /// Stats endpoint for this code
    pub tracking_url: String,
    pub symbol: SymbolResponse,
}

/// Read-only projection of a tracked code
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub short_code: String,
    pub original_url: String,
    pub scan_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_scanned: Option<DateTime<Utc>>,
}

impl From<TrackedCode> for StatsResponse {
    fn from(record: TrackedCode) -> Self {
        Self {
            short_code: record.short_code,
            original_url: record.original_url,
            scan_count: record.scan_count,
            created_at: record.created_at,
            last_scanned: record.last_scanned,
        }
    }
}

/// Response body after a deletion
#[derive(Serialize, Debug)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Query parameters for the capacity lookup
///
/// # Example
/// Query string: `?length=120&level=Q&mode=alphanumeric`
#[derive(Deserialize, Debug)]
pub struct CapacityParams {
    pub length: usize,

    /// Defaults to M
    #[serde(default)]
    pub level: ECLevel,

    /// Defaults to byte
    pub mode: Option<Mode>,
}

/// Result of a capacity lookup
#[derive(Serialize, Debug)]
pub struct CapacityResponse {
    pub version: u8,
    pub capacity: usize,
    pub modules: u32,
    pub level: ECLevel,
    pub mode: Mode,
}
