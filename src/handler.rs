//! HTTP request handlers for the QR tracking API
//!
//! This module maps the HTTP surface onto the redirect ledger and the
//! capacity table:
//! - Creating tracked QR codes and choosing their symbol
//! - Redirecting scans to their destinations while counting them
//! - Reporting per-code stats and the dashboard listing
//! - Deleting tracked codes
//! - Capacity lookups

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use tracing::error;

use crate::capacity::{self, CapacityRow, Mode, SymbolSpec};
use crate::database::AppState;
use crate::error::{AppError, LedgerError};
use crate::model::{
    CapacityParams, CapacityResponse, CreateQrRequest, CreateQrResponse, DeleteResponse,
    StatsResponse, SymbolResponse, TrackedCode,
};
use crate::session::{QrSession, SymbolRequest};

/// Stand-in short code used to check the symbol before a record exists.
/// Letters force byte mode, the most demanding case for an 8 character code.
const PLACEHOLDER_CODE: &str = "ffffffff";

/// Scheme and host that generated URLs point at
///
/// `PUBLIC_URL` wins when configured; otherwise the request's
/// `X-Forwarded-Proto` (default `http`) and `Host` headers are used.
fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(public_url) = &state.public_url {
        return public_url.clone();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(&state.fallback_host);

    format!("{}://{}", scheme, host)
}

/// Creates a tracked QR code
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com", "level": "M" }
/// ```
///
/// # Response
///
/// - **200 OK** - code created; `redirectUrl` is what the QR code encodes
/// - **400 Bad Request** - URL missing or empty, malformed body, invalid version or mode
/// - **413 Payload Too Large** - redirect URL does not fit the requested symbol
/// - **500 Internal Server Error** - storage failure
pub async fn create_qr(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateQrRequest>, JsonRejection>,
) -> Result<Json<CreateQrResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let url = payload.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(LedgerError::Validation("URL is required".to_string()).into());
    }

    let request = SymbolRequest {
        level: payload.level,
        mode: payload.mode,
        version: payload.version,
    };

    // Reject unfit symbol options before anything is persisted
    let base = base_url(&state, &headers);
    QrSession::tracked(&format!("{}/r/{}", base, PLACEHOLDER_CODE), PLACEHOLDER_CODE, request)?;

    let record = state.ledger.create(&url)?;
    let redirect_url = format!("{}/r/{}", base, record.short_code);

    let session = match QrSession::tracked(&redirect_url, &record.short_code, request) {
        Ok(session) => session,
        Err(err) => {
            if let Err(cleanup) = state.ledger.delete(&record.short_code) {
                error!(code = %record.short_code, error = %cleanup, "failed to roll back unfit QR code");
            }
            return Err(err.into());
        }
    };
    let symbol = session.symbol();

    Ok(Json(CreateQrResponse {
        success: true,
        tracking_url: format!("{}/api/stats/{}", base, record.short_code),
        short_code: record.short_code,
        redirect_url,
        original_url: record.original_url,
        symbol: SymbolResponse {
            version: symbol.version,
            level: symbol.level,
            mode: symbol.mode,
            modules: symbol.modules(),
            svg_filename: session.svg_filename(),
        },
    }))
}

/// Redirects a scanned QR code to its destination and counts the scan
///
/// # Response
///
/// - **307 Temporary Redirect** - to the original URL
/// - **404 Not Found** - unknown short code
/// - **500 Internal Server Error** - storage failure
///
/// A temporary redirect keeps browsers from caching it, so every scan
/// reaches the server and is counted.
pub async fn redirect_qr(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.ledger.resolve(&short_code) {
        Ok(original_url) => Redirect::temporary(&original_url).into_response(),
        Err(LedgerError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, "QR code not found").into_response()
        }
        Err(err) => {
            error!(code = %short_code, error = %err, "failed to resolve QR code");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Returns scan stats for one code
pub async fn get_stats(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let record = state.ledger.stats(&short_code)?;
    Ok(Json(record.into()))
}

/// Lists every tracked code, most recently created first
pub async fn list_qr_codes(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrackedCode>>, AppError> {
    Ok(Json(state.ledger.list_all()?))
}

/// Deletes a tracked code
///
/// - **200 OK** - deleted
/// - **404 Not Found** - unknown short code
pub async fn delete_qr(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.ledger.delete(&short_code)?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "QR code deleted".to_string(),
    }))
}

/// Smallest symbol for a payload length
///
/// # Example Request
///
/// `GET /api/capacity?length=120&level=Q&mode=alphanumeric`
///
/// # Response
///
/// - **200 OK** - smallest version and its capacity
/// - **400 Bad Request** - missing length, unknown level or mode
/// - **413 Payload Too Large** - no version holds `length` characters
pub async fn capacity_lookup(
    params: Result<Query<CapacityParams>, QueryRejection>,
) -> Result<Json<CapacityResponse>, AppError> {
    let Query(params) = params.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let mode = params.mode.unwrap_or(Mode::Byte);
    let version = capacity::minimum_version(mode, params.level, params.length)?;
    let max = capacity::capacity(version, params.level, mode)?;
    let symbol = SymbolSpec { version, level: params.level, mode };

    Ok(Json(CapacityResponse {
        version,
        capacity: max,
        modules: symbol.modules(),
        level: params.level,
        mode,
    }))
}

/// The full capacity table, one row per version
pub async fn capacity_table() -> Json<Vec<CapacityRow>> {
    Json(capacity::rows())
}
