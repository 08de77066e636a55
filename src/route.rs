//! Route definitions for the QR tracking API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::database::AppState;
use crate::handler::{
    capacity_lookup, capacity_table, create_qr, delete_qr, get_stats, list_qr_codes, redirect_qr,
};

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /r/{short_code}` - Redirects a scan to the original URL (what QR codes encode)
/// - `POST /api/create-qr` - Creates a tracked QR code
/// - `GET /api/stats/{short_code}` - Scan stats for one code
/// - `GET /api/all-qr-codes` - Every tracked code, newest first
/// - `DELETE /api/delete-qr/{short_code}` - Deletes a tracked code
/// - `GET /api/capacity` - Smallest symbol version for a payload length
/// - `GET /api/capacity-table` - The full capacity table
///
/// # Example Usage
///
/// ```no_run
/// # use qrtrack::database::{init_db, AppState};
/// # use qrtrack::route::create_app;
/// # let db = init_db("qrcodes.db").unwrap();
/// let state = AppState::new(db);
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/create-qr", post(create_qr))
        .route("/stats/{short_code}", get(get_stats))
        .route("/all-qr-codes", get(list_qr_codes))
        .route("/delete-qr/{short_code}", delete(delete_qr))
        .route("/capacity", get(capacity_lookup))
        .route("/capacity-table", get(capacity_table));

    Router::new()
        .route("/r/{short_code}", get(redirect_qr))
        .nest("/api", api_routes)
        .with_state(state)
}
