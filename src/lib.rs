//! QR code generation support with scan tracking
//!
//! Exposes the capacity table, the redirect ledger and the HTTP router for
//! the binary and for integration tests.

pub mod capacity;
pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod ledger;
pub mod model;
pub mod poller;
pub mod route;
pub mod session;
