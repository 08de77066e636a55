//! Environment-driven configuration
//!
//! Values are read from the process environment after `.env` has been
//! loaded with dotenvy.

use std::env;

/// Runtime configuration
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "qrcodes.db")
/// - `PUBLIC_URL` - Optional base such as `https://qr.example.com` used for
///   generated redirect URLs instead of the request's scheme and host
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub public_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "qrcodes.db".to_string());

        let public_url = env::var("PUBLIC_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        Self {
            port,
            database_url,
            public_url,
        }
    }
}
