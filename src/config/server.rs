//! HTTP server settings read from the environment.

use crate::errors::Result;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_RECEIPT_BASE_URL: &str = "http://localhost:3000/public/receipts";

/// Settings for the HTTP surface
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the API listens on
    pub bind_addr: SocketAddr,
    /// Base URL encoded into receipt codes; the receipt id is appended
    pub receipt_base_url: String,
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `RECEIPT_BASE_URL`, falling back to local defaults.
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()?;
        let receipt_base_url = std::env::var("RECEIPT_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_RECEIPT_BASE_URL.to_string());

        Ok(Self {
            bind_addr,
            receipt_base_url: receipt_base_url.trim_end_matches('/').to_string(),
        })
    }
}
