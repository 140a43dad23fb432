//! School configuration loading from config.toml
//!
//! The file names the school and lists the families to seed on first run. Each seeded
//! family may carry students, a monthly tuition fee and a one-off registration fee.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct SchoolConfig {
    /// School name printed on receipts
    #[serde(default)]
    pub school_name: String,
    /// Families to seed
    #[serde(default)]
    pub families: Vec<FamilyConfig>,
}

/// Configuration for a single seeded family
#[derive(Debug, Deserialize, Clone)]
pub struct FamilyConfig {
    /// Family id (e.g. `F001`)
    pub id: String,
    /// Family name
    pub name: String,
    /// Guardian responsible for fees
    pub guardian_name: String,
    /// Contact number
    #[serde(default)]
    pub phone: Option<String>,
    /// Monthly tuition
    #[serde(default)]
    pub monthly_fee: f64,
    /// One-off registration charge raised at admission
    #[serde(default)]
    pub registration_fee: Option<f64>,
    /// Students enrolled under this family
    #[serde(default)]
    pub students: Vec<StudentConfig>,
}

/// Configuration for a seeded student
#[derive(Debug, Deserialize, Clone)]
pub struct StudentConfig {
    /// Full name
    pub name: String,
    /// Class label
    pub class_name: String,
    /// Optional roll number
    #[serde(default)]
    pub roll_number: Option<String>,
}

/// Loads school configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SchoolConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading school configuration from {:?}", path_ref);

    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses school configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<SchoolConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration named by `SCHOOL_CONFIG` (default `config.toml`).
///
/// A missing file is not an error: it yields an empty configuration so the service
/// can start against an already populated database.
pub fn load_default_config() -> Result<SchoolConfig> {
    let path = std::env::var("SCHOOL_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        tracing::info!("No school configuration at {path}, skipping seed data");
        return Ok(SchoolConfig::default());
    }
    load_config(path)
}
